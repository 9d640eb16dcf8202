//! Derive macro for Tessera mapping descriptors.
//!
//! `#[derive(Mappable)]` implements `Mappable` and `MapField` for a struct
//! with named fields, listing its members in declaration order. Member names
//! follow `#[serde(rename)]` and `#[serde(rename_all)]`, and fields marked
//! `#[serde(skip)]` or `#[serde(skip_serializing)]` are left out. Field types
//! without a `MapField` impl map as objects with no declared properties.
//!
//! ## Field attributes
//!
//! `#[mapping(...)]` on a field overrides the inferred mapping:
//! - `name = "..."` - field name in the mapping
//! - `kind = "..."` - `text`, `keyword`, `date`, `long`, `double`, `boolean`,
//!   `binary`, `object`, `nested` or `array`
//! - `index = "..."` - `analyzed`, `not_analyzed` or `no`
//! - `store`, `include_in_all` - flags, optionally `= false`
//! - `format`, `analyzer`, `index_analyzer`, `search_analyzer` - strings
//! - `ignore_above = 256`, `boost = 2.0`, `null_value = "n/a"`
//! - `opt_out` - leave the field out of the mapping
//!
//! ## Container attributes
//!
//! `#[mapping(...)]` on the struct:
//! - `type_name = "..."`, `index = "..."` - registration defaults
//! - `dynamic = "strict"` (or `true` / `false`)
//! - `date_detection`, `numeric_detection` - flags
//! - `index_analyzer`, `search_analyzer` - strings
//! - `crate = "..."` - path to the mapping crate, `::tessera_mapping` by
//!   default

use proc_macro::TokenStream;

mod attrs;
mod mappable;

/// Derive a mapping descriptor.
///
/// # Examples
///
/// ```ignore
/// #[derive(Mappable, Serialize)]
/// #[serde(rename_all = "camelCase")]
/// #[mapping(type_name = "post", dynamic = "strict")]
/// pub struct BlogPost {
///     #[mapping(analyzer = "english")]
///     pub title: String,
///     #[mapping(kind = "keyword", ignore_above = 64)]
///     pub tags: Vec<String>,
///     pub published_at: DateTime<Utc>,
///     pub author: Author,
///     #[mapping(opt_out)]
///     pub draft_notes: String,
/// }
/// ```
#[proc_macro_derive(Mappable, attributes(mapping))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    mappable::derive_mappable_impl(input)
}
