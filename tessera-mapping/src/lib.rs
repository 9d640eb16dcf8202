//! Mapping inference and submission for OpenSearch/Elasticsearch.
//!
//! This crate describes how data types are indexed and submits that
//! description to the engine's `_mapping` endpoint. A mapping can be:
//! - Inferred from a type's shape and attribute overrides
//! - Declared with a fluent builder
//! - Supplied pre-built or as raw JSON
//!
//! Inference walks a type depth-first in member declaration order. Cycles
//! are always cut at the second occurrence of a type on the descent path,
//! and an optional depth bound stops expansion earlier.
//!
//! # Example
//!
//! ```rust,no_run
//! use tessera_mapping::{
//!     ClientSettings, Mappable, MappingClient, MemberDescriptor, TypeDescriptor,
//! };
//!
//! struct Article {
//!     title: String,
//!     tags: Vec<String>,
//! }
//!
//! impl Mappable for Article {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::of::<Self>("Article")
//!             .with_member(MemberDescriptor::of::<String>("title"))
//!             .with_member(MemberDescriptor::of::<Vec<String>>("tags"))
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ClientSettings::new("http://localhost:9200").with_default_index("blog");
//!     let client = MappingClient::new(settings)?;
//!
//!     let response = client.map_from_attributes::<Article>(0)?;
//!     if !response.acknowledged() {
//!         eprintln!("mapping rejected: {:?}", response.error());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod builder;
mod classify;
mod client;
mod config;
mod descriptor;
mod error;
mod fluent;
mod guard;
mod node;
mod resolve;
mod submit;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use builder::{TypeMappingBuilder, build};
pub use classify::classify;
pub use client::MappingClient;
pub use config::{ClientSettings, DEFAULT_URL};
pub use descriptor::{
    DescriptorFn, FieldOverrides, MapField, Mappable, MemberDescriptor, TypeAttributes,
    TypeDescriptor, TypeShape,
};
pub use error::{MappingError, Result};
pub use fluent::{PropertiesDescriptor, RootMappingDescriptor, Untyped};
pub use guard::{PathScope, RecursionState, UNBOUNDED};
pub use node::{
    DEFAULT_DATE_FORMAT, DynamicMapping, FieldAttributes, FieldKind, IndexOption, MappingNode,
    RootMapping,
};
pub use resolve::{
    DefaultPathResolver, MAPPING_RESOURCE, NameResolver, PathResolver, SettingsNameResolver,
};
pub use submit::{
    EngineError, IGNORE_CONFLICTS_QUERY, IndicesEnvelope, MappingResponse, MappingSubmitter,
    mapping_path,
};
pub use transport::{OpenSearchTransport, Transport, TransportStatus};

/// Re-exports used by `#[derive(Mappable)]` expansions.
#[doc(hidden)]
pub mod __private {
    pub use crate::descriptor::{DescribeDeclared, DescribeOpaque, Member};
    pub use serde_json;
}
