// Tessera - typed mapping inference for OpenSearch and Elasticsearch
//
// This library describes how data types are indexed and submits that
// description to the engine's mapping API, by inference, fluent declaration
// or raw JSON.
//
// `#[derive(Mappable)]` refers to `::tessera_mapping` by default. Crates
// that only depend on this facade point it here instead:
//
//     #[derive(Mappable)]
//     #[mapping(crate = "tessera")]
//     struct Article { title: String }

// Re-export the mapping core
pub use tessera_mapping::*;

// Re-export the derive macro
#[cfg(feature = "derive")]
pub use tessera_derive::Mappable;

// Re-export logging
pub use tessera_log as log;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ClientSettings,
        DynamicMapping,
        FieldKind,
        IndexOption,
        MapField,
        Mappable,
        MappingClient,
        MappingError,
        MappingNode,
        MappingResponse,
        PropertiesDescriptor,
        RootMapping,
        RootMappingDescriptor,
        Transport,
        TransportStatus,
        TypeDescriptor,
        TypeMappingBuilder,
        Untyped,
        UNBOUNDED,
    };
}
