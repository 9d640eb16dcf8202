//! Resource path and name resolution.

use crate::config::ClientSettings;
use crate::descriptor::TypeDescriptor;
use crate::error::{MappingError, Result};

/// Resource suffix of the mapping endpoint.
pub const MAPPING_RESOURCE: &str = "_mapping";

/// Builds request paths.
pub trait PathResolver: Send + Sync {
    /// Path of the form `<index>/<type_name>/<resource>`.
    fn index_type_path(&self, index: &str, type_name: &str, resource: &str) -> String;
}

/// Joins segments with `/`, dropping stray slashes around each one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathResolver;

impl PathResolver for DefaultPathResolver {
    fn index_type_path(&self, index: &str, type_name: &str, resource: &str) -> String {
        format!(
            "{}/{}/{}",
            index.trim_matches('/'),
            type_name.trim_matches('/'),
            resource.trim_matches('/')
        )
    }
}

/// Resolves type names and default indices.
pub trait NameResolver: Send + Sync {
    /// Type name a type is registered under.
    fn type_name_for(&self, descriptor: &TypeDescriptor) -> String;

    /// Index a type is mapped into when the caller names none.
    fn index_for(&self, descriptor: &TypeDescriptor) -> Result<String>;

    /// Index used when there is no type to resolve from.
    fn default_index(&self) -> Result<String>;
}

/// Name resolution backed by [`ClientSettings`].
///
/// Settings registrations win, then type attributes, then the inferred
/// default (the lowercased type name, or the settings' default index).
#[derive(Debug, Clone)]
pub struct SettingsNameResolver {
    settings: ClientSettings,
}

impl SettingsNameResolver {
    /// Create a resolver over `settings`.
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }
}

impl NameResolver for SettingsNameResolver {
    fn type_name_for(&self, descriptor: &TypeDescriptor) -> String {
        self.settings
            .type_names
            .get(descriptor.key())
            .cloned()
            .or_else(|| descriptor.attributes().type_name.clone())
            .unwrap_or_else(|| descriptor.name().to_lowercase())
    }

    fn index_for(&self, descriptor: &TypeDescriptor) -> Result<String> {
        if let Some(index) = self
            .settings
            .type_indices
            .get(descriptor.key())
            .or(descriptor.attributes().index.as_ref())
        {
            return Ok(index.clone());
        }

        self.default_index()
    }

    fn default_index(&self) -> Result<String> {
        self.settings
            .default_index
            .clone()
            .filter(|index| !index.is_empty())
            .ok_or_else(|| MappingError::InvalidArgument("no default index configured".to_string()))
    }
}
