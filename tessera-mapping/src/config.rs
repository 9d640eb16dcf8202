//! Client settings.

use crate::descriptor::Mappable;
use crate::error::{MappingError, Result};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// URL used when none is configured.
pub const DEFAULT_URL: &str = "http://localhost:9200";

/// Settings shared by the transport and the name resolvers.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Node URL(s). The first one is used by the built-in transport.
    pub urls: Vec<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Index used when neither the type nor the caller names one.
    pub default_index: Option<String>,
    /// Default index per type, keyed by type descriptor key.
    pub type_indices: HashMap<String, String>,
    /// Type name per type, keyed by type descriptor key.
    pub type_names: HashMap<String, String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

impl ClientSettings {
    /// Create settings for a single node.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            password: None,
            request_timeout: Duration::from_secs(30),
            default_index: None,
            type_indices: HashMap::new(),
            type_names: HashMap::new(),
        }
    }

    /// Create settings for several nodes of one cluster.
    pub fn cluster(urls: Vec<String>) -> Self {
        Self {
            urls,
            ..Self::new("")
        }
    }

    /// Read settings from `TESSERA_*` environment variables.
    ///
    /// `TESSERA_URL` may hold a comma-separated node list.
    pub fn from_env() -> Result<Self> {
        let urls: Vec<String> = env::var("TESSERA_URL")
            .unwrap_or_else(|_| DEFAULT_URL.to_string())
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .collect();

        if urls.is_empty() {
            return Err(MappingError::Configuration(
                "TESSERA_URL contains no node URL".to_string(),
            ));
        }

        let mut settings = Self::cluster(urls);

        if let Ok(index) = env::var("TESSERA_DEFAULT_INDEX") {
            settings = settings.with_default_index(index);
        }

        if let (Ok(user), Ok(pass)) = (env::var("TESSERA_USERNAME"), env::var("TESSERA_PASSWORD")) {
            settings = settings.with_basic_auth(user, pass);
        }

        if let Ok(secs) = env::var("TESSERA_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                MappingError::Configuration(format!("TESSERA_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            settings = settings.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(settings)
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the fallback index.
    pub fn with_default_index(mut self, index: impl Into<String>) -> Self {
        self.default_index = Some(index.into());
        self
    }

    /// Route mappings for `T` to `index` unless the caller names another.
    pub fn with_type_index<T: Mappable>(mut self, index: impl Into<String>) -> Self {
        self.type_indices
            .insert(T::descriptor().key().to_string(), index.into());
        self
    }

    /// Register `T` under `name` instead of its inferred type name.
    pub fn with_type_name<T: Mappable>(mut self, name: impl Into<String>) -> Self {
        self.type_names
            .insert(T::descriptor().key().to_string(), name.into());
        self
    }
}
