//! Synchronous request transport.

use crate::config::ClientSettings;
use crate::error::{MappingError, Result};
use opensearch::http::headers::{CONTENT_TYPE, HeaderMap, HeaderValue};
use opensearch::http::transport::{SingleNodeConnectionPool, Transport as HttpTransport, TransportBuilder};
use opensearch::http::{Method, Url};
use std::time::Duration;
use tessera_log::{debug, info};

/// Sends one blocking request per call. No retries.
pub trait Transport: Send + Sync {
    /// PUT `body` to `path` (which may carry a query string) and wait for
    /// the response. Network failures are reported in the returned status.
    fn put_sync(&self, path: &str, body: &str) -> TransportStatus;
}

/// Raw outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportStatus {
    /// HTTP method.
    pub method: &'static str,
    /// Request path including any query string.
    pub path: String,
    /// Request body.
    pub request: String,
    /// HTTP status code, absent when no response arrived.
    pub status_code: Option<u16>,
    /// Response body.
    pub body: String,
    /// Transport-level failure.
    pub failure: Option<String>,
}

impl TransportStatus {
    /// A request that got a response.
    pub fn completed(
        path: impl Into<String>,
        request: impl Into<String>,
        status_code: u16,
        body: impl Into<String>,
    ) -> Self {
        Self {
            method: "PUT",
            path: path.into(),
            request: request.into(),
            status_code: Some(status_code),
            body: body.into(),
            failure: None,
        }
    }

    /// A request that got no response.
    pub fn failed(path: impl Into<String>, request: impl Into<String>, failure: impl Into<String>) -> Self {
        Self {
            method: "PUT",
            path: path.into(),
            request: request.into(),
            status_code: None,
            body: String::new(),
            failure: Some(failure.into()),
        }
    }

    /// Whether a 2xx response arrived.
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}

/// [`Transport`] over the `opensearch` crate's HTTP transport.
///
/// Owns a current-thread runtime and blocks on it, so it must not be used
/// from inside another async runtime.
pub struct OpenSearchTransport {
    http: HttpTransport,
    runtime: tokio::runtime::Runtime,
    timeout: Duration,
    url: String,
}

impl OpenSearchTransport {
    /// Create a transport for the first node in `settings`.
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        info!("Initializing OpenSearch transport for: {:?}", settings.urls);

        let url = settings
            .urls
            .first()
            .ok_or_else(|| MappingError::Configuration("No URLs provided".to_string()))?;

        let parsed = Url::parse(url)
            .map_err(|e| MappingError::Configuration(format!("Invalid URL: {}", e)))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed);
        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(settings.request_timeout)
            .disable_proxy();

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.auth(opensearch::auth::Credentials::Basic(user.clone(), pass.clone()));
        }

        let http = builder
            .build()
            .map_err(|e| MappingError::Connection(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        debug!("OpenSearch transport initialized");

        Ok(Self {
            http,
            runtime,
            timeout: settings.request_timeout,
            url: url.clone(),
        })
    }

    async fn put(
        &self,
        path: &str,
        query: &[(String, String)],
        body: &str,
    ) -> std::result::Result<(u16, String), opensearch::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let query = (!query.is_empty()).then_some(query);

        let response = self
            .http
            .send(
                Method::Put,
                path,
                headers,
                query,
                Some(body.to_string()),
                Some(self.timeout),
            )
            .await?;

        let status = response.status_code().as_u16();
        let text = response.text().await?;
        Ok((status, text))
    }
}

impl Transport for OpenSearchTransport {
    fn put_sync(&self, path: &str, body: &str) -> TransportStatus {
        let (resource, query) = split_query(path);
        debug!("PUT {}/{}", self.url.trim_end_matches('/'), path);

        match self.runtime.block_on(self.put(&resource, &query, body)) {
            Ok((status, text)) => TransportStatus::completed(path, body, status, text),
            Err(e) => TransportStatus::failed(path, body, e.to_string()),
        }
    }
}

impl std::fmt::Debug for OpenSearchTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchTransport")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Split `path?a=b&c` into the resource path and its query pairs.
fn split_query(path: &str) -> (String, Vec<(String, String)>) {
    let Some((resource, query)) = path.split_once('?') else {
        return (format!("/{}", path.trim_start_matches('/')), Vec::new());
    };

    let pairs = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect();

    (format!("/{}", resource.trim_start_matches('/')), pairs)
}
