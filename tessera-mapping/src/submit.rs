//! Mapping submission.
//!
//! Serializes a mapping under its type name, PUTs it to
//! `<index>/<type>/_mapping` and normalizes the response. A body that does
//! not parse is not an error: the response comes back with `is_valid` unset
//! and the raw transport status intact.

use crate::error::{MappingError, Result};
use crate::node::RootMapping;
use crate::resolve::{MAPPING_RESOURCE, PathResolver};
use crate::transport::{Transport, TransportStatus};
use serde::{Deserialize, Serialize};
use tessera_log::{debug, info, warn};

/// Query flag asking the engine to accept conflicting field definitions.
pub const IGNORE_CONFLICTS_QUERY: &str = "ignore_conflicts=true";

/// Error reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineError {
    /// Older engines report a plain message.
    Message(String),
    /// Structured error with a type and reason.
    Detailed {
        /// Error type, e.g. `mapper_parsing_exception`.
        #[serde(rename = "type")]
        kind: String,
        /// Human readable reason.
        reason: String,
    },
}

impl EngineError {
    /// Reason text regardless of shape.
    pub fn reason(&self) -> &str {
        match self {
            EngineError::Message(message) => message,
            EngineError::Detailed { reason, .. } => reason,
        }
    }
}

/// Parsed body of an indices API response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicesEnvelope {
    /// Whether the engine accepted the request.
    #[serde(default)]
    pub acknowledged: bool,
    /// Success flag of older engines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// Engine-reported error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,
    /// Status echoed in error bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl IndicesEnvelope {
    /// Whether the engine reported success.
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && (self.acknowledged || self.ok == Some(true))
    }
}

/// Normalized outcome of one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingResponse {
    status: TransportStatus,
    envelope: IndicesEnvelope,
    is_valid: bool,
}

impl MappingResponse {
    /// Normalize a raw status. Only a body that parses yields a valid
    /// response.
    pub fn from_status(status: TransportStatus) -> Self {
        if let Some(failure) = &status.failure {
            warn!("PUT {} failed: {}", status.path, failure);
            return Self {
                status,
                envelope: IndicesEnvelope::default(),
                is_valid: false,
            };
        }

        match serde_json::from_str::<IndicesEnvelope>(&status.body) {
            Ok(envelope) => Self {
                status,
                envelope,
                is_valid: true,
            },
            Err(e) => {
                warn!(
                    "Could not parse mapping response from {} (status {:?}): {}",
                    status.path, status.status_code, e
                );
                Self {
                    status,
                    envelope: IndicesEnvelope::default(),
                    is_valid: false,
                }
            }
        }
    }

    /// Raw transport status.
    pub fn status(&self) -> &TransportStatus {
        &self.status
    }

    /// Parsed envelope. Meaningful only when [`is_valid`](Self::is_valid).
    pub fn envelope(&self) -> &IndicesEnvelope {
        &self.envelope
    }

    /// Whether the body parsed.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Whether the body parsed and the engine acknowledged the mapping.
    pub fn acknowledged(&self) -> bool {
        self.is_valid && self.envelope.succeeded()
    }

    /// Engine-reported error, if any.
    pub fn error(&self) -> Option<&EngineError> {
        self.envelope.error.as_ref()
    }
}

/// Submits mapping documents through a [`Transport`].
pub struct MappingSubmitter<'a> {
    transport: &'a dyn Transport,
    paths: &'a dyn PathResolver,
}

impl<'a> MappingSubmitter<'a> {
    /// Create a submitter.
    pub fn new(transport: &'a dyn Transport, paths: &'a dyn PathResolver) -> Self {
        Self { transport, paths }
    }

    /// Submit a built mapping.
    ///
    /// The effective type name is `type_name` when non-empty, else the
    /// mapping's own name. It keys both the document and the path.
    pub fn submit(
        &self,
        mapping: &RootMapping,
        index: &str,
        type_name: Option<&str>,
        ignore_conflicts: bool,
    ) -> Result<MappingResponse> {
        let type_name = type_name
            .filter(|name| !name.is_empty())
            .unwrap_or(mapping.name.as_str());

        if type_name.is_empty() {
            return Err(MappingError::InvalidArgument(
                "mapping has no type name".to_string(),
            ));
        }

        let body = serde_json::to_string(&mapping.to_document(type_name))?;
        self.submit_raw(type_name, &body, index, ignore_conflicts)
    }

    /// Submit a serialized document of the form `{"<type>": {...}}` as is.
    pub fn submit_raw(
        &self,
        type_name: &str,
        body: &str,
        index: &str,
        ignore_conflicts: bool,
    ) -> Result<MappingResponse> {
        if index.trim_matches('/').is_empty() {
            return Err(MappingError::InvalidArgument(
                "index name must not be empty".to_string(),
            ));
        }
        if type_name.trim_matches('/').is_empty() {
            return Err(MappingError::InvalidArgument(
                "type name must not be empty".to_string(),
            ));
        }

        let path = mapping_path(self.paths, index, type_name, ignore_conflicts);

        info!("Submitting mapping for '{}' to index '{}'", type_name, index);
        debug!("PUT {} ({} bytes)", path, body.len());

        let status = self.transport.put_sync(&path, body);
        Ok(MappingResponse::from_status(status))
    }
}

/// Path of the mapping endpoint, with the conflict flag appended once when
/// set.
pub fn mapping_path(
    paths: &dyn PathResolver,
    index: &str,
    type_name: &str,
    ignore_conflicts: bool,
) -> String {
    let path = paths.index_type_path(index, type_name, MAPPING_RESOURCE);
    if ignore_conflicts {
        format!("{}?{}", path, IGNORE_CONFLICTS_QUERY)
    } else {
        path
    }
}
