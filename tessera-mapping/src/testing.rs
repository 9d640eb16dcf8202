//! In-memory transport for tests.

use crate::transport::{Transport, TransportStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A recorded PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Request path including any query string.
    pub path: String,
    /// Request body.
    pub body: String,
}

impl RecordedRequest {
    /// Body parsed as JSON.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

#[derive(Debug)]
enum Reply {
    Response { status_code: u16, body: String },
    Failure(String),
}

/// Transport that records every request and answers with a canned reply.
///
/// Clones share the same log, so a clone can be handed to a client while
/// the test keeps the original for assertions.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    calls: Arc<Mutex<Vec<RecordedRequest>>>,
    reply: Arc<Mutex<Reply>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    /// Answer every request with `200 {"acknowledged":true}`.
    pub fn new() -> Self {
        Self::replying(200, r#"{"acknowledged":true}"#)
    }

    /// Answer every request with `status_code` and `body`.
    pub fn replying(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new(Reply::Response {
                status_code,
                body: body.into(),
            })),
        }
    }

    /// Fail every request without a response.
    pub fn failing(failure: impl Into<String>) -> Self {
        let transport = Self::new();
        *lock(&transport.reply) = Reply::Failure(failure.into());
        transport
    }

    /// Change the reply for subsequent requests.
    pub fn set_reply(&self, status_code: u16, body: impl Into<String>) {
        *lock(&self.reply) = Reply::Response {
            status_code,
            body: body.into(),
        };
    }

    /// All recorded requests, oldest first.
    pub fn calls(&self) -> Vec<RecordedRequest> {
        lock(&self.calls).clone()
    }

    /// Most recent request.
    pub fn last_call(&self) -> Option<RecordedRequest> {
        lock(&self.calls).last().cloned()
    }

    /// Number of requests made.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Forget recorded requests.
    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

impl Transport for RecordingTransport {
    fn put_sync(&self, path: &str, body: &str) -> TransportStatus {
        lock(&self.calls).push(RecordedRequest {
            path: path.to_string(),
            body: body.to_string(),
        });

        match &*lock(&self.reply) {
            Reply::Response { status_code, body: reply } => {
                TransportStatus::completed(path, body, *status_code, reply.clone())
            }
            Reply::Failure(failure) => TransportStatus::failed(path, body, failure.clone()),
        }
    }
}

// A panicking test must not poison the log for the assertions that follow.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let transport = RecordingTransport::new();
        let handle = transport.clone();

        let status = handle.put_sync("blog/post/_mapping", "{}");
        assert!(status.is_success());
        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.last_call().map(|c| c.path).as_deref(), Some("blog/post/_mapping"));

        transport.clear();
        assert_eq!(handle.call_count(), 0);
    }

    #[test]
    fn test_failing_transport() {
        let transport = RecordingTransport::failing("connection refused");
        let status = transport.put_sync("blog/post/_mapping", "{}");
        assert_eq!(status.status_code, None);
        assert_eq!(status.failure.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_set_reply() {
        let transport = RecordingTransport::new();
        transport.set_reply(500, "oops");
        let status = transport.put_sync("p", "{}");
        assert_eq!(status.status_code, Some(500));
        assert_eq!(status.body, "oops");
    }
}
