//! Crate-level error taxonomy.
//!
//! Only snapshot-path failures reach callers; channel drops are absorbed by
//! the reconnect loop and malformed push messages are logged and skipped.

use thiserror::Error;

/// Errors surfaced by the live-list client and its collaborators.
///
/// Each variant carries enough context to diagnose the failure without
/// inspecting the originating error directly.
#[derive(Debug, Error)]
pub enum LiveListError {
    /// The backend replied with a non-2xx HTTP status code.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The snapshot request could not reach the backend at all.
    #[error("request to {url} failed: {detail}")]
    Request { url: String, detail: String },

    /// The snapshot body could not be parsed as a page of the resource.
    #[error("snapshot of {resource} could not be parsed: {detail}")]
    Snapshot { resource: String, detail: String },

    /// The push channel could not be opened.
    #[error("channel connect failed for {path}: {detail}")]
    Connect { path: String, detail: String },

    /// A config file could not be read or parsed.
    #[error("config file {path}: {detail}")]
    Config { path: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_display_carries_status_and_url() {
        let err = LiveListError::Http {
            status: 503,
            url: "http://localhost:8080/api/documents".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("503"), "status in display: {s}");
        assert!(s.contains("/api/documents"), "url in display: {s}");
    }

    #[test]
    fn test_snapshot_display_carries_resource() {
        let err = LiveListError::Snapshot {
            resource: "models".to_string(),
            detail: "missing `models` array".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("models"), "resource in display: {s}");
        assert!(s.contains("missing"), "detail in display: {s}");
    }

    #[test]
    fn test_connect_display_carries_path() {
        let err = LiveListError::Connect {
            path: "/ws/projects".to_string(),
            detail: "connection refused".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("/ws/projects"), "path in display: {s}");
        assert!(s.contains("connection refused"), "detail in display: {s}");
    }

    #[test]
    fn test_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        let err = LiveListError::Http { status: 500, url: "x".to_string() };
        assert_error(&err);
    }
}
