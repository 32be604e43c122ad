//! Error types for telemetry delivery.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors that can occur while signing or delivering a snapshot.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("shared key is not valid base64: {0}")]
    InvalidKey(#[from] base64::DecodeError),

    #[error("invalid collector endpoint: {0}")]
    Endpoint(String),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("tls error: {0}")]
    Tls(String),

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}
