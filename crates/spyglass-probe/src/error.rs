//! Error types for the status probe.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur during a status query.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("connection i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("malformed status response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("status query timed out after {0:?}")]
    Timeout(Duration),
}
