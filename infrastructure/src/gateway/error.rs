//! Error types for the gateway transports

use bridge_domain::util::{EXCERPT_CHARS, excerpt};
use bridge_domain::BridgeError;
use thiserror::Error;

/// Result type alias for gateway transport operations
pub type Result<T> = std::result::Result<T, GatewayClientError>;

/// Errors that can occur when talking to the gateway
#[derive(Error, Debug)]
pub enum GatewayClientError {
    #[error("Failed to spawn gateway command: {0}")]
    SpawnError(std::io::Error),

    #[error("I/O error while running gateway command: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("gateway call exited with status {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },

    #[error("gateway call returned empty output{}", stderr_suffix(.stderr))]
    EmptyOutput { stderr: String },

    #[error("Failed to parse gateway output: {error}")]
    ParseError { error: String, raw: String },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("{0}")]
    HandshakeRejected(String),

    #[error("Gateway connection closed: {0}")]
    ConnectionClosed(String),

    #[error("Gateway call '{method}' failed: {message}")]
    RequestFailed { method: String, message: String },

    #[error("Request timeout after {timeout_ms}ms: {method}")]
    Timeout { method: String, timeout_ms: u64 },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(" (stderr: {stderr})")
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GatewayClientError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(error.to_string())
    }
}

impl From<GatewayClientError> for BridgeError {
    fn from(error: GatewayClientError) -> Self {
        match error {
            GatewayClientError::SerializationError(e) => {
                BridgeError::validation(format!("parameters could not be encoded: {e}"))
            }
            GatewayClientError::ParseError { error, raw } => {
                BridgeError::protocol_with_excerpt(error, excerpt(&raw, EXCERPT_CHARS))
            }
            GatewayClientError::HandshakeRejected(reason) => BridgeError::protocol(reason),
            GatewayClientError::Timeout { method, timeout_ms } => {
                BridgeError::timeout(method, timeout_ms)
            }
            other @ (GatewayClientError::SpawnError(_)
            | GatewayClientError::Io(_)
            | GatewayClientError::ExitStatus { .. }
            | GatewayClientError::EmptyOutput { .. }
            | GatewayClientError::WebSocket(_)
            | GatewayClientError::ConnectionClosed(_)
            | GatewayClientError::RequestFailed { .. }) => BridgeError::transport(other.to_string()),
        }
    }
}
