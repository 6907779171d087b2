//! Bridge error taxonomy

use thiserror::Error;

/// Errors surfaced to callers of the bridge.
///
/// Every failure a caller can observe falls into exactly one of these
/// categories. The type is `Clone` because a single upstream outcome is
/// shared by every caller coalesced onto the same in-flight call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Missing or malformed method/parameters. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Process spawn failure, non-zero exit, empty output, socket error or close.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Undecodable output/response, or a negatively acknowledged handshake.
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        /// Bounded excerpt of the offending raw payload, if any.
        excerpt: Option<String>,
    },

    /// No response within the configured deadline.
    #[error("Gateway call '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },
}

impl BridgeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            excerpt: None,
        }
    }

    /// Protocol error carrying an excerpt of the raw payload that failed to decode.
    pub fn protocol_with_excerpt(message: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            excerpt: Some(excerpt.into()),
        }
    }

    pub fn timeout(method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            method: method.into(),
            timeout_ms,
        }
    }

    /// Short category name, used in logs and batch outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport(_) => "transport",
            Self::Protocol { .. } => "protocol",
            Self::Timeout { .. } => "timeout",
        }
    }

    /// Check if this error was caused by the caller rather than the gateway
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error represents an elapsed deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
