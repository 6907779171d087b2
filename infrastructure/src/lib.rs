//! Infrastructure layer for gateway-bridge
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the gateway transports, configuration
//! file loading and the JSONL call journal.

pub mod config;
pub mod gateway;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigIssue, ConfigLoader, FileConfig, FileGatewayConfig, Severity, TransportKind,
};
pub use gateway::{
    ConnectionSession, ConnectionState, GatewayClientError, ProcessTransport,
    ProcessTransportConfig, SocketTransport, SocketTransportConfig, transport_from_config,
};
pub use logging::JsonlCallLogger;
