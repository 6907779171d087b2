//! Application layer for gateway-bridge
//!
//! This crate contains the bridge facade, the shared cache/in-flight state,
//! batch execution and the port definitions transports implement.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod state;
pub mod use_cases;

// Re-export commonly used types
pub use config::BridgeSettings;
pub use ports::{
    call_logger::{CallEvent, CallLogger, NoCallLogger},
    gateway_transport::GatewayTransport,
};
pub use state::{BridgeState, BridgeStats, CallResult};
pub use use_cases::call_gateway::GatewayBridge;
pub use use_cases::fallback::first_success;
pub use use_cases::run_batch::BatchExecutor;
