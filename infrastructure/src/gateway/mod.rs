//! Gateway transports
//!
//! Two interchangeable implementations of the
//! [`GatewayTransport`](bridge_application::GatewayTransport) port:
//!
//! - [`ProcessTransport`]: spawns the gateway CLI once per call
//! - [`SocketTransport`]: one persistent, handshake-gated WebSocket session

pub mod error;
pub mod process;
pub mod protocol;
pub mod socket;

pub use error::GatewayClientError;
pub use process::{ProcessTransport, ProcessTransportConfig};
pub use socket::{ConnectionSession, ConnectionState, SocketTransport, SocketTransportConfig};

use crate::config::{FileGatewayConfig, TransportKind};
use bridge_application::GatewayTransport;
use std::sync::Arc;
use tracing::info;

/// Build the transport selected by `config`.
pub fn transport_from_config(config: &FileGatewayConfig) -> Arc<dyn GatewayTransport> {
    match config.transport {
        TransportKind::Process => {
            let process = config.process_config();
            info!(
                "Using process transport: {} (timeout {}ms)",
                process.program,
                process.timeout.as_millis()
            );
            Arc::new(ProcessTransport::new(process))
        }
        TransportKind::Socket => {
            let socket = config.socket_config();
            info!(
                "Using socket transport: {} (timeout {}ms)",
                socket.url,
                socket.call_timeout.as_millis()
            );
            Arc::new(SocketTransport::new(socket))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_config_selects_variant() {
        let mut config = FileGatewayConfig::default();
        assert_eq!(transport_from_config(&config).name(), "process");

        config.transport = TransportKind::Socket;
        assert_eq!(transport_from_config(&config).name(), "socket");
    }
}
