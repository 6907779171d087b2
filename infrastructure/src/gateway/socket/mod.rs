//! Socket transport and its connection state machine.

mod connection;
#[cfg(test)]
mod test_gateway;
mod transport;

pub use connection::{CloseReason, ConnectionSession, ConnectionState};
pub use transport::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_CLIENT_ID, DEFAULT_CLIENT_MODE, DEFAULT_ROLE, DEFAULT_SCOPE,
    SocketTransport, SocketTransportConfig,
};
