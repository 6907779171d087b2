//! Gateway configuration from TOML (`[gateway]` section)

use crate::gateway::process::{
    DEFAULT_GATEWAY_COMMAND, DEFAULT_KILL_GRACE, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_PROCESS_TIMEOUT,
    ProcessTransportConfig,
};
use crate::gateway::socket::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_CLIENT_ID, DEFAULT_CLIENT_MODE, DEFAULT_ROLE, DEFAULT_SCOPE,
    SocketTransportConfig,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which transport reaches the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// One external command per call
    #[default]
    Process,
    /// Persistent WebSocket session
    Socket,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process => write!(f, "process"),
            Self::Socket => write!(f, "socket"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "process" | "exec" => Ok(Self::Process),
            "socket" | "ws" | "websocket" => Ok(Self::Socket),
            other => Err(format!(
                "unknown transport '{}' (expected 'process' or 'socket')",
                other
            )),
        }
    }
}

/// Raw gateway configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    pub transport: TransportKind,
    /// WebSocket URL (socket transport)
    pub url: String,
    /// Credential passed to the handshake (socket transport)
    pub token: Option<String>,
    /// Gateway CLI program (process transport)
    pub command: String,
    /// Arguments placed before `gateway call ...` (process transport)
    pub command_args: Vec<String>,
    /// Per-call timeout; defaults depend on the transport
    pub call_timeout_ms: Option<u64>,
    /// Socket open + handshake limit; defaults to the call timeout
    pub handshake_timeout_ms: Option<u64>,
    pub process_grace_ms: u64,
    pub max_output_bytes: usize,
    pub role: String,
    pub scopes: Vec<String>,
    pub client_id: String,
    pub client_mode: String,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            url: "ws://127.0.0.1:18789".to_string(),
            token: None,
            command: DEFAULT_GATEWAY_COMMAND.to_string(),
            command_args: Vec::new(),
            call_timeout_ms: None,
            handshake_timeout_ms: None,
            process_grace_ms: DEFAULT_KILL_GRACE.as_millis() as u64,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            role: DEFAULT_ROLE.to_string(),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_mode: DEFAULT_CLIENT_MODE.to_string(),
        }
    }
}

impl FileGatewayConfig {
    /// Effective per-call timeout for the selected transport
    pub fn call_timeout(&self) -> Duration {
        match (self.call_timeout_ms, self.transport) {
            (Some(ms), _) => Duration::from_millis(ms),
            (None, TransportKind::Process) => DEFAULT_PROCESS_TIMEOUT,
            (None, TransportKind::Socket) => DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn process_config(&self) -> ProcessTransportConfig {
        ProcessTransportConfig::new(&self.command)
            .with_prefix_args(self.command_args.clone())
            .with_timeout(self.call_timeout())
            .with_grace(Duration::from_millis(self.process_grace_ms))
            .with_max_output_bytes(self.max_output_bytes)
    }

    pub fn socket_config(&self) -> SocketTransportConfig {
        SocketTransportConfig::new(&self.url)
            .with_token(self.token.clone())
            .with_call_timeout(self.call_timeout())
            .with_handshake_timeout(self.handshake_timeout_ms.map(Duration::from_millis))
            .with_client(&self.client_id, &self.client_mode)
            .with_role(&self.role, self.scopes.clone())
    }
}
