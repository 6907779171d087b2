//! Socket transport: gateway calls over one shared, reconnecting session.

use super::connection::{ConnectionSession, ConnectionState};
use crate::gateway::protocol::{AuthParams, ClientInfo, ConnectParams, PROTOCOL_VERSION};
use async_trait::async_trait;
use bridge_application::ports::gateway_transport::GatewayTransport;
use bridge_domain::{BridgeError, MethodName, Params};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default per-call timeout (10 seconds)
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_CLIENT_ID: &str = "gateway-bridge";
pub const DEFAULT_CLIENT_MODE: &str = "backend";
pub const DEFAULT_ROLE: &str = "operator";
pub const DEFAULT_SCOPE: &str = "operator.admin";

/// Settings for [`SocketTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketTransportConfig {
    /// WebSocket URL of the gateway
    pub url: String,
    /// Bearer credential sent with the handshake
    pub token: Option<String>,
    pub call_timeout: Duration,
    /// Limit for opening the socket plus the handshake; `call_timeout` if unset
    pub handshake_timeout: Option<Duration>,
    pub client_id: String,
    pub client_mode: String,
    pub role: String,
    pub scopes: Vec<String>,
    pub caps: Vec<String>,
}

impl SocketTransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            handshake_timeout: None,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_mode: DEFAULT_CLIENT_MODE.to_string(),
            role: DEFAULT_ROLE.to_string(),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            caps: Vec::new(),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// How long a new session may take to become ready.
    pub fn effective_handshake_timeout(&self) -> Duration {
        self.handshake_timeout.unwrap_or(self.call_timeout)
    }

    pub fn with_client(mut self, id: impl Into<String>, mode: impl Into<String>) -> Self {
        self.client_id = id.into();
        self.client_mode = mode.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>, scopes: Vec<String>) -> Self {
        self.role = role.into();
        self.scopes = scopes;
        self
    }

    /// Handshake parameters for a new session.
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            min_protocol: PROTOCOL_VERSION,
            max_protocol: PROTOCOL_VERSION,
            client: ClientInfo::current(&self.client_id, &self.client_mode),
            role: self.role.clone(),
            scopes: self.scopes.clone(),
            caps: self.caps.clone(),
            auth: self.token.as_ref().map(|token| AuthParams {
                token: token.clone(),
            }),
        }
    }
}

/// Gateway transport over a persistent WebSocket session.
///
/// At most one session is live at a time. When it has closed (including a
/// session whose handshake never completed), the next caller opens a fresh one; opening is serialized so concurrent callers
/// share the same new session.
pub struct SocketTransport {
    config: SocketTransportConfig,
    session: Mutex<Option<Arc<ConnectionSession>>>,
}

impl SocketTransport {
    pub fn new(config: SocketTransportConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SocketTransportConfig {
        &self.config
    }

    /// Current session state, if a session was ever opened.
    pub async fn state(&self) -> Option<ConnectionState> {
        self.session.lock().await.as_ref().map(|s| s.state())
    }

    /// Live session, opening a new one if needed.
    pub async fn session(&self) -> Arc<ConnectionSession> {
        let mut slot = self.session.lock().await;

        if let Some(session) = slot.as_ref()
            && session.state() != ConnectionState::Closed
        {
            return Arc::clone(session);
        }

        if let Some(previous) = slot.as_ref() {
            info!(
                "Reconnecting to gateway at {} (previous session: {})",
                self.config.url,
                previous
                    .close_reason()
                    .map(|r| r.to_string())
                    .unwrap_or_default()
            );
        } else {
            debug!("Opening gateway session to {}", self.config.url);
        }

        let session = ConnectionSession::open(
            &self.config.url,
            self.config.connect_params(),
            self.config.effective_handshake_timeout(),
        );
        *slot = Some(Arc::clone(&session));
        session
    }

    /// Close the live session, failing its pending calls.
    pub async fn close(&self) {
        if let Some(session) = self.session.lock().await.take() {
            session.close();
        }
    }
}

#[async_trait]
impl GatewayTransport for SocketTransport {
    fn name(&self) -> &'static str {
        "socket"
    }

    async fn call(&self, method: &MethodName, params: &Params) -> Result<Value, BridgeError> {
        let session = self.session().await;
        session
            .request(method.as_str(), params.to_value(), self.config.call_timeout)
            .await
            .map_err(BridgeError::from)
    }
}
