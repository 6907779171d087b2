//! Wire frames for the gateway socket protocol.
//!
//! Every message is one JSON object in a WebSocket text frame:
//!
//! - **Request** (bridge → gateway): `{type: "req", id, method, params}`
//! - **Response** (gateway → bridge): `{type: "res", id, ok, payload | error}`
//! - **Event** (gateway → bridge): `{type: "event", ...}`, ignored by the bridge
//!
//! The first request on a connection is always the `connect` handshake,
//! sent with the reserved id [`HANDSHAKE_ID`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version spoken by this client (used as both bounds).
pub const PROTOCOL_VERSION: u32 = 3;

/// Correlation id reserved for the handshake request.
pub const HANDSHAKE_ID: &str = "connect-1";

/// Method name of the handshake request.
pub const CONNECT_METHOD: &str = "connect";

/// Request frame
#[derive(Debug, Clone, Serialize)]
pub struct RequestFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl RequestFrame {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            frame_type: "req",
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// The handshake request carrying `params`.
    pub fn connect(params: &ConnectParams) -> serde_json::Result<Self> {
        Ok(Self::new(
            HANDSHAKE_ID,
            CONNECT_METHOD,
            serde_json::to_value(params)?,
        ))
    }
}

/// Static description of this client, sent during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub id: String,
    pub version: String,
    pub platform: String,
    pub mode: String,
}

impl ClientInfo {
    /// Identity of this build running on the current host
    pub fn current(id: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: std::env::consts::OS.to_string(),
            mode: mode.into(),
        }
    }
}

/// Bearer credential passed to the handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    pub token: String,
}

/// Handshake (`connect`) parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub min_protocol: u32,
    pub max_protocol: u32,
    pub client: ClientInfo,
    pub role: String,
    pub scopes: Vec<String>,
    pub caps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthParams>,
}

/// Error object carried by a negative response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorShape {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
}

/// Response frame
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseFrame {
    pub id: String,
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorShape>,
}

impl ResponseFrame {
    /// Payload on success, error message otherwise.
    pub fn into_result(self) -> Result<Value, String> {
        if self.ok {
            Ok(self.payload.unwrap_or(Value::Null))
        } else {
            Err(self
                .error
                .and_then(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "gateway request failed".to_string()))
        }
    }
}

/// Classification of an incoming frame.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// A response to one of our requests (`type: "res"` with an `id`).
    Response,
    /// A server-pushed event.
    Event,
    /// Anything else.
    Unknown,
}

/// Classify a frame by inspecting its `type` and `id` fields.
pub fn classify_frame(json: &Value) -> FrameKind {
    let frame_type = json.get("type").and_then(Value::as_str);
    let has_id = json.get("id").is_some_and(|id| !id.is_null());

    match (frame_type, has_id) {
        (Some("res"), true) => FrameKind::Response,
        (Some("event"), _) => FrameKind::Event,
        _ => FrameKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connect_params(token: Option<&str>) -> ConnectParams {
        ConnectParams {
            min_protocol: PROTOCOL_VERSION,
            max_protocol: PROTOCOL_VERSION,
            client: ClientInfo {
                id: "gateway-bridge".into(),
                version: "0.4.0".into(),
                platform: "linux".into(),
                mode: "backend".into(),
            },
            role: "operator".into(),
            scopes: vec!["operator.admin".into()],
            caps: vec![],
            auth: token.map(|t| AuthParams { token: t.into() }),
        }
    }

    #[test]
    fn handshake_frame_serializes_with_reserved_id() {
        let frame = RequestFrame::connect(&connect_params(Some("secret"))).unwrap();
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["type"], "req");
        assert_eq!(json["id"], "connect-1");
        assert_eq!(json["method"], "connect");
        assert_eq!(json["params"]["minProtocol"], 3);
        assert_eq!(json["params"]["maxProtocol"], 3);
        assert_eq!(json["params"]["client"]["mode"], "backend");
        assert_eq!(json["params"]["role"], "operator");
        assert_eq!(json["params"]["auth"]["token"], "secret");
    }

    #[test]
    fn handshake_without_credential_omits_auth() {
        let frame = RequestFrame::connect(&connect_params(None)).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert!(json["params"].get("auth").is_none());
    }

    #[test]
    fn negative_response_yields_message() {
        let frame: ResponseFrame = serde_json::from_value(json!({
            "type": "res", "id": "connect-1", "ok": false,
            "error": {"message": "bad token"}
        }))
        .unwrap();
        assert_eq!(frame.into_result().unwrap_err(), "bad token");
    }

    #[test]
    fn negative_response_without_message_has_fallback() {
        let frame: ResponseFrame =
            serde_json::from_value(json!({"type": "res", "id": "7", "ok": false})).unwrap();
        assert_eq!(frame.into_result().unwrap_err(), "gateway request failed");
    }

    #[test]
    fn positive_response_without_payload_is_null() {
        let frame: ResponseFrame =
            serde_json::from_value(json!({"type": "res", "id": "7", "ok": true})).unwrap();
        assert_eq!(frame.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn classify_frames() {
        assert_eq!(
            classify_frame(&json!({"type": "res", "id": "1", "ok": true})),
            FrameKind::Response
        );
        assert_eq!(
            classify_frame(&json!({"type": "event", "event": "tick"})),
            FrameKind::Event
        );
        assert_eq!(classify_frame(&json!({"type": "res"})), FrameKind::Unknown);
        assert_eq!(classify_frame(&json!({"hello": 1})), FrameKind::Unknown);
    }
}
