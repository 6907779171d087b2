//! Gateway transport port
//!
//! Defines the single request/response contract every way of reaching the
//! gateway must satisfy. Implementations (a one-shot process invocation and a
//! persistent authenticated socket) live in the infrastructure layer; the
//! bridge never knows which one it is talking to.

use async_trait::async_trait;
use bridge_domain::{BridgeError, MethodName, Params};
use serde_json::Value;

/// A way of sending one call to the gateway and getting its decoded result.
///
/// Implementations must bound the wall-clock duration of a call and map
/// their failures into the [`BridgeError`] taxonomy. They must not retry.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    /// Short name used in logs (e.g. "process", "socket")
    fn name(&self) -> &'static str;

    /// Send `method` with `params` and return the decoded result payload.
    async fn call(&self, method: &MethodName, params: &Params) -> Result<Value, BridgeError>;
}
