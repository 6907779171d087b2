//! Batch call and outcome shapes
//!
//! A batch is an ordered list of [`CallSpec`]s. Each produces exactly one
//! [`CallOutcome`] at the same position, independent of its siblings.

use crate::core::error::BridgeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default cap on the number of calls accepted in one batch
pub const DEFAULT_MAX_BATCH_CALLS: usize = 10;

/// One requested call, as received from a caller.
///
/// Fields are unvalidated here: a missing method deserializes to an empty
/// string and is rejected by the bridge as a validation error for that
/// position only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSpec {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl CallSpec {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Call with no parameters
    pub fn method(method: impl Into<String>) -> Self {
        Self::new(method, Value::Object(Default::default()))
    }
}

/// Result of one call inside a batch.
///
/// Serializes as `{ok: true, method, data}` or `{ok: false, method, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub ok: bool,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallOutcome {
    pub fn success(method: impl Into<String>, data: Value) -> Self {
        Self {
            ok: true,
            method: method.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(method: impl Into<String>, error: &BridgeError) -> Self {
        Self {
            ok: false,
            method: method.into(),
            data: None,
            error: Some(error.to_string()),
        }
    }

    pub fn from_result(method: impl Into<String>, result: Result<Value, BridgeError>) -> Self {
        match result {
            Ok(data) => Self::success(method, data),
            Err(e) => Self::failure(method, &e),
        }
    }
}
