//! Call parameters value object
//!
//! The gateway protocol only accepts keyed parameters, so anything that is
//! not a JSON object is normalized to `{}` before use.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keyed parameters for a gateway call (Value Object).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct Params(Map<String, Value>);

impl Params {
    /// Empty parameter object
    pub fn empty() -> Self {
        Self(Map::new())
    }

    /// Normalize an arbitrary value: objects are kept, everything else
    /// (arrays, scalars, null) becomes an empty object.
    pub fn normalize(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Clone into a plain JSON value for the wire.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Deterministic serialization with object keys sorted at every depth.
    ///
    /// Semantically equal parameter objects produce identical strings no
    /// matter how their keys were ordered on input.
    pub fn canonical_json(&self) -> String {
        let mut out = String::new();
        write_canonical(&Value::Object(self.0.clone()), &mut out);
        out
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        Self::normalize(value)
    }
}

impl From<Params> for Value {
    fn from(params: Params) -> Self {
        Value::Object(params.0)
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_json_string(key, out);
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => push_json_string(s, out),
        other => out.push_str(&other.to_string()),
    }
}

fn push_json_string(s: &str, out: &mut String) {
    // Serializing a &str cannot fail
    out.push_str(&serde_json::to_string(s).unwrap_or_default());
}
