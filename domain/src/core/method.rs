//! Method name value object

use super::error::BridgeError;
use serde::{Deserialize, Serialize};

/// Name of an upstream gateway operation (Value Object), e.g. `status` or `cron.list`.
///
/// Opaque to the bridge apart from being non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodName(String);

impl MethodName {
    /// Validate and wrap a method name.
    ///
    /// Surrounding whitespace is trimmed; an empty result is a caller error.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, BridgeError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(BridgeError::validation("method is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MethodName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MethodName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MethodName {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<MethodName> for String {
    fn from(method: MethodName) -> Self {
        method.0
    }
}
