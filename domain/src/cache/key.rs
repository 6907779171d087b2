//! Cache key derivation

use crate::core::{method::MethodName, params::Params};

/// Canonical identity of a method + parameters pair.
///
/// Shared by the response cache and the in-flight table, so two calls that
/// would hit the same cache entry also coalesce onto the same upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(method: &MethodName, params: &Params) -> Self {
        Self(format!("{}:{}", method, params.canonical_json()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(method: &str, params: serde_json::Value) -> CacheKey {
        CacheKey::new(&MethodName::parse(method).unwrap(), &Params::normalize(params))
    }

    #[test]
    fn test_key_ignores_key_order() {
        assert_eq!(
            key("status", json!({"a": 1, "b": 2})),
            key("status", json!({"b": 2, "a": 1}))
        );
    }

    #[test]
    fn test_key_distinguishes_methods() {
        assert_ne!(key("status", json!({})), key("health", json!({})));
    }

    #[test]
    fn test_key_distinguishes_params() {
        assert_ne!(
            key("cron.list", json!({"includeDisabled": true})),
            key("cron.list", json!({"includeDisabled": false}))
        );
    }

    #[test]
    fn test_non_object_params_share_empty_key() {
        assert_eq!(key("status", json!([1, 2])), key("status", json!({})));
        assert_eq!(key("status", json!({})).as_str(), "status:{}");
    }
}
