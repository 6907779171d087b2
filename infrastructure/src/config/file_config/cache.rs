//! Cache configuration from TOML (`[cache]` section)

use bridge_domain::TtlPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Raw cache configuration from TOML
///
/// `ttl_ms` is merged over the built-in table, so a file only lists the
/// methods it changes. A TTL of `0` turns caching off for that method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    pub enabled: bool,
    pub ttl_ms: BTreeMap<String, u64>,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        let ttl_ms = TtlPolicy::default_tiers()
            .entries()
            .into_iter()
            .map(|(method, ttl)| (method.to_string(), ttl.as_millis() as u64))
            .collect();
        Self {
            enabled: true,
            ttl_ms,
        }
    }
}

impl FileCacheConfig {
    pub fn to_ttl_policy(&self) -> TtlPolicy {
        if !self.enabled {
            return TtlPolicy::disabled();
        }
        self.ttl_ms
            .iter()
            .filter(|(_, ms)| **ms > 0)
            .map(|(method, ms)| (method.clone(), Duration::from_millis(*ms)))
            .collect()
    }
}
