//! Per-method freshness windows
//!
//! The upstream gateway is the bottleneck, so read-mostly methods are served
//! from cache for a short while. Live status gets a window of seconds;
//! slow-changing listings get tens of seconds. Methods absent from the table
//! are never cached or coalesced.

use crate::core::method::MethodName;
use std::collections::HashMap;
use std::time::Duration;

/// Static table of cacheable methods and their TTLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TtlPolicy {
    ttls: HashMap<String, Duration>,
}

impl TtlPolicy {
    /// A policy that caches nothing
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Default tiering for a dashboard-style workload
    pub fn default_tiers() -> Self {
        let live = Duration::from_secs(5);
        let status = Duration::from_secs(10);
        let listing = Duration::from_secs(30);
        let catalog = Duration::from_secs(60);

        Self::disabled()
            .with_ttl("health", live)
            .with_ttl("system-presence", live)
            .with_ttl("last-heartbeat", live)
            .with_ttl("status", status)
            .with_ttl("channels.status", status)
            .with_ttl("sessions.list", Duration::from_secs(15))
            .with_ttl("cron.list", listing)
            .with_ttl("cron.status", listing)
            .with_ttl("skills.status", listing)
            .with_ttl("models.list", catalog)
            .with_ttl("agents.list", catalog)
    }

    /// Add or replace the TTL for a method. A zero TTL removes it.
    pub fn with_ttl(mut self, method: impl Into<String>, ttl: Duration) -> Self {
        let method = method.into();
        if ttl.is_zero() {
            self.ttls.remove(&method);
        } else {
            self.ttls.insert(method, ttl);
        }
        self
    }

    pub fn ttl_for(&self, method: &MethodName) -> Option<Duration> {
        self.ttls.get(method.as_str()).copied()
    }

    pub fn is_cacheable(&self, method: &MethodName) -> bool {
        self.ttls.contains_key(method.as_str())
    }

    pub fn len(&self) -> usize {
        self.ttls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ttls.is_empty()
    }

    /// Iterate over (method, ttl) pairs in method order
    pub fn entries(&self) -> Vec<(&str, Duration)> {
        let mut entries: Vec<_> = self.ttls.iter().map(|(m, t)| (m.as_str(), *t)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl FromIterator<(String, Duration)> for TtlPolicy {
    fn from_iter<I: IntoIterator<Item = (String, Duration)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::disabled(), |policy, (method, ttl)| policy.with_ttl(method, ttl))
    }
}
