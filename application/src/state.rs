//! Shared bridge state: response cache and in-flight table.
//!
//! Both tables are keyed by [`CacheKey`] and guarded by a single table-wide
//! lock. The workload has low contention (calls are slow, lookups are not),
//! and one lock makes the "is there an entry / a slot? otherwise create a
//! slot" sequence atomic as a unit, so two concurrent callers can never both
//! believe they are the sole initiator for a key.
//!
//! The lock is never held across an `.await`.

use bridge_domain::{BridgeError, CacheKey};
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of one upstream call
pub type CallResult = Result<Value, BridgeError>;

/// The shared outcome of a call currently in progress.
///
/// Cloning it is cheap; every clone resolves to the same result.
pub type InFlightCall = Shared<BoxFuture<'static, CallResult>>;

/// Last successful result for a key and when it stops being served.
struct CacheEntry {
    result: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
struct Tables {
    entries: HashMap<CacheKey, CacheEntry>,
    in_flight: HashMap<CacheKey, InFlightCall>,
}

/// Result of consulting the tables for a cacheable call.
pub enum Lookup {
    /// A live cache entry exists; no upstream call is needed.
    Cached(Value),
    /// Another caller already started this call; await its outcome.
    Joined(InFlightCall),
    /// This caller created the slot and owns the upstream call.
    Started(InFlightCall),
}

/// Counters describing how calls were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    pub cache_hits: u64,
    pub coalesced: u64,
    pub upstream_calls: u64,
    pub cached_entries: usize,
    pub in_flight: usize,
}

/// Process-wide cache and in-flight tables, owned explicitly and injected
/// into [`GatewayBridge`](crate::use_cases::call_gateway::GatewayBridge).
///
/// Entries are never deleted: a stale entry is ignored once past expiry and
/// overwritten by the next successful refresh.
#[derive(Default)]
pub struct BridgeState {
    tables: Mutex<Tables>,
    cache_hits: AtomicU64,
    coalesced: AtomicU64,
    upstream_calls: AtomicU64,
}

impl BridgeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve from cache, join an in-flight call, or start a new one.
    ///
    /// `start` builds (but must not poll) the future for a new call. It runs
    /// under the table lock only when neither a live entry nor a slot exists,
    /// and the returned future is registered before the lock is released.
    pub fn lookup_or_start<F>(&self, key: &CacheKey, now: Instant, start: F) -> Lookup
    where
        F: FnOnce() -> InFlightCall,
    {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(entry) = tables.entries.get(key)
            && entry.is_fresh(now)
        {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Lookup::Cached(entry.result.clone());
        }

        if let Some(pending) = tables.in_flight.get(key) {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            return Lookup::Joined(pending.clone());
        }

        let call = start();
        tables.in_flight.insert(key.clone(), call.clone());
        Lookup::Started(call)
    }

    /// Record the outcome of the call owning `key`'s slot and release the slot.
    ///
    /// Success writes a fresh entry expiring at `now + ttl`; failure leaves the
    /// cache untouched. The slot is removed either way, under the same lock,
    /// so a later caller sees either the slot or the fresh entry.
    pub fn settle(&self, key: &CacheKey, result: &CallResult, ttl: Duration, now: Instant) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        if let Ok(value) = result {
            tables.entries.insert(
                key.clone(),
                CacheEntry {
                    result: value.clone(),
                    expires_at: now + ttl,
                },
            );
        }
        tables.in_flight.remove(key);
    }

    /// Count one call actually sent to the gateway.
    pub fn record_upstream(&self) {
        self.upstream_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Live cached result for `key`, if any.
    pub fn cached(&self, key: &CacheKey, now: Instant) -> Option<Value> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.result.clone())
    }

    /// Whether an entry (fresh or stale) exists for `key`.
    pub fn has_entry(&self, key: &CacheKey) -> bool {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.entries.contains_key(key)
    }

    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.in_flight.contains_key(key)
    }

    pub fn stats(&self) -> BridgeStats {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        BridgeStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            upstream_calls: self.upstream_calls.load(Ordering::Relaxed),
            cached_entries: tables.entries.len(),
            in_flight: tables.in_flight.len(),
        }
    }
}
