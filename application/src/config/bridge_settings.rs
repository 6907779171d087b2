//! Bridge settings: caching and batching behavior.
//!
//! [`BridgeSettings`] groups the static parameters consumed by
//! [`GatewayBridge`](crate::use_cases::call_gateway::GatewayBridge) and
//! [`BatchExecutor`](crate::use_cases::run_batch::BatchExecutor). Transport
//! settings (addresses, credentials, timeouts) belong to the adapters.

use bridge_domain::{DEFAULT_MAX_BATCH_CALLS, TtlPolicy};

/// Caching and batching parameters.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Per-method TTLs; methods absent from the table are never cached.
    pub ttl_policy: TtlPolicy,
    /// Maximum number of calls accepted in one batch.
    pub max_batch_calls: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            ttl_policy: TtlPolicy::default_tiers(),
            max_batch_calls: DEFAULT_MAX_BATCH_CALLS,
        }
    }
}

impl BridgeSettings {
    // ==================== Builder Methods ====================

    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    pub fn with_max_batch_calls(mut self, max: usize) -> Self {
        self.max_batch_calls = max;
        self
    }

    /// Disable caching and coalescing entirely
    pub fn without_cache(mut self) -> Self {
        self.ttl_policy = TtlPolicy::disabled();
        self
    }
}
