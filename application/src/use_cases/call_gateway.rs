//! Bridge facade
//!
//! The only entry point callers use to reach the gateway. Every call goes
//! through the same path:
//!
//! 1. validate the method name and normalize parameters
//! 2. methods without a TTL go straight to the transport
//! 3. otherwise serve a live cache entry, join an identical in-flight call,
//!    or start a new upstream call
//! 4. the call that owns the slot writes the cache on success and releases
//!    the slot on any outcome

use crate::config::BridgeSettings;
use crate::ports::call_logger::{CallEvent, CallLogger, NoCallLogger};
use crate::ports::gateway_transport::GatewayTransport;
use crate::state::{BridgeState, CallResult, InFlightCall, Lookup};
use crate::use_cases::fallback::first_success;
use bridge_domain::{BridgeError, CacheKey, CallSpec, MethodName, Params};
use futures::FutureExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Caching, coalescing front for a [`GatewayTransport`].
///
/// Cheap to share behind an `Arc`; safe under any number of concurrent
/// callers. Swapping the transport does not change this contract.
pub struct GatewayBridge {
    transport: Arc<dyn GatewayTransport>,
    state: Arc<BridgeState>,
    settings: BridgeSettings,
    call_logger: Arc<dyn CallLogger>,
}

impl GatewayBridge {
    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        state: Arc<BridgeState>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            transport,
            state,
            settings,
            call_logger: Arc::new(NoCallLogger),
        }
    }

    /// Record every cache hit, join and upstream call to a journal
    pub fn with_call_logger(mut self, logger: Arc<dyn CallLogger>) -> Self {
        self.call_logger = logger;
        self
    }

    pub fn state(&self) -> &Arc<BridgeState> {
        &self.state
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn call_logger(&self) -> &Arc<dyn CallLogger> {
        &self.call_logger
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Call `method` with `params`.
    ///
    /// An empty method is a [`BridgeError::Validation`] and never reaches the
    /// transport. Non-object parameters are treated as `{}`.
    pub async fn call(&self, method: &str, params: Value) -> CallResult {
        let method = MethodName::parse(method)?;
        self.call_method(method, Params::normalize(params)).await
    }

    /// Call with an already validated method name.
    pub async fn call_method(&self, method: MethodName, params: Params) -> CallResult {
        let Some(ttl) = self.settings.ttl_policy.ttl_for(&method) else {
            debug!("{} is not cacheable, calling gateway directly", method);
            return invoke(
                self.transport.as_ref(),
                &self.state,
                self.call_logger.as_ref(),
                &method,
                &params,
            )
            .await;
        };

        let key = CacheKey::new(&method, &params);
        let lookup = self.state.lookup_or_start(&key, Instant::now(), || {
            self.start_call(method.clone(), params.clone(), key.clone(), ttl)
        });

        match lookup {
            Lookup::Cached(value) => {
                debug!("Cache hit for {}", key);
                self.call_logger.log(CallEvent::new(
                    "cache_hit",
                    json!({ "method": method.as_str() }),
                ));
                Ok(value)
            }
            Lookup::Joined(call) => {
                debug!("Joining in-flight call for {}", key);
                self.call_logger.log(CallEvent::new(
                    "coalesced",
                    json!({ "method": method.as_str() }),
                ));
                call.await
            }
            Lookup::Started(call) => {
                debug!("Cache miss for {}, calling gateway", key);
                // Drive the call independently of this caller so the slot is
                // always settled, even if every waiter goes away.
                let _ = tokio::spawn(call.clone());
                call.await
            }
        }
    }

    /// Try each candidate in order and return the first success.
    ///
    /// Returns the method that succeeded together with its result. When every
    /// candidate fails, the last failure is returned.
    pub async fn call_first_success(
        &self,
        candidates: &[CallSpec],
    ) -> Result<(String, Value), BridgeError> {
        first_success(candidates, |spec| async move {
            let value = self.call(&spec.method, spec.params.clone()).await?;
            Ok((spec.method.clone(), value))
        })
        .await
    }

    fn start_call(
        &self,
        method: MethodName,
        params: Params,
        key: CacheKey,
        ttl: Duration,
    ) -> InFlightCall {
        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let call_logger = Arc::clone(&self.call_logger);

        async move {
            let result = invoke(
                transport.as_ref(),
                &state,
                call_logger.as_ref(),
                &method,
                &params,
            )
            .await;
            state.settle(&key, &result, ttl, Instant::now());
            result
        }
        .boxed()
        .shared()
    }
}

/// One real upstream call, counted and journaled.
async fn invoke(
    transport: &dyn GatewayTransport,
    state: &BridgeState,
    call_logger: &dyn CallLogger,
    method: &MethodName,
    params: &Params,
) -> CallResult {
    state.record_upstream();
    let started = Instant::now();
    let result = transport.call(method, params).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let mut payload = json!({
        "method": method.as_str(),
        "transport": transport.name(),
        "duration_ms": elapsed_ms,
        "ok": result.is_ok(),
    });
    match &result {
        Ok(_) => {
            debug!("{} via {} succeeded in {}ms", method, transport.name(), elapsed_ms);
        }
        Err(e) => {
            warn!("{} via {} failed after {}ms: {}", method, transport.name(), elapsed_ms, e);
            payload["error"] = json!(e.to_string());
            payload["error_kind"] = json!(e.kind());
        }
    }
    call_logger.log(CallEvent::new("upstream_call", payload));

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{CountingTransport, RecordingLogger};
    use bridge_domain::TtlPolicy;
    use serde_json::json;

    fn bridge(transport: Arc<CountingTransport>, policy: TtlPolicy) -> GatewayBridge {
        GatewayBridge::new(
            transport,
            Arc::new(BridgeState::new()),
            BridgeSettings::default().with_ttl_policy(policy),
        )
    }

    fn status_policy() -> TtlPolicy {
        TtlPolicy::disabled()
            .with_ttl("status", Duration::from_secs(10))
            .with_ttl("cron.list", Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_within_ttl_is_served_from_cache() {
        let transport = Arc::new(CountingTransport::new());
        let bridge = bridge(Arc::clone(&transport), status_policy());

        let first = bridge.call("status", json!({})).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        let second = bridge.call("status", json!({})).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
        assert_eq!(bridge.state().stats().cache_hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_triggers_refresh() {
        let transport = Arc::new(CountingTransport::new());
        let bridge = bridge(Arc::clone(&transport), status_policy());

        let first = bridge.call("status", json!({})).await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        let second = bridge.call("status", json!({})).await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert_ne!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_order_does_not_defeat_cache() {
        let transport = Arc::new(CountingTransport::new());
        let bridge = bridge(Arc::clone(&transport), status_policy());

        let a: Value = serde_json::from_str(r#"{"a":1,"b":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b":2,"a":1}"#).unwrap();
        bridge.call("status", a).await.unwrap();
        bridge.call("status", b).await.unwrap();

        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_identical_calls_share_one_upstream_call() {
        let transport = Arc::new(CountingTransport::gated());
        let bridge = Arc::new(bridge(Arc::clone(&transport), status_policy()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let bridge = Arc::clone(&bridge);
            handles.push(tokio::spawn(async move {
                bridge
                    .call("cron.list", json!({"includeDisabled": true}))
                    .await
            }));
        }

        transport.wait_for_calls(1).await;
        while bridge.state().stats().coalesced < 7 {
            tokio::task::yield_now().await;
        }
        transport.open_gate();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(transport.calls(), 1);
        assert!(results.iter().all(|r| r == &results[0]));
        assert_eq!(bridge.state().stats().in_flight, 0);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached_and_next_call_retries() {
        let transport = Arc::new(CountingTransport::new());
        transport.fail_next(BridgeError::transport("gateway down"));
        let bridge = bridge(Arc::clone(&transport), status_policy());

        let err = bridge.call("status", json!({})).await.unwrap_err();
        assert_eq!(err, BridgeError::transport("gateway down"));

        let key = CacheKey::new(&MethodName::parse("status").unwrap(), &Params::empty());
        assert!(!bridge.state().has_entry(&key));
        assert!(!bridge.state().is_in_flight(&key));

        bridge.call("status", json!({})).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_coalesced_callers_share_the_failure() {
        let transport = Arc::new(CountingTransport::gated());
        transport.fail_next(BridgeError::timeout("status", 10));
        let bridge = Arc::new(bridge(Arc::clone(&transport), status_policy()));

        let a = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.call("status", json!({})).await }
        });
        transport.wait_for_calls(1).await;
        let b = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.call("status", json!({})).await }
        });
        while bridge.state().stats().coalesced < 1 {
            tokio::task::yield_now().await;
        }
        transport.open_gate();

        assert!(a.await.unwrap().unwrap_err().is_timeout());
        assert!(b.await.unwrap().unwrap_err().is_timeout());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_cacheable_method_always_calls_upstream() {
        let transport = Arc::new(CountingTransport::new());
        let bridge = bridge(Arc::clone(&transport), status_policy());

        bridge.call("chat.send", json!({"text": "hi"})).await.unwrap();
        bridge.call("chat.send", json!({"text": "hi"})).await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(bridge.state().stats().cached_entries, 0);
    }

    #[tokio::test]
    async fn test_empty_method_is_rejected_before_transport() {
        let transport = Arc::new(CountingTransport::new());
        let bridge = bridge(Arc::clone(&transport), status_policy());

        let err = bridge.call("  ", json!({})).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_object_params_are_normalized() {
        let transport = Arc::new(CountingTransport::new());
        let bridge = bridge(Arc::clone(&transport), status_policy());

        bridge.call("chat.history", json!([1, 2, 3])).await.unwrap();
        assert_eq!(transport.last_params(), Some(json!({})));
    }

    #[tokio::test]
    async fn test_call_journal_records_decisions() {
        let transport = Arc::new(CountingTransport::new());
        let logger = Arc::new(RecordingLogger::default());
        let bridge = bridge(Arc::clone(&transport), status_policy())
            .with_call_logger(Arc::clone(&logger) as Arc<dyn CallLogger>);

        bridge.call("status", json!({})).await.unwrap();
        bridge.call("status", json!({})).await.unwrap();

        assert_eq!(logger.event_types(), vec!["upstream_call", "cache_hit"]);
    }

    #[tokio::test]
    async fn test_first_success_falls_through_failures() {
        let transport = Arc::new(CountingTransport::new());
        transport.fail_method("skills.status");
        let bridge = bridge(Arc::clone(&transport), status_policy());

        let (method, _) = bridge
            .call_first_success(&[
                CallSpec::method("skills.status"),
                CallSpec::method("status"),
            ])
            .await
            .unwrap();

        assert_eq!(method, "status");
        assert_eq!(transport.calls(), 2);
    }
}
