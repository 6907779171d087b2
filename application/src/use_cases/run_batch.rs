//! Run Batch use case
//!
//! Executes an ordered list of heterogeneous calls concurrently through the
//! bridge facade and returns one outcome per input position.

use crate::ports::call_logger::CallEvent;
use crate::use_cases::call_gateway::GatewayBridge;
use bridge_domain::{BridgeError, CallOutcome, CallSpec};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Use case for running a bounded batch of calls
pub struct BatchExecutor {
    bridge: Arc<GatewayBridge>,
    max_calls: usize,
}

impl BatchExecutor {
    /// Executor using the bridge's configured batch cap
    pub fn new(bridge: Arc<GatewayBridge>) -> Self {
        let max_calls = bridge.settings().max_batch_calls;
        Self { bridge, max_calls }
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// Run every call concurrently.
    ///
    /// A batch larger than the cap is rejected as a whole with a validation
    /// error before any call is made. Otherwise the result has the same
    /// length and order as `calls`; a failing call only affects its own
    /// position.
    pub async fn execute(&self, calls: Vec<CallSpec>) -> Result<Vec<CallOutcome>, BridgeError> {
        if calls.len() > self.max_calls {
            warn!(
                "Rejecting batch of {} calls (max {})",
                calls.len(),
                self.max_calls
            );
            self.bridge.call_logger().log(CallEvent::new(
                "batch_rejected",
                json!({ "requested": calls.len(), "max": self.max_calls }),
            ));
            return Err(BridgeError::validation(format!(
                "batch of {} calls exceeds the maximum of {}",
                calls.len(),
                self.max_calls
            )));
        }

        info!("Running batch of {} calls", calls.len());

        let methods: Vec<String> = calls.iter().map(|c| c.method.clone()).collect();
        let mut join_set = JoinSet::new();

        for (index, spec) in calls.into_iter().enumerate() {
            let bridge = Arc::clone(&self.bridge);
            join_set.spawn(async move {
                let result = bridge.call(&spec.method, spec.params).await;
                (index, CallOutcome::from_result(spec.method, result))
            });
        }

        let mut slots: Vec<Option<CallOutcome>> = vec![None; methods.len()];

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!("Batch task join error: {}", e),
            }
        }

        Ok(slots
            .into_iter()
            .zip(methods)
            .map(|(slot, method)| {
                slot.unwrap_or_else(|| {
                    CallOutcome::failure(method, &BridgeError::transport("batch task aborted"))
                })
            })
            .collect())
    }
}
