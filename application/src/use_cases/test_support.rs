//! Mock adapters shared by the use case tests.

use crate::ports::call_logger::{CallEvent, CallLogger};
use crate::ports::gateway_transport::GatewayTransport;
use async_trait::async_trait;
use bridge_domain::{BridgeError, MethodName, Params};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Transport that counts calls and answers `{"method": .., "call": n}`.
///
/// Optionally holds every call at a gate until [`open_gate`](Self::open_gate),
/// fails scripted calls, or delays specific methods.
pub struct CountingTransport {
    calls: AtomicUsize,
    gate: watch::Sender<bool>,
    scripted_failures: Mutex<VecDeque<BridgeError>>,
    failing_methods: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    last_params: Mutex<Option<Value>>,
    completed: Mutex<Vec<String>>,
}

impl CountingTransport {
    pub fn new() -> Self {
        Self::with_gate(true)
    }

    /// Calls block until the gate is opened
    pub fn gated() -> Self {
        Self::with_gate(false)
    }

    fn with_gate(open: bool) -> Self {
        let (gate, _) = watch::channel(open);
        Self {
            calls: AtomicUsize::new(0),
            gate,
            scripted_failures: Mutex::new(VecDeque::new()),
            failing_methods: Mutex::new(HashSet::new()),
            delays: Mutex::new(HashMap::new()),
            last_params: Mutex::new(None),
            completed: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    pub fn fail_next(&self, error: BridgeError) {
        self.scripted_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_method(&self, method: &str) {
        self.failing_methods.lock().unwrap().insert(method.to_string());
    }

    pub fn delay_method(&self, method: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(method.to_string(), delay);
    }

    pub fn last_params(&self) -> Option<Value> {
        self.last_params.lock().unwrap().clone()
    }

    pub fn completed_methods(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl GatewayTransport for CountingTransport {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn call(&self, method: &MethodName, params: &Params) -> Result<Value, BridgeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_params.lock().unwrap() = Some(params.to_value());

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let delay = self.delays.lock().unwrap().get(method.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.lock().unwrap().push(method.to_string());

        if let Some(error) = self.scripted_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        if self.failing_methods.lock().unwrap().contains(method.as_str()) {
            return Err(BridgeError::transport(format!("{method} failed")));
        }

        Ok(json!({ "method": method.as_str(), "call": call }))
    }
}

/// Call logger that keeps every event in memory.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<&'static str>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

impl CallLogger for RecordingLogger {
    fn log(&self, event: CallEvent) {
        self.events.lock().unwrap().push(event.event_type);
    }
}
