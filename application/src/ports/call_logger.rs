//! Port for the structured call journal.
//!
//! Defines the [`CallLogger`] trait for recording one machine-readable event
//! per bridge decision (cache hit, coalesced join, upstream call, rejected
//! batch).
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port produces a record that can be
//! replayed to see how much upstream traffic the cache actually saved.

use serde_json::Value;

/// A structured call event for logging.
pub struct CallEvent {
    /// Event type identifier (e.g., "cache_hit", "upstream_call").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl CallEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging call events to a structured journal.
///
/// `log` is synchronous and non-fallible; journal failures must never affect
/// the outcome of a call.
pub trait CallLogger: Send + Sync {
    /// Record a call event.
    fn log(&self, event: CallEvent);
}

/// No-op implementation for tests and when the journal is disabled.
pub struct NoCallLogger;

impl CallLogger for NoCallLogger {
    fn log(&self, _event: CallEvent) {}
}
