//! Logging infrastructure: structured call journal.
//!
//! Provides [`JsonlCallLogger`], a JSONL file writer that implements
//! the [`CallLogger`](bridge_application::CallLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlCallLogger;
