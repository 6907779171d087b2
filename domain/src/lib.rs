//! Domain layer for gateway-bridge
//!
//! This crate contains the value types the bridge reasons about.
//! It has no dependencies on transports, runtimes or configuration files.
//!
//! # Core Concepts
//!
//! - **Method / Params**: an upstream operation name and its keyed parameters.
//!   Parameters canonicalize to a sorted-key string so equal requests are
//!   recognized regardless of key order.
//! - **Cache Key**: method + canonical parameters; identifies both cache
//!   entries and in-flight calls.
//! - **TTL Policy**: per-method freshness windows. Methods outside the
//!   table are never cached.
//! - **Batch**: ordered calls with one independent outcome per position.

pub mod batch;
pub mod cache;
pub mod core;
pub mod util;

// Re-export commonly used types
pub use batch::{CallOutcome, CallSpec, DEFAULT_MAX_BATCH_CALLS};
pub use cache::{key::CacheKey, ttl_policy::TtlPolicy};
pub use crate::core::{error::BridgeError, method::MethodName, params::Params};
