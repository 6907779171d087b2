//! Application-level configuration.
//!
//! This module provides configuration types that control how the bridge behaves:
//!
//! - [`BridgeSettings`]: cache freshness policy and batch limits

pub mod bridge_settings;

pub use bridge_settings::BridgeSettings;
