//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the settings types the
//! application and gateway adapters consume.

mod cache;
mod gateway;

pub use cache::FileCacheConfig;
pub use gateway::{FileGatewayConfig, TransportKind};

use bridge_application::BridgeSettings;
use bridge_domain::DEFAULT_MAX_BATCH_CALLS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// How to reach the gateway
    pub gateway: FileGatewayConfig,
    /// Response cache TTLs
    pub cache: FileCacheConfig,
    pub batch: FileBatchConfig,
    pub log: FileLogConfig,
}

/// Raw batch configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBatchConfig {
    /// Maximum number of calls per batch
    pub max_calls: usize,
}

impl Default for FileBatchConfig {
    fn default() -> Self {
        Self {
            max_calls: DEFAULT_MAX_BATCH_CALLS,
        }
    }
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLogConfig {
    /// Path of the JSONL call journal; no journal when unset
    pub call_journal: Option<PathBuf>,
}

/// How serious a configuration issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The configuration cannot work.
    Error,
    /// Works, but probably not as intended.
    Warning,
}

/// A detected problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted path of the offending key
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let gateway = &self.gateway;

        match gateway.transport {
            TransportKind::Socket => {
                let url = gateway.url.trim();
                if url.is_empty() {
                    issues.push(ConfigIssue::error(
                        "gateway.url",
                        "socket transport requires a gateway URL",
                    ));
                } else if url.starts_with("wss://") {
                    issues.push(ConfigIssue::error(
                        "gateway.url",
                        format!("'{}' needs TLS, which this build does not support", url),
                    ));
                } else if !url.starts_with("ws://") {
                    issues.push(ConfigIssue::error(
                        "gateway.url",
                        format!("'{}' is not a ws:// URL", url),
                    ));
                }
            }
            TransportKind::Process => {
                if gateway.command.trim().is_empty() {
                    issues.push(ConfigIssue::error(
                        "gateway.command",
                        "process transport requires a command",
                    ));
                }
            }
        }

        if gateway.call_timeout_ms == Some(0) {
            issues.push(ConfigIssue::error(
                "gateway.call_timeout_ms",
                "timeout cannot be 0",
            ));
        }

        if gateway.handshake_timeout_ms == Some(0) {
            issues.push(ConfigIssue::error(
                "gateway.handshake_timeout_ms",
                "timeout cannot be 0",
            ));
        }

        if gateway.max_output_bytes == 0 {
            issues.push(ConfigIssue::error(
                "gateway.max_output_bytes",
                "output cap cannot be 0",
            ));
        }

        if self.batch.max_calls == 0 {
            issues.push(ConfigIssue::error(
                "batch.max_calls",
                "batch cap cannot be 0",
            ));
        }

        if self.cache.enabled && self.cache.ttl_ms.values().all(|ms| *ms == 0) {
            issues.push(ConfigIssue::warning(
                "cache.ttl_ms",
                "cache is enabled but no method has a TTL",
            ));
        }

        if gateway.transport == TransportKind::Process && gateway.token.is_some() {
            issues.push(ConfigIssue::warning(
                "gateway.token",
                "token is only used by the socket transport",
            ));
        }

        issues
    }

    /// Caching and batching settings for the bridge
    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings::default()
            .with_ttl_policy(self.cache.to_ttl_policy())
            .with_max_batch_calls(self.batch.max_calls)
    }
}
