//! Configuration file loading for gateway-bridge
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `GATEWAY_BRIDGE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./bridge.toml` or `./.bridge.toml`
//! 4. Global: `$XDG_CONFIG_HOME/gateway-bridge/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileBatchConfig, FileCacheConfig, FileConfig, FileGatewayConfig, FileLogConfig,
    Severity, TransportKind,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
