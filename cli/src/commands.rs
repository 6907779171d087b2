//! CLI command definitions

use bridge_infrastructure::TransportKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Transport override on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TransportArg {
    /// Spawn the gateway CLI once per call
    Process,
    /// Persistent WebSocket session
    Socket,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Process => TransportKind::Process,
            TransportArg::Socket => TransportKind::Socket,
        }
    }
}

/// CLI arguments for gateway-bridge
#[derive(Parser, Debug)]
#[command(name = "gateway-bridge")]
#[command(author, version, about = "Caching, coalescing RPC bridge to a control-plane gateway")]
#[command(long_about = r#"
gateway-bridge sends calls to the gateway through a process or socket
transport. Read-mostly methods are cached per method, identical concurrent
calls share one upstream call, and batches run concurrently with one
outcome per call.

Configuration files are loaded from (in priority order):
1. GATEWAY_BRIDGE_<SECTION>__<KEY>   Environment variables
2. --config <path>                   Explicit config file
3. ./bridge.toml                     Project-level config
4. ~/.config/gateway-bridge/config.toml   Global config

Example:
  gateway-bridge call status
  gateway-bridge call sessions.list --params '{"limit": 20}'
  gateway-bridge call system-presence --fallback health
  gateway-bridge --transport socket batch '[{"method":"status"},{"method":"cron.list"}]'
  gateway-bridge batch @calls.json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Override the configured transport
    #[arg(long, value_enum, global = true)]
    pub transport: Option<TransportArg>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Call one gateway method and print its result
    Call {
        /// Gateway method, e.g. `status` or `cron.list`
        method: String,

        /// Parameters as a JSON object
        #[arg(long, value_name = "JSON")]
        params: Option<String>,

        /// Methods to try in order if the previous one fails
        #[arg(long = "fallback", value_name = "METHOD")]
        fallback: Vec<String>,
    },

    /// Run a batch of calls: a JSON array of {method, params}, or @FILE
    Batch {
        /// JSON array, or `@path` to read it from a file
        #[arg(value_name = "JSON|@FILE")]
        input: String,
    },

    /// Show configuration sources and the effective configuration
    Config,
}
