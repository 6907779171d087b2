//! CLI entrypoint for gateway-bridge
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;

use anyhow::{Context, Result, anyhow, bail};
use bridge_application::{
    BatchExecutor, BridgeState, CallLogger, GatewayBridge, NoCallLogger,
};
use bridge_domain::CallSpec;
use bridge_infrastructure::{
    ConfigIssue, ConfigLoader, FileConfig, JsonlCallLogger, Severity, transport_from_config,
};
use clap::Parser;
use commands::{Cli, Command};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref());

    info!("Starting gateway-bridge");

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };

    if let Some(transport) = cli.transport {
        config.gateway.transport = transport.into();
    }

    let issues = config.validate();

    if let Command::Config = cli.command {
        return show_config(&cli, &config, &issues);
    }

    report_issues(&issues)?;

    // === Dependency Injection ===
    let bridge = Arc::new(build_bridge(&config));
    debug!("Bridge ready via {} transport", bridge.transport_name());

    let result = run(&cli.command, &bridge, cli.compact).await;

    debug!("Bridge stats: {:?}", bridge.state().stats());

    result
}

/// Initialize logging based on verbosity level.
///
/// `RUST_LOG` takes over when no `-v` flag is given. With `--log-file`,
/// diagnostics go through a non-blocking file writer.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "gateway-bridge.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();

            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();

            None
        }
    }
}

/// Log every issue; fail if any of them is an error.
fn report_issues(issues: &[ConfigIssue]) -> Result<()> {
    let mut errors = Vec::new();
    for issue in issues {
        match issue.severity {
            Severity::Warning => warn!("Config: {}", issue),
            Severity::Error => errors.push(issue.to_string()),
        }
    }

    if !errors.is_empty() {
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(())
}

fn build_bridge(config: &FileConfig) -> GatewayBridge {
    let transport = transport_from_config(&config.gateway);

    let call_logger: Arc<dyn CallLogger> = match &config.log.call_journal {
        Some(path) => match JsonlCallLogger::open(path) {
            Ok(logger) => {
                info!("Writing call journal to {}", logger.path().display());
                Arc::new(logger)
            }
            Err(e) => {
                warn!("Call journal disabled, cannot open {}: {}", path.display(), e);
                Arc::new(NoCallLogger)
            }
        },
        None => Arc::new(NoCallLogger),
    };

    GatewayBridge::new(
        transport,
        Arc::new(BridgeState::new()),
        config.bridge_settings(),
    )
    .with_call_logger(call_logger)
}

async fn run(command: &Command, bridge: &Arc<GatewayBridge>, compact: bool) -> Result<()> {
    match command {
        Command::Call {
            method,
            params,
            fallback,
        } => {
            let params = parse_params(params.as_deref())?;

            let value = if fallback.is_empty() {
                bridge.call(method, params).await?
            } else {
                let candidates: Vec<CallSpec> = std::iter::once(method)
                    .chain(fallback.iter())
                    .map(|m| CallSpec::new(m.clone(), params.clone()))
                    .collect();
                let (answered_by, value) = bridge.call_first_success(&candidates).await?;
                info!("Answered by {}", answered_by);
                value
            };

            print_json(&value, compact)
        }
        Command::Batch { input } => {
            let calls = read_batch(input)?;
            let outcomes = BatchExecutor::new(Arc::clone(bridge)).execute(calls).await?;

            let failed = outcomes.iter().filter(|o| !o.ok).count();
            if failed > 0 {
                warn!("{} of {} batch calls failed", failed, outcomes.len());
            }

            print_json(&serde_json::to_value(&outcomes)?, compact)
        }
        Command::Config => Ok(()),
    }
}

fn parse_params(raw: Option<&str>) -> Result<Value> {
    match raw {
        Some(raw) => serde_json::from_str(raw).context("--params must be valid JSON"),
        None => Ok(Value::Object(Default::default())),
    }
}

/// Read a batch from inline JSON or from `@path`.
fn read_batch(input: &str) -> Result<Vec<CallSpec>> {
    let raw = match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read batch file {}", path))?,
        None => input.to_string(),
    };

    serde_json::from_str(&raw)
        .context("batch must be a JSON array of {\"method\": ..., \"params\": ...} objects")
}

fn print_json(value: &Value, compact: bool) -> Result<()> {
    let output = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", output);
    Ok(())
}

fn show_config(cli: &Cli, config: &FileConfig, issues: &[ConfigIssue]) -> Result<()> {
    if !cli.no_config {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
        println!();
    }

    println!("Effective configuration:");
    println!("{}", toml::to_string_pretty(config)?);

    if !issues.is_empty() {
        println!("Issues:");
        for issue in issues {
            let label = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            println!("  [{}] {}", label, issue);
        }
    }

    Ok(())
}
