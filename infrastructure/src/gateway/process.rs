//! Process transport: one external command invocation per gateway call.
//!
//! Each call runs `<program> [prefix args] gateway call <method> --json
//! --timeout <ms> --params <json>` and parses the command's stdout as JSON.

use crate::gateway::error::{GatewayClientError, Result};
use async_trait::async_trait;
use bridge_application::ports::gateway_transport::GatewayTransport;
use bridge_domain::util::{EXCERPT_CHARS, decode_output, excerpt};
use bridge_domain::{BridgeError, MethodName, Params};
use serde_json::Value;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Default gateway command
pub const DEFAULT_GATEWAY_COMMAND: &str = "openclaw";

/// Default timeout handed to the gateway command (20 seconds)
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(20);

/// Extra time allowed for process teardown before the child is killed
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(3);

/// Maximum captured size of each output stream (1 MB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Settings for [`ProcessTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTransportConfig {
    /// Executable to run
    pub program: String,
    /// Arguments placed before the `gateway call ...` arguments
    pub prefix_args: Vec<String>,
    /// Per-call timeout, also passed to the command via `--timeout`
    pub timeout: Duration,
    pub grace: Duration,
    pub max_output_bytes: usize,
}

impl Default for ProcessTransportConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_GATEWAY_COMMAND.to_string(),
            prefix_args: Vec::new(),
            timeout: DEFAULT_PROCESS_TIMEOUT,
            grace: DEFAULT_KILL_GRACE,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl ProcessTransportConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix_args(mut self, args: Vec<String>) -> Self {
        self.prefix_args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }
}

/// Bytes read from one output stream, capped.
#[derive(Debug, Default)]
struct CapturedStream {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Read `reader` to EOF, keeping at most `cap` bytes.
///
/// Everything past the cap is still read and discarded so the child never
/// blocks on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    cap: usize,
) -> std::io::Result<CapturedStream> {
    let mut captured = CapturedStream::default();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(captured.bytes.len());
        if room > 0 {
            captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
        }
        if n > room {
            captured.truncated = true;
        }
    }

    Ok(captured)
}

/// Gateway transport that spawns the gateway CLI for every call.
pub struct ProcessTransport {
    config: ProcessTransportConfig,
}

impl ProcessTransport {
    pub fn new(config: ProcessTransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessTransportConfig {
        &self.config
    }

    /// Arguments following the configured prefix for one call.
    pub fn call_args(&self, method: &MethodName, params_json: &str) -> Vec<String> {
        vec![
            "gateway".to_string(),
            "call".to_string(),
            method.to_string(),
            "--json".to_string(),
            "--timeout".to_string(),
            self.config.timeout.as_millis().to_string(),
            "--params".to_string(),
            params_json.to_string(),
        ]
    }

    async fn run(&self, method: &MethodName, params: &Params) -> Result<Value> {
        let params_json = serde_json::to_string(&params.to_value())?;
        let args = self.call_args(method, &params_json);

        debug!(
            "Spawning gateway command: {} {} gateway call {}",
            self.config.program,
            self.config.prefix_args.join(" "),
            method
        );

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.prefix_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: have the kernel send SIGTERM to the child if the bridge dies.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(GatewayClientError::SpawnError)?;

        let stdout = child.stdout.take().ok_or_else(|| {
            GatewayClientError::SpawnError(std::io::Error::other("Failed to capture stdout"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            GatewayClientError::SpawnError(std::io::Error::other("Failed to capture stderr"))
        })?;

        let cap = self.config.max_output_bytes;
        let deadline = self.config.timeout + self.config.grace;

        let collected = tokio::time::timeout(deadline, async {
            let (status, out, err) = tokio::join!(
                child.wait(),
                read_capped(stdout, cap),
                read_capped(stderr, cap)
            );
            Ok::<_, std::io::Error>((status?, out?, err?))
        })
        .await;

        let (status, out, err) = match collected {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "Gateway command for '{}' exceeded {}ms, killing",
                    method,
                    deadline.as_millis()
                );
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(GatewayClientError::Timeout {
                    method: method.to_string(),
                    timeout_ms: self.config.timeout.as_millis() as u64,
                });
            }
        };

        if out.truncated || err.truncated {
            warn!(
                "Gateway command output for '{}' exceeded {} bytes and was truncated",
                method, cap
            );
        }

        let stdout = decode_output(&out.bytes);
        let stderr = excerpt(&decode_output(&err.bytes), EXCERPT_CHARS);

        if !status.success() {
            return Err(GatewayClientError::ExitStatus {
                code: status.code(),
                stderr,
            });
        }

        if stdout.is_empty() {
            return Err(GatewayClientError::EmptyOutput { stderr });
        }

        serde_json::from_str(&stdout).map_err(|e| GatewayClientError::ParseError {
            error: e.to_string(),
            raw: stdout,
        })
    }
}

#[async_trait]
impl GatewayTransport for ProcessTransport {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn call(
        &self,
        method: &MethodName,
        params: &Params,
    ) -> std::result::Result<Value, BridgeError> {
        let start = Instant::now();
        let result = self.run(method, params).await;
        debug!(
            "Gateway command for '{}' finished in {}ms",
            method,
            start.elapsed().as_millis()
        );
        result.map_err(BridgeError::from)
    }
}
