//! Reachability probing
//!
//! A probe is one ICMP echo sent through the system `ping` binary. Every
//! outcome, including spawn errors and hung children, is reported as a
//! [`ProbeResult`]; nothing is propagated to the caller.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{error, trace, warn};

/// Extra time granted to the `ping` child on top of its own deadline before
/// it is considered hung and killed
pub const PROBE_GRACE: Duration = Duration::from_secs(1);

/// Diagnostic reported when the probe deadline expires
pub const TIMEOUT_DIAGNOSTIC: &str = "timeout";

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub host: String,
    pub success: bool,

    /// Short failure reason, empty on success
    #[serde(default)]
    pub diagnostic: String,

    /// Exit code of the probe command, -1 if it never exited on its own
    pub exit_code: i32,
}

impl ProbeResult {
    pub fn reachable(host: impl ToString) -> Self {
        Self {
            host: host.to_string(),
            success: true,
            diagnostic: String::new(),
            exit_code: 0,
        }
    }

    pub fn unreachable(host: impl ToString, diagnostic: impl ToString) -> Self {
        Self {
            host: host.to_string(),
            success: false,
            diagnostic: diagnostic.to_string(),
            exit_code: -1,
        }
    }
}

/// Issues reachability checks
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `host` once, giving up after `timeout_secs` (plus [`PROBE_GRACE`])
    async fn probe(&self, host: &str, timeout_secs: u64) -> ProbeResult;
}

/// [`Prober`] backed by the system `ping` command
#[derive(Debug, Clone)]
pub struct PingProber {
    program: String,
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new()
    }
}

impl PingProber {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    /// Use a different executable with ping-compatible arguments
    pub fn with_program(program: impl ToString) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn args(host: &str, timeout_secs: u64) -> Vec<String> {
        if cfg!(target_os = "windows") {
            vec![
                "-n".to_string(),
                "1".to_string(),
                "-w".to_string(),
                timeout_secs.saturating_mul(1000).to_string(),
                host.to_string(),
            ]
        } else {
            vec![
                "-c".to_string(),
                "1".to_string(),
                "-W".to_string(),
                timeout_secs.to_string(),
                host.to_string(),
            ]
        }
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, host: &str, timeout_secs: u64) -> ProbeResult {
        trace!("pinging {host} (timeout {timeout_secs}s)");

        let spawned = Command::new(&self.program)
            .args(Self::args(host, timeout_secs))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                error!("ping failed for {host}: {e}");
                return ProbeResult::unreachable(host, e);
            }
        };

        let deadline = Duration::from_secs(timeout_secs).saturating_add(PROBE_GRACE);
        let waited = tokio::time::timeout(deadline, child.wait()).await;

        match waited {
            Ok(Ok(status)) if status.success() => ProbeResult::reachable(host),
            Ok(Ok(status)) => {
                let exit_code = status.code().unwrap_or(-1);
                trace!("ping to {host} exited with {exit_code}");
                ProbeResult {
                    exit_code,
                    ..ProbeResult::unreachable(host, format!("no reply (exit code {exit_code})"))
                }
            }
            Ok(Err(e)) => {
                error!("ping failed for {host}: {e}");
                ProbeResult::unreachable(host, e)
            }
            Err(_) => {
                warn!("ping timeout for {host}");
                if let Err(e) = child.kill().await {
                    warn!("failed to kill hung ping for {host}: {e}");
                }
                ProbeResult::unreachable(host, TIMEOUT_DIAGNOSTIC)
            }
        }
    }
}
