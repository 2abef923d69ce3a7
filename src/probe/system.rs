//! Probe backed by the operating system's `ping` utility

use super::Probe;
use crate::error::ProbeError;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs `ping` once per address. Works without raw-socket privileges.
#[derive(Debug, Clone)]
pub struct SystemPingProbe {
    program: String,
}

impl Default for SystemPingProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPingProbe {
    pub fn new() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }

    /// Use a different executable, e.g. an absolute path to `ping`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for a single echo with the given reply timeout
    pub fn arguments(target: Ipv4Addr, timeout: Duration) -> Vec<String> {
        let millis = timeout.as_millis().max(1);

        #[cfg(target_os = "windows")]
        let args = vec![
            "-n".to_string(),
            "1".to_string(),
            "-w".to_string(),
            millis.to_string(),
        ];

        // BSD ping takes -W in milliseconds
        #[cfg(any(target_os = "macos", target_os = "freebsd"))]
        let args = vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            millis.to_string(),
        ];

        // iputils ping takes -W in whole seconds
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "freebsd")))]
        let args = {
            let seconds = ((millis + 999) / 1000).max(1);
            vec![
                "-c".to_string(),
                "1".to_string(),
                "-W".to_string(),
                seconds.to_string(),
            ]
        };

        let mut args = args;
        args.push(target.to_string());
        args
    }
}

/// Map a `ping` exit code to a reply. `None` means the exit code signals a
/// failure of the utility itself rather than a silent host.
pub fn reply_from_exit_code(code: Option<i32>) -> Option<bool> {
    match code {
        Some(0) => Some(true),
        // No reply, or killed by a signal
        Some(1) | None => Some(false),
        // BSD ping: sent, but no reply
        #[cfg(any(target_os = "macos", target_os = "freebsd"))]
        Some(2) => Some(false),
        Some(_) => None,
    }
}

#[async_trait::async_trait]
impl Probe for SystemPingProbe {
    async fn probe(&self, target: Ipv4Addr, timeout: Duration) -> Result<bool, ProbeError> {
        let status = Command::new(&self.program)
            .args(Self::arguments(target, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| ProbeError::Command(format!("{} could not be started: {}", self.program, e)))?;

        reply_from_exit_code(status.code()).ok_or_else(|| {
            ProbeError::Command(format!(
                "{} exited with status {} for {}",
                self.program,
                status.code().unwrap_or_default(),
                target
            ))
        })
    }

    fn name(&self) -> &str {
        "system-ping"
    }
}
