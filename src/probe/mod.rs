//! Reachability probes
//!
//! A [`Probe`] answers one question for one address: did it reply within the
//! timeout? [`ProbeExecutor`] wraps any probe with a hard deadline and turns
//! every failure into an unreachable outcome, so a single bad probe can never
//! take down the batch it belongs to.

pub mod icmp;
pub mod system;

use crate::error::{ProbeError, SweepError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub use icmp::IcmpProbe;
pub use system::SystemPingProbe;

/// Extra time allowed on top of the probe timeout before the executor gives up.
/// Covers process spawn and socket setup.
pub const DEADLINE_GRACE: Duration = Duration::from_millis(200);

/// One reachability check against one address
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Returns `Ok(true)` when the address answered within `timeout`
    async fn probe(&self, target: Ipv4Addr, timeout: Duration) -> Result<bool, ProbeError>;

    fn name(&self) -> &str;
}

/// Result of a single executed probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub reachable: bool,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn reachable(elapsed: Duration) -> Self {
        Self {
            reachable: true,
            elapsed,
            error: None,
        }
    }

    pub fn unreachable(elapsed: Duration, error: Option<String>) -> Self {
        Self {
            reachable: false,
            elapsed,
            error,
        }
    }
}

/// Runs probes under a fixed deadline and never fails
#[derive(Clone)]
pub struct ProbeExecutor {
    probe: Arc<dyn Probe>,
    timeout: Duration,
}

impl ProbeExecutor {
    pub fn new(probe: Arc<dyn Probe>, timeout: Duration) -> Self {
        Self { probe, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn probe_name(&self) -> &str {
        self.probe.name()
    }

    /// Probe one address exactly once
    pub async fn execute(&self, target: Ipv4Addr) -> ProbeOutcome {
        let start = Instant::now();
        let deadline = self.timeout + DEADLINE_GRACE;

        match tokio::time::timeout(deadline, self.probe.probe(target, self.timeout)).await {
            Ok(Ok(true)) => ProbeOutcome::reachable(start.elapsed()),
            Ok(Ok(false)) => ProbeOutcome::unreachable(start.elapsed(), None),
            Ok(Err(e)) => {
                log::debug!("Probe of {} via {} failed: {}", target, self.probe.name(), e);
                ProbeOutcome::unreachable(start.elapsed(), Some(e.to_string()))
            }
            Err(_) => {
                log::trace!("Probe of {} hit the {:?} deadline", target, deadline);
                ProbeOutcome::unreachable(start.elapsed(), None)
            }
        }
    }
}

/// Probe implementation selected when a campaign is composed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeBackend {
    /// Native ICMP when raw sockets are available, system ping otherwise
    #[default]
    Auto,
    /// Raw-socket ICMP echo
    Icmp,
    /// The operating system's `ping` utility
    System,
}

impl ProbeBackend {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeBackend::Auto => "auto",
            ProbeBackend::Icmp => "icmp",
            ProbeBackend::System => "system",
        }
    }

    /// Instantiate the backend
    pub fn build(&self) -> crate::Result<Arc<dyn Probe>> {
        match self {
            ProbeBackend::Icmp => Ok(Arc::new(IcmpProbe::new()?)),
            ProbeBackend::System => Ok(Arc::new(SystemPingProbe::new())),
            ProbeBackend::Auto => match IcmpProbe::new() {
                Ok(probe) => {
                    log::info!("Raw ICMP socket available, using native echo probes");
                    Ok(Arc::new(probe))
                }
                Err(e) => {
                    log::warn!("Raw ICMP unavailable ({}). Falling back to system ping.", e);
                    Ok(Arc::new(SystemPingProbe::new()))
                }
            },
        }
    }
}

impl fmt::Display for ProbeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProbeBackend {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ProbeBackend::Auto),
            "icmp" | "native" => Ok(ProbeBackend::Icmp),
            "system" | "ping" => Ok(ProbeBackend::System),
            other => Err(SweepError::ConfigError(format!("Unknown probe backend: {}", other))),
        }
    }
}
