//! Scanner module: two-level batch scheduling and result aggregation
//!
//! A phase is a list of subnets. The [`SweepEngine`] splits it into subnet
//! batches, runs one [`SubnetScanCoordinator`] per subnet, and joins the batch
//! before starting the next. Each coordinator drives a [`HostBatchScheduler`]
//! which does the same one level down with individual probes.

pub mod engine;
pub mod host;
pub mod limits;
pub mod stats;
pub mod subnet;

use crate::network::{HostRange, Subnet};
use crate::probe::ProbeOutcome;
use crate::scanner::stats::AggregateSnapshot;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

pub use engine::SweepEngine;
pub use host::{HostBatchScheduler, HostScanOutcome};
pub use limits::ConcurrencyLimits;
pub use stats::AggregationContext;
pub use subnet::SubnetScanCoordinator;

/// One probe of one host.
///
/// A task is created by the host scheduler, moved into exactly one probe, and
/// handed back completed. Its result is only read after the batch joined.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeTask {
    pub host: u8,
    pub address: Option<Ipv4Addr>,
    reachable: Option<bool>,
    elapsed: Duration,
    error: Option<String>,
    completed: bool,
}

impl ProbeTask {
    /// Create a pending task. An address that cannot be formed yields a task
    /// that is already completed and unreachable.
    pub fn new(subnet: Subnet, host: u8) -> Self {
        match subnet.host(host) {
            Ok(address) => Self {
                host,
                address: Some(address),
                reachable: None,
                elapsed: Duration::ZERO,
                error: None,
                completed: false,
            },
            Err(e) => Self::failed(host, None, e.to_string()),
        }
    }

    /// A completed, unreachable task carrying an error
    pub fn failed(host: u8, address: Option<Ipv4Addr>, error: String) -> Self {
        Self {
            host,
            address,
            reachable: Some(false),
            elapsed: Duration::ZERO,
            error: Some(error),
            completed: true,
        }
    }

    /// Record the probe result. Consumes the task so it cannot be completed twice.
    pub fn complete(self, outcome: ProbeOutcome) -> Self {
        Self {
            reachable: Some(outcome.reachable),
            elapsed: outcome.elapsed,
            error: outcome.error,
            completed: true,
            ..self
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Unset until the task completes
    pub fn reachable(&self) -> Option<bool> {
        self.reachable
    }

    pub fn is_responder(&self) -> bool {
        self.completed && self.reachable == Some(true)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// One subnet's unit of work, owned by a single coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct SubnetTask {
    pub id: usize,
    pub label: String,
    pub subnet: Subnet,
    pub range: HostRange,
    responders: Option<usize>,
    alive: Vec<Ipv4Addr>,
    hosts_probed: usize,
    elapsed: Duration,
    cancelled: bool,
}

impl SubnetTask {
    pub fn new(id: usize, label: impl Into<String>, subnet: Subnet, range: HostRange) -> Self {
        Self {
            id,
            label: label.into(),
            subnet,
            range,
            responders: None,
            alive: Vec::new(),
            hosts_probed: 0,
            elapsed: Duration::ZERO,
            cancelled: false,
        }
    }

    /// Store the host scan result. Written once, at the end of the coordinator's run.
    pub fn finish(&mut self, outcome: HostScanOutcome, elapsed: Duration) {
        self.responders = Some(outcome.responders);
        self.hosts_probed = outcome.probed;
        self.alive = outcome.alive;
        self.cancelled = outcome.cancelled;
        self.elapsed = elapsed;
    }

    /// `None` until the coordinator has finished
    pub fn responders(&self) -> Option<usize> {
        self.responders
    }

    pub fn into_report(self) -> SubnetReport {
        SubnetReport {
            subnet: self.subnet,
            range: self.range,
            hosts_probed: self.hosts_probed,
            responders: self.responders.unwrap_or(0),
            alive: self.alive,
            elapsed: self.elapsed,
            cancelled: self.cancelled,
            error: None,
        }
    }
}

/// Per-subnet summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetReport {
    pub subnet: Subnet,
    pub range: HostRange,
    pub hosts_probed: usize,
    pub responders: usize,
    pub alive: Vec<Ipv4Addr>,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub error: Option<String>,
}

impl SubnetReport {
    /// Zero-responder result for a subnet whose coordinator did not finish
    pub fn failed(subnet: Subnet, range: HostRange, error: String) -> Self {
        Self {
            subnet,
            range,
            hosts_probed: 0,
            responders: 0,
            alive: Vec::new(),
            elapsed: Duration::ZERO,
            cancelled: false,
            error: Some(error),
        }
    }
}

/// Result of one campaign phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub label: String,
    pub subnets: Vec<SubnetReport>,
    pub totals: AggregateSnapshot,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl PhaseReport {
    pub fn responders(&self) -> impl Iterator<Item = &Ipv4Addr> {
        self.subnets.iter().flat_map(|s| s.alive.iter())
    }
}

/// Split items into consecutive batches of at most `batch_size`.
///
/// Every batch is non-empty; only the last one may be short.
pub fn create_batches<T: Clone>(items: &[T], batch_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
