//! Scan campaigns: predefined subnet lists run as sequential phases

pub mod tables;

use crate::error::{SweepError, SweepResult};
use crate::network::{HostRange, Subnet};
use crate::output::{throughput, ScanEvent};
use crate::scanner::stats::AggregateSnapshot;
use crate::scanner::{PhaseReport, SweepEngine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::Instant;

pub use tables::{full_sweep, CLASS_A_COMMON, CLASS_B_COMMON, CLASS_C_COMMON, FULL_SWEEP_BASE, QUICK_SCAN};

/// What a campaign sweeps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignMode {
    /// Common class C, B and A private subnets, one phase each
    Common,
    /// All 256 /24 subnets under a /16
    Full { base: [u8; 2] },
    /// One subnet with a caller-chosen host range
    Single { subnet: Subnet, range: HostRange },
    /// A few likely subnets
    Quick,
    /// Caller-supplied subnet list
    Custom {
        label: String,
        subnets: Vec<Subnet>,
        range: HostRange,
    },
}

impl CampaignMode {
    /// Build a single-subnet campaign from raw input, validating it first
    pub fn single(subnet: &str, start: u8, end: u8) -> SweepResult<Self> {
        Ok(CampaignMode::Single {
            subnet: subnet.parse()?,
            range: HostRange::new(start, end)?,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            CampaignMode::Common => "common",
            CampaignMode::Full { .. } => "full",
            CampaignMode::Single { .. } => "single",
            CampaignMode::Quick => "quick",
            CampaignMode::Custom { .. } => "custom",
        }
    }

    /// Expand the mode into its phases
    pub fn phases(&self) -> SweepResult<Vec<CampaignPhase>> {
        let phases = match self {
            CampaignMode::Common => vec![
                CampaignPhase::new("Class C (192.168.x.x)", CLASS_C_COMMON.to_vec(), HostRange::FULL),
                CampaignPhase::new("Class B (172.16-31.x.x)", CLASS_B_COMMON.to_vec(), HostRange::FULL),
                CampaignPhase::new("Class A (10.x.x.x)", CLASS_A_COMMON.to_vec(), HostRange::FULL),
            ],
            CampaignMode::Full { base } => vec![CampaignPhase::new(
                format!("Full sweep ({}.{}.0-255.x)", base[0], base[1]),
                full_sweep(*base),
                HostRange::FULL,
            )],
            CampaignMode::Single { subnet, range } => vec![CampaignPhase::new(
                format!("Single subnet ({}.x hosts {})", subnet, range),
                vec![*subnet],
                *range,
            )],
            CampaignMode::Quick => vec![CampaignPhase::new("Quick scan", QUICK_SCAN.to_vec(), HostRange::FULL)],
            CampaignMode::Custom { label, subnets, range } => {
                if subnets.is_empty() {
                    return Err(SweepError::ConfigError("Custom campaign has no subnets".to_string()));
                }
                vec![CampaignPhase::new(label.clone(), subnets.clone(), *range)]
            }
        };
        Ok(phases)
    }
}

/// One subnet list swept with one host range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignPhase {
    pub label: String,
    pub subnets: Vec<Subnet>,
    pub range: HostRange,
}

impl CampaignPhase {
    pub fn new(label: impl Into<String>, subnets: Vec<Subnet>, range: HostRange) -> Self {
        Self {
            label: label.into(),
            subnets,
            range,
        }
    }

    /// Hosts this phase will probe if it runs to completion
    pub fn planned_hosts(&self) -> usize {
        self.subnets.len() * self.range.len()
    }
}

/// Final result of a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReport {
    pub mode: String,
    pub probe: String,
    pub started_at: DateTime<Utc>,
    pub phases: Vec<PhaseReport>,
    pub totals: AggregateSnapshot,
    pub elapsed: Duration,
    pub hosts_per_second: f64,
    pub cancelled: bool,
}

impl CampaignReport {
    /// Every responding address across all phases
    pub fn responders(&self) -> Vec<Ipv4Addr> {
        self.phases.iter().flat_map(|p| p.responders().copied()).collect()
    }
}

/// Runs campaign phases one after another on a shared engine
pub struct CampaignDriver {
    engine: SweepEngine,
}

impl CampaignDriver {
    pub fn new(engine: SweepEngine) -> Self {
        Self { engine }
    }

    /// Validate the mode, then sweep all of its phases.
    ///
    /// Only validation can fail; once the first phase starts the campaign
    /// always finishes with a (possibly degraded) report.
    pub async fn run(&self, mode: &CampaignMode) -> SweepResult<CampaignReport> {
        let phases = mode.phases()?;
        Ok(self.run_phases(mode.name(), phases).await)
    }

    /// Single subnet from raw CLI-style input
    pub async fn run_single(&self, subnet: &str, start: u8, end: u8) -> SweepResult<CampaignReport> {
        let mode = CampaignMode::single(subnet, start, end)?;
        self.run(&mode).await
    }

    /// Sweep phases sequentially. Counters start from zero for every phase.
    pub async fn run_phases(&self, name: &str, phases: Vec<CampaignPhase>) -> CampaignReport {
        let started_at = Utc::now();
        let started = Instant::now();
        let notifier = self.engine.notifier();

        log::info!(
            "Campaign '{}': {} phases, {} hosts planned, probe: {}",
            name,
            phases.len(),
            phases.iter().map(CampaignPhase::planned_hosts).sum::<usize>(),
            self.engine.probe_name()
        );
        notifier.notify(ScanEvent::CampaignStarted {
            phases: phases.len(),
            probe: self.engine.probe_name().to_string(),
        });

        let mut reports = Vec::with_capacity(phases.len());
        let mut totals = AggregateSnapshot::default();
        let mut cancelled = false;

        for phase in &phases {
            if self.engine.cancellation_token().is_cancelled() {
                log::warn!("Campaign '{}' cancelled before phase '{}'", name, phase.label);
                cancelled = true;
                break;
            }

            let report = self
                .engine
                .scan_subnets(&phase.label, &phase.subnets, phase.range)
                .await;
            totals += report.totals;
            cancelled |= report.cancelled;
            reports.push(report);
        }

        let elapsed = started.elapsed();
        let hosts_per_second = throughput(totals.hosts_scanned, elapsed);

        log::info!(
            "Campaign '{}' finished: {} hosts, {} responders in {:.2}s ({:.1} hosts/s)",
            name,
            totals.hosts_scanned,
            totals.responders,
            elapsed.as_secs_f64(),
            hosts_per_second
        );
        notifier.notify(ScanEvent::CampaignCompleted {
            totals,
            elapsed,
            hosts_per_second,
            cancelled,
        });

        CampaignReport {
            mode: name.to_string(),
            probe: self.engine.probe_name().to_string(),
            started_at,
            phases: reports,
            totals,
            elapsed,
            hosts_per_second,
            cancelled,
        }
    }
}
