//! Subnet-level batch scheduler

use crate::config::SweepConfig;
use crate::network::{HostRange, Subnet};
use crate::output::{NotificationManager, ScanEvent};
use crate::probe::{Probe, ProbeExecutor};
use crate::scanner::limits::ConcurrencyLimits;
use crate::scanner::stats::AggregationContext;
use crate::scanner::{
    create_batches, HostBatchScheduler, PhaseReport, SubnetReport, SubnetScanCoordinator, SubnetTask,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Main sweep engine
///
/// Runs subnets in batches of `limits.subnet`, each subnet probing hosts in
/// batches of `limits.host`. Every batch is joined before the next one starts,
/// so at most `limits.max_in_flight()` probes exist at any time.
#[derive(Clone)]
pub struct SweepEngine {
    executor: ProbeExecutor,
    limits: ConcurrencyLimits,
    progress_interval: usize,
    notifier: NotificationManager,
    cancel: CancellationToken,
}

impl SweepEngine {
    /// Create a new engine with the given configuration and probe backend
    pub fn new(config: &SweepConfig, probe: Arc<dyn Probe>) -> crate::Result<Self> {
        config.validate()?;

        Ok(Self {
            executor: ProbeExecutor::new(probe, config.timeout_duration()),
            limits: ConcurrencyLimits::from_config(config),
            progress_interval: config.progress_interval,
            notifier: NotificationManager::disabled(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_limits(mut self, limits: ConcurrencyLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_notifier(mut self, notifier: NotificationManager) -> Self {
        self.notifier = notifier;
        self
    }

    /// Stop starting new batches once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn limits(&self) -> ConcurrencyLimits {
        self.limits
    }

    pub fn notifier(&self) -> &NotificationManager {
        &self.notifier
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn probe_name(&self) -> &str {
        self.executor.probe_name()
    }

    /// Sweep `range` in every subnet, one phase.
    ///
    /// Never fails: a subnet whose coordinator dies is reported with zero
    /// responders and the phase moves on.
    pub async fn scan_subnets(&self, label: &str, subnets: &[Subnet], range: HostRange) -> PhaseReport {
        let started = Instant::now();
        let stats = Arc::new(AggregationContext::new());

        let scheduler = HostBatchScheduler::new(self.executor.clone(), self.progress_interval)
            .with_notifier(self.notifier.clone())
            .with_cancellation(self.cancel.clone());
        let coordinator = SubnetScanCoordinator::new(scheduler, self.limits, stats.clone(), self.notifier.clone());

        let batches = create_batches(subnets, self.limits.subnet);
        let batch_count = batches.len();

        log::info!(
            "[{}] {} subnets in {} batches ({} subnets x {} hosts in flight)",
            label,
            subnets.len(),
            batch_count,
            self.limits.subnet,
            self.limits.host
        );
        self.notifier.notify(ScanEvent::PhaseStarted {
            label: label.to_string(),
            subnets: subnets.len(),
            host_limit: self.limits.host_limit_for(range),
            subnet_limit: self.limits.subnet,
        });

        let mut reports = Vec::with_capacity(subnets.len());
        let mut cancelled = false;

        for (index, batch) in batches.iter().enumerate() {
            if self.cancel.is_cancelled() {
                log::warn!(
                    "[{}] cancelled, skipping {} remaining subnets",
                    label,
                    subnets.len() - reports.len()
                );
                cancelled = true;
                break;
            }

            let handles: Vec<_> = batch
                .iter()
                .enumerate()
                .map(|(offset, &subnet)| {
                    let task = SubnetTask::new(reports.len() + offset, label, subnet, range);
                    let coordinator = coordinator.clone();
                    tokio::spawn(async move { coordinator.run(task).await })
                })
                .collect();

            for (subnet, joined) in batch.iter().zip(join_all(handles).await) {
                match joined {
                    Ok(task) => {
                        let report = task.into_report();
                        cancelled |= report.cancelled;
                        reports.push(report);
                    }
                    Err(e) => {
                        log::error!("[{}] coordinator for {} did not finish: {}", label, subnet, e);
                        stats.record_failed_subnet();
                        self.notifier.notify(ScanEvent::SubnetFailed {
                            subnet: *subnet,
                            error: e.to_string(),
                        });
                        reports.push(SubnetReport::failed(*subnet, range, e.to_string()));
                    }
                }
            }

            log::debug!("[{}] batch {}/{} joined", label, index + 1, batch_count);
            self.notifier.notify(ScanEvent::BatchCompleted {
                phase: label.to_string(),
                batch: index + 1,
                batches: batch_count,
                subnets_done: reports.len(),
                subnets_total: subnets.len(),
            });
        }

        let totals = stats.snapshot();
        let elapsed = started.elapsed();
        self.notifier.notify(ScanEvent::PhaseCompleted {
            label: label.to_string(),
            totals,
            elapsed,
        });

        PhaseReport {
            label: label.to_string(),
            subnets: reports,
            totals,
            elapsed,
            cancelled,
        }
    }
}
