//! Host-level batch scheduler

use crate::network::{HostRange, Subnet};
use crate::output::{NotificationManager, ScanEvent};
use crate::probe::ProbeExecutor;
use crate::scanner::{create_batches, ProbeTask};
use futures::future::join_all;
use std::net::Ipv4Addr;
use tokio_util::sync::CancellationToken;

/// Result of sweeping one host range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostScanOutcome {
    /// Hosts that completed a probe (each host exactly once)
    pub probed: usize,
    pub responders: usize,
    /// Responding addresses in ascending order
    pub alive: Vec<Ipv4Addr>,
    pub probe_errors: usize,
    pub batches: usize,
    /// Largest batch dispatched
    pub max_batch: usize,
    /// Set when cancellation stopped the range before its last batch
    pub cancelled: bool,
}

/// Probes a host range in strict batches: up to `limit` probes are dispatched
/// together and all of them are joined before the next batch starts.
#[derive(Clone)]
pub struct HostBatchScheduler {
    executor: ProbeExecutor,
    progress_interval: usize,
    notifier: NotificationManager,
    cancel: CancellationToken,
}

impl HostBatchScheduler {
    pub fn new(executor: ProbeExecutor, progress_interval: usize) -> Self {
        Self {
            executor,
            progress_interval: progress_interval.max(1),
            notifier: NotificationManager::disabled(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: NotificationManager) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Probe every host of `range` in `subnet` exactly once
    pub async fn scan_range(&self, subnet: Subnet, range: HostRange, limit: usize) -> HostScanOutcome {
        let hosts: Vec<u8> = range.iter().collect();
        let total = hosts.len();
        let batches = create_batches(&hosts, limit);
        let batch_count = batches.len();

        let mut outcome = HostScanOutcome::default();
        let mut next_report = self.progress_interval;

        for (index, batch) in batches.iter().enumerate() {
            if self.cancel.is_cancelled() {
                log::info!(
                    "{}: cancelled after {}/{} hosts",
                    subnet,
                    outcome.probed,
                    total
                );
                outcome.cancelled = true;
                break;
            }

            let finished = self.run_batch(subnet, batch).await;
            outcome.batches += 1;
            outcome.max_batch = outcome.max_batch.max(batch.len());

            for task in finished {
                outcome.probed += 1;
                if task.error().is_some() {
                    outcome.probe_errors += 1;
                }
                if task.is_responder() {
                    outcome.responders += 1;
                    if let Some(address) = task.address {
                        outcome.alive.push(address);
                        self.notifier.notify(ScanEvent::HostAlive {
                            address,
                            rtt: task.elapsed(),
                        });
                    }
                }
            }

            log::debug!(
                "{}: batch {}/{} joined ({} hosts, {} responders so far)",
                subnet,
                index + 1,
                batch_count,
                batch.len(),
                outcome.responders
            );

            if outcome.probed >= next_report || outcome.probed == total {
                self.notifier.notify(ScanEvent::HostProgress {
                    subnet,
                    completed: outcome.probed,
                    total,
                    responders: outcome.responders,
                });
                while next_report <= outcome.probed {
                    next_report += self.progress_interval;
                }
            }
        }

        outcome.alive.sort_unstable();
        outcome
    }

    /// Dispatch one probe per host and wait for all of them
    async fn run_batch(&self, subnet: Subnet, hosts: &[u8]) -> Vec<ProbeTask> {
        let mut finished = Vec::with_capacity(hosts.len());
        let mut dispatched = Vec::with_capacity(hosts.len());
        let mut handles = Vec::with_capacity(hosts.len());

        for &host in hosts {
            let task = ProbeTask::new(subnet, host);
            let address = match task.address {
                Some(address) if !task.is_completed() => address,
                _ => {
                    log::warn!("Skipping host {} in {}: {}", host, subnet, task.error().unwrap_or("no address"));
                    finished.push(task);
                    continue;
                }
            };

            let executor = self.executor.clone();
            dispatched.push((host, address));
            handles.push(tokio::spawn(async move {
                let outcome = executor.execute(address).await;
                task.complete(outcome)
            }));
        }

        for ((host, address), joined) in dispatched.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(task) => finished.push(task),
                Err(e) => {
                    log::error!("Probe task for {} did not complete: {}", address, e);
                    finished.push(ProbeTask::failed(host, Some(address), e.to_string()));
                }
            }
        }

        finished
    }
}
