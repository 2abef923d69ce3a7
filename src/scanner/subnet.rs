//! Subnet scan coordinator

use crate::output::{NotificationManager, ScanEvent};
use crate::scanner::limits::ConcurrencyLimits;
use crate::scanner::stats::AggregationContext;
use crate::scanner::{HostBatchScheduler, SubnetTask};
use std::sync::Arc;
use tokio::time::Instant;

/// Owns the sweep of one subnet from start notification to summary
#[derive(Clone)]
pub struct SubnetScanCoordinator {
    scheduler: HostBatchScheduler,
    limits: ConcurrencyLimits,
    stats: Arc<AggregationContext>,
    notifier: NotificationManager,
}

impl SubnetScanCoordinator {
    pub fn new(
        scheduler: HostBatchScheduler,
        limits: ConcurrencyLimits,
        stats: Arc<AggregationContext>,
        notifier: NotificationManager,
    ) -> Self {
        Self {
            scheduler,
            limits,
            stats,
            notifier,
        }
    }

    /// Sweep the task's range and hand the completed task back.
    ///
    /// The phase counters are updated only after the last host batch joined.
    pub async fn run(&self, mut task: SubnetTask) -> SubnetTask {
        let started = Instant::now();
        let host_limit = self.limits.host_limit_for(task.range);

        log::info!(
            "[{}] scanning {}.x hosts {} with {} concurrent probes",
            task.label,
            task.subnet,
            task.range,
            host_limit
        );
        self.notifier.notify(ScanEvent::SubnetStarted {
            phase: task.label.clone(),
            subnet: task.subnet,
            range: task.range,
        });

        let outcome = self.scheduler.scan_range(task.subnet, task.range, host_limit).await;

        let (probed, responders, errors, cancelled) =
            (outcome.probed, outcome.responders, outcome.probe_errors, outcome.cancelled);
        task.finish(outcome, started.elapsed());

        self.stats
            .record_subnet(probed as u64, responders as u64, errors as u64);

        if responders == 0 {
            log::info!("[{}] {}: no responders", task.label, task.subnet);
        } else {
            log::info!("[{}] {}: {} responders", task.label, task.subnet, responders);
        }
        self.notifier.notify(ScanEvent::SubnetCompleted {
            subnet: task.subnet,
            hosts: probed,
            responders,
            cancelled,
        });

        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::network::{HostRange, Subnet};
    use crate::probe::{Probe, ProbeExecutor};
    use std::net::Ipv4Addr;
    use std::time::Duration;

    struct Silent;

    #[async_trait::async_trait]
    impl Probe for Silent {
        async fn probe(&self, _target: Ipv4Addr, _timeout: Duration) -> Result<bool, ProbeError> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "silent"
        }
    }

    #[tokio::test]
    async fn test_zero_responder_subnet() {
        let notifier = NotificationManager::default();
        let mut rx = notifier.subscribe();
        let stats = Arc::new(AggregationContext::new());
        let executor = ProbeExecutor::new(Arc::new(Silent), Duration::from_millis(50));
        let coordinator = SubnetScanCoordinator::new(
            HostBatchScheduler::new(executor, 50),
            ConcurrencyLimits::new(16, 1),
            stats.clone(),
            notifier,
        );

        let task = SubnetTask::new(0, "test", Subnet::new(192, 168, 50), HostRange::new(1, 40).unwrap());
        let task = coordinator.run(task).await;

        assert_eq!(task.responders(), Some(0));
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hosts_scanned, 40);
        assert_eq!(snapshot.responders, 0);
        assert_eq!(snapshot.subnets_scanned, 1);

        let mut summary = None;
        while let Ok(event) = rx.try_recv() {
            if let ScanEvent::SubnetCompleted { responders, hosts, .. } = event {
                summary = Some((hosts, responders));
            }
        }
        assert_eq!(summary, Some((40, 0)));
    }
}
