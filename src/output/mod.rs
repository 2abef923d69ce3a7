//! Progress events and report rendering

pub mod console;

use crate::network::{HostRange, Subnet};
use crate::scanner::stats::AggregateSnapshot;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::broadcast;

pub use console::ConsoleReporter;

/// Default number of buffered events per subscriber
pub const EVENT_BUFFER: usize = 1024;

/// Events emitted by the schedulers and the campaign driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScanEvent {
    CampaignStarted {
        phases: usize,
        probe: String,
    },
    PhaseStarted {
        label: String,
        subnets: usize,
        host_limit: usize,
        subnet_limit: usize,
    },
    SubnetStarted {
        phase: String,
        subnet: Subnet,
        range: HostRange,
    },
    HostProgress {
        subnet: Subnet,
        completed: usize,
        total: usize,
        responders: usize,
    },
    HostAlive {
        address: Ipv4Addr,
        rtt: Duration,
    },
    SubnetCompleted {
        subnet: Subnet,
        hosts: usize,
        responders: usize,
        cancelled: bool,
    },
    SubnetFailed {
        subnet: Subnet,
        error: String,
    },
    BatchCompleted {
        phase: String,
        batch: usize,
        batches: usize,
        subnets_done: usize,
        subnets_total: usize,
    },
    PhaseCompleted {
        label: String,
        totals: AggregateSnapshot,
        elapsed: Duration,
    },
    CampaignCompleted {
        totals: AggregateSnapshot,
        elapsed: Duration,
        hosts_per_second: f64,
        cancelled: bool,
    },
}

/// Fan-out of scan events to any number of subscribers.
///
/// Sending never blocks and never fails; with no subscriber the event is dropped.
#[derive(Debug, Clone)]
pub struct NotificationManager {
    sender: broadcast::Sender<ScanEvent>,
    enabled: bool,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new(EVENT_BUFFER)
    }
}

impl NotificationManager {
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self {
            sender,
            enabled: true,
        }
    }

    /// A manager that swallows every event
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(1)
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.sender.subscribe()
    }

    pub fn notify(&self, event: ScanEvent) {
        if self.enabled {
            let _ = self.sender.send(event);
        }
    }
}

/// Hosts per second, zero when no time has elapsed
pub fn throughput(hosts: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        hosts as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput_guards_zero_elapsed() {
        assert_eq!(throughput(254, Duration::ZERO), 0.0);
        assert_eq!(throughput(100, Duration::from_secs(4)), 25.0);
    }

    #[tokio::test]
    async fn test_notifications_reach_subscribers() {
        let notifier = NotificationManager::default();
        let mut rx = notifier.subscribe();

        notifier.notify(ScanEvent::HostAlive {
            address: Ipv4Addr::new(10, 0, 0, 1),
            rtt: Duration::from_millis(3),
        });

        match rx.recv().await.unwrap() {
            ScanEvent::HostAlive { address, .. } => assert_eq!(address, Ipv4Addr::new(10, 0, 0, 1)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_disabled_manager_drops_events() {
        let notifier = NotificationManager::disabled();
        let mut rx = notifier.subscribe();
        notifier.notify(ScanEvent::CampaignStarted {
            phases: 1,
            probe: "mock".to_string(),
        });
        assert!(rx.try_recv().is_err());
    }
}
