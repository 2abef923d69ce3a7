//! Phase-wide aggregation counters

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every subnet coordinator of one phase.
///
/// Contributors only ever `fetch_add`; the phase reads a [`snapshot`] once all
/// of them have been joined.
///
/// [`snapshot`]: AggregationContext::snapshot
#[derive(Debug, Default)]
pub struct AggregationContext {
    hosts_scanned: AtomicU64,
    responders: AtomicU64,
    subnets_scanned: AtomicU64,
    subnets_failed: AtomicU64,
    probe_errors: AtomicU64,
}

impl AggregationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished subnet. Called once per subnet, after its last batch joined.
    pub fn record_subnet(&self, hosts: u64, responders: u64, probe_errors: u64) {
        self.hosts_scanned.fetch_add(hosts, Ordering::Relaxed);
        self.responders.fetch_add(responders, Ordering::Relaxed);
        self.probe_errors.fetch_add(probe_errors, Ordering::Relaxed);
        self.subnets_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a subnet whose coordinator could not finish
    pub fn record_failed_subnet(&self) {
        self.subnets_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters. Only meaningful after the phase barrier.
    pub fn snapshot(&self) -> AggregateSnapshot {
        AggregateSnapshot {
            hosts_scanned: self.hosts_scanned.load(Ordering::Acquire),
            responders: self.responders.load(Ordering::Acquire),
            subnets_scanned: self.subnets_scanned.load(Ordering::Acquire),
            subnets_failed: self.subnets_failed.load(Ordering::Acquire),
            probe_errors: self.probe_errors.load(Ordering::Acquire),
        }
    }
}

/// Plain copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub hosts_scanned: u64,
    pub responders: u64,
    pub subnets_scanned: u64,
    pub subnets_failed: u64,
    pub probe_errors: u64,
}

impl AddAssign for AggregateSnapshot {
    fn add_assign(&mut self, other: Self) {
        self.hosts_scanned += other.hosts_scanned;
        self.responders += other.responders;
        self.subnets_scanned += other.subnets_scanned;
        self.subnets_failed += other.subnets_failed;
        self.probe_errors += other.probe_errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_and_snapshot() {
        let ctx = AggregationContext::new();
        ctx.record_subnet(4, 2, 0);
        ctx.record_subnet(254, 0, 3);
        ctx.record_failed_subnet();

        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.hosts_scanned, 258);
        assert_eq!(snapshot.responders, 2);
        assert_eq!(snapshot.subnets_scanned, 2);
        assert_eq!(snapshot.subnets_failed, 1);
        assert_eq!(snapshot.probe_errors, 3);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let ctx = Arc::new(AggregationContext::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        ctx.record_subnet(1, 1, 0);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.hosts_scanned, 8000);
        assert_eq!(snapshot.subnets_scanned, 8000);
    }

    #[test]
    fn test_snapshot_sum() {
        let mut total = AggregateSnapshot::default();
        total += AggregateSnapshot {
            hosts_scanned: 10,
            responders: 1,
            subnets_scanned: 1,
            subnets_failed: 0,
            probe_errors: 0,
        };
        total += AggregateSnapshot {
            hosts_scanned: 5,
            responders: 2,
            subnets_scanned: 1,
            subnets_failed: 1,
            probe_errors: 4,
        };
        assert_eq!(total.hosts_scanned, 15);
        assert_eq!(total.responders, 3);
        assert_eq!(total.subnets_failed, 1);
    }
}
