//! Property tests for batching and exactly-once probing

mod common;

use common::RecordingProbe;
use netsweep::{
    config::SweepConfig,
    network::{HostRange, Subnet},
    scanner::{create_batches, SweepEngine},
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_batches_cover_items_in_order(len in 0usize..600, size in 1usize..300) {
        let items: Vec<usize> = (0..len).collect();
        let batches = create_batches(&items, size);

        prop_assert_eq!(batches.len(), (len + size - 1) / size);
        prop_assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));
        if let Some((last, full)) = batches.split_last() {
            prop_assert!(full.iter().all(|b| b.len() == size));
            prop_assert!(last.len() <= size);
        }
        let flat: Vec<usize> = batches.into_iter().flatten().collect();
        prop_assert_eq!(flat, items);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_every_host_probed_exactly_once(
        start in 1u8..=254,
        span in 0u8..40,
        host in 1usize..20,
        subnet in 1usize..4,
        count in 1u8..5,
    ) {
        let end = start.saturating_add(span).min(254);
        let range = HostRange::new(start, end).unwrap();
        let subnets: Vec<Subnet> = (0..count).map(|c| Subnet::new(10, 200, c)).collect();
        let probe = Arc::new(RecordingProbe::new(Duration::ZERO));
        let config = SweepConfig::default()
            .with_timeout(200)
            .with_host_concurrency(host)
            .with_subnet_concurrency(subnet);
        let engine = SweepEngine::new(&config, probe.clone()).unwrap();

        let report = runtime().block_on(engine.scan_subnets("prop", &subnets, range));

        let seen = probe.seen();
        let unique: HashSet<Ipv4Addr> = seen.iter().copied().collect();
        prop_assert_eq!(seen.len(), unique.len());

        let expected: HashSet<Ipv4Addr> = subnets
            .iter()
            .flat_map(|s| range.iter().map(move |h| s.host(h).unwrap()))
            .collect();
        prop_assert_eq!(unique, expected);
        prop_assert_eq!(report.totals.hosts_scanned as usize, subnets.len() * range.len());
        prop_assert!(probe.peak() <= host.min(range.len()) * subnet);
    }

    #[test]
    fn prop_results_independent_of_timing(jitter in 1u64..4, host in 1usize..32) {
        let subnets = [Subnet::new(192, 168, 7), Subnet::new(192, 168, 8), Subnet::new(192, 168, 9)];
        let range = HostRange::new(1, 60).unwrap();
        let config = SweepConfig::default()
            .with_timeout(500)
            .with_host_concurrency(host)
            .with_subnet_concurrency(2);
        let rt = runtime();

        let run = |probe: RecordingProbe| {
            let engine = SweepEngine::new(&config, Arc::new(probe)).unwrap();
            rt.block_on(engine.scan_subnets("timing", &subnets, range))
        };
        let steady = run(RecordingProbe::new(Duration::ZERO));
        let jittered = run(RecordingProbe::new(Duration::ZERO).with_jitter(jitter));

        prop_assert_eq!(steady.totals, jittered.totals);
        let alive = |r: &netsweep::scanner::PhaseReport| r.responders().copied().collect::<Vec<_>>();
        prop_assert_eq!(alive(&steady), alive(&jittered));
    }
}
