//! Mock probes shared by the integration tests

#![allow(dead_code)]

use netsweep::error::ProbeError;
use netsweep::probe::Probe;
use rand::Rng;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Answers for a fixed set of addresses
pub struct StaticProbe {
    alive: HashSet<Ipv4Addr>,
}

impl StaticProbe {
    pub fn new(alive: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        Self {
            alive: alive.into_iter().collect(),
        }
    }

    pub fn silent() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait::async_trait]
impl Probe for StaticProbe {
    async fn probe(&self, target: Ipv4Addr, _timeout: Duration) -> Result<bool, ProbeError> {
        Ok(self.alive.contains(&target))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Records every probed address and the peak number of concurrent probes
pub struct RecordingProbe {
    delay: Duration,
    jitter_ms: u64,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    seen: Mutex<Vec<Ipv4Addr>>,
}

impl RecordingProbe {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter_ms: 0,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Add a random extra delay of up to `jitter_ms` to every probe
    pub fn with_jitter(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Ipv4Addr> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Probe for RecordingProbe {
    async fn probe(&self, target: Ipv4Addr, _timeout: Duration) -> Result<bool, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.seen.lock().unwrap().push(target);

        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        tokio::time::sleep(self.delay + Duration::from_millis(jitter)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        // Every host whose last octet is a multiple of 7 answers
        Ok(target.octets()[3] % 7 == 0)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Started,
    Finished,
}

/// Logs start and finish of every probe in order; one host answers slowly
pub struct TimelineProbe {
    slow_host: u8,
    slow_delay: Duration,
    events: Mutex<Vec<(u8, Mark, tokio::time::Instant)>>,
}

impl TimelineProbe {
    pub fn new(slow_host: u8, slow_delay: Duration) -> Self {
        Self {
            slow_host,
            slow_delay,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<(u8, Mark, tokio::time::Instant)> {
        self.events.lock().unwrap().clone()
    }

    /// Position and time of the first event matching `host` and `mark`
    pub fn find(&self, host: u8, mark: Mark) -> Option<(usize, tokio::time::Instant)> {
        self.events()
            .into_iter()
            .enumerate()
            .find(|(_, (h, m, _))| *h == host && *m == mark)
            .map(|(index, (_, _, at))| (index, at))
    }

    fn mark(&self, host: u8, mark: Mark) {
        self.events
            .lock()
            .unwrap()
            .push((host, mark, tokio::time::Instant::now()));
    }
}

#[async_trait::async_trait]
impl Probe for TimelineProbe {
    async fn probe(&self, target: Ipv4Addr, _timeout: Duration) -> Result<bool, ProbeError> {
        let host = target.octets()[3];
        self.mark(host, Mark::Started);
        if host == self.slow_host {
            tokio::time::sleep(self.slow_delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.mark(host, Mark::Finished);
        Ok(true)
    }

    fn name(&self) -> &str {
        "timeline"
    }
}
