//! Concurrency limit sizing

use crate::config::SweepConfig;
use crate::network::HostRange;
use serde::{Deserialize, Serialize};

/// Hard ceiling on probes in flight inside one subnet (one full /24)
pub const MAX_HOST_CONCURRENCY: usize = 254;

/// Hard ceiling on subnets swept at the same time
pub const MAX_SUBNET_CONCURRENCY: usize = 16;

/// Batch sizes for the two scheduling levels.
///
/// At most `host * subnet` probes are in flight at any moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyLimits {
    pub host: usize,
    pub subnet: usize,
}

impl ConcurrencyLimits {
    /// Clamp both limits into `1..=MAX`
    pub fn new(host: usize, subnet: usize) -> Self {
        Self {
            host: host.clamp(1, MAX_HOST_CONCURRENCY),
            subnet: subnet.clamp(1, MAX_SUBNET_CONCURRENCY),
        }
    }

    /// Derive limits from configuration and the detected CPU count
    pub fn from_config(config: &SweepConfig) -> Self {
        let host = config
            .host_concurrency
            .unwrap_or_else(|| estimate_host_concurrency(num_cpus::get(), config.io_multiplier));

        let limits = Self::new(host, config.subnet_concurrency);
        log::debug!(
            "Concurrency limits: {} hosts x {} subnets (cpus: {}, multiplier: {})",
            limits.host,
            limits.subnet,
            num_cpus::get(),
            config.io_multiplier
        );
        limits
    }

    /// Host batch size for one subnet; never larger than the range itself
    pub fn host_limit_for(&self, range: HostRange) -> usize {
        self.host.min(range.len())
    }

    /// Upper bound on concurrently running probes
    pub fn max_in_flight(&self) -> usize {
        self.host * self.subnet
    }
}

/// Probes are I/O bound, so the estimate scales the core count by a multiplier
pub fn estimate_host_concurrency(cpus: usize, io_multiplier: usize) -> usize {
    cpus.max(1)
        .saturating_mul(io_multiplier.max(1))
        .clamp(1, MAX_HOST_CONCURRENCY)
}
