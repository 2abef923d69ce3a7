//! netsweep - parallel ICMP host discovery for private IPv4 networks
//!
//! Sweeps /24 subnets with two levels of bounded concurrency: subnets run in
//! batches, and inside each subnet hosts are probed in batches sized to the
//! machine.

pub mod campaign;
pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod probe;
pub mod scanner;

// Re-export commonly used types
pub use campaign::{CampaignDriver, CampaignMode, CampaignReport};
pub use config::SweepConfig;
pub use error::{ProbeError, SweepError, SweepResult};
pub use network::{HostRange, Subnet};
pub use output::{NotificationManager, ScanEvent};
pub use probe::{Probe, ProbeBackend, ProbeExecutor};
pub use scanner::engine::SweepEngine;

pub type Result<T> = std::result::Result<T, SweepError>;
