//! Configuration module for the netsweep scanner

use crate::probe::ProbeBackend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for sweep operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Deadline for a single probe in milliseconds
    pub timeout_ms: u64,

    /// Probes per CPU core; host probing is I/O bound
    pub io_multiplier: usize,

    /// Fixed host-level concurrency, overrides the CPU-based estimate
    pub host_concurrency: Option<usize>,

    /// Number of subnets swept at the same time
    pub subnet_concurrency: usize,

    /// Emit a host progress event every N probed hosts
    pub progress_interval: usize,

    /// Which probe implementation to use
    pub backend: ProbeBackend,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            io_multiplier: 8,
            host_concurrency: None,
            subnet_concurrency: 8,
            progress_interval: 50,
            backend: ProbeBackend::Auto,
        }
    }
}

impl SweepConfig {
    /// Set the probe timeout in milliseconds
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Pin the host-level concurrency
    pub fn with_host_concurrency(mut self, limit: usize) -> Self {
        self.host_concurrency = Some(limit);
        self
    }

    /// Set the subnet-level concurrency
    pub fn with_subnet_concurrency(mut self, limit: usize) -> Self {
        self.subnet_concurrency = limit;
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_backend(mut self, backend: ProbeBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Get timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            crate::SweepError::ConfigError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: SweepConfig = toml::from_str(&content)
            .map_err(|e| crate::SweepError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `~/.netsweep.toml`, falling back to defaults
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let config_path = home_dir.join(".netsweep.toml");

        if config_path.exists() {
            match Self::from_toml_file(&config_path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", config_path.display(), e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.timeout_ms == 0 {
            return Err(crate::SweepError::ConfigError("Timeout must be greater than 0".to_string()));
        }

        if self.io_multiplier == 0 {
            return Err(crate::SweepError::ConfigError(
                "I/O multiplier must be greater than 0".to_string(),
            ));
        }

        if self.host_concurrency == Some(0) {
            return Err(crate::SweepError::ConfigError(
                "Host concurrency must be greater than 0".to_string(),
            ));
        }

        if self.subnet_concurrency == 0 {
            return Err(crate::SweepError::ConfigError(
                "Subnet concurrency must be greater than 0".to_string(),
            ));
        }

        if self.progress_interval == 0 {
            return Err(crate::SweepError::ConfigError(
                "Progress interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
