//! Error handling for the netsweep scanner
//!
//! Configuration and input errors are raised before a campaign starts.
//! Once scanning begins, failures are isolated per task and degrade into
//! "not a responder" results instead of propagating.

use thiserror::Error;

/// Main error type for sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Invalid subnet: {0}")]
    InvalidSubnet(String),

    #[error("Invalid host range: {0}")]
    InvalidHostRange(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Permission denied: {0}")]
    PermissionError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Result type alias for sweep operations
pub type SweepResult<T> = Result<T, SweepError>;

/// Errors raised at the probe boundary.
///
/// These never leave [`crate::probe::ProbeExecutor`]; they are folded into an
/// unreachable outcome with the error text attached.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Raw socket error: {0}")]
    RawSocket(String),

    #[error("Probe command failed: {0}")]
    Command(String),
}

impl From<ProbeError> for SweepError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::PermissionDenied(msg) => SweepError::PermissionError(msg),
            other => SweepError::NetworkError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_conversion() {
        let err: SweepError = ProbeError::PermissionDenied("raw socket".to_string()).into();
        assert!(matches!(err, SweepError::PermissionError(_)));

        let err: SweepError = ProbeError::RawSocket("bind failed".to_string()).into();
        assert!(matches!(err, SweepError::NetworkError(ref msg) if msg.contains("bind failed")));
    }
}
