/// Error types for listener acquisition.
use crate::endpoint::Endpoint;
use std::io;
use thiserror::Error;

/// Result type for acquisition operations
pub type AcquireResult<T> = Result<T, AcquireError>;

/// Acquisition error types
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The candidate port is held by another socket. Recoverable: the
    /// scan advances to the next candidate.
    #[error("Address in use: {endpoint}")]
    AddressInUse { endpoint: Endpoint },

    /// A bind failure that trying a different port cannot fix
    /// (permission denied, malformed address, descriptor limits).
    /// Aborts the scan.
    #[error("Fatal bind error on {endpoint}: {source}")]
    Fatal {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    /// Every candidate was attempted and none could be bound.
    #[error("No bindable port among candidates {attempted:?}")]
    Exhausted { attempted: Vec<u16> },

    /// Port-holder eviction failed
    #[error("Eviction error: {0}")]
    EvictionError(String),
}

impl AcquireError {
    /// Classify a bind failure at the system-call site. Address-in-use is
    /// the only locally recoverable case; everything else aborts the scan.
    pub fn from_bind(endpoint: Endpoint, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::AddrInUse {
            AcquireError::AddressInUse { endpoint }
        } else {
            AcquireError::Fatal { endpoint, source }
        }
    }

    /// Whether the scan may continue with the next candidate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AcquireError::AddressInUse { .. })
    }
}
