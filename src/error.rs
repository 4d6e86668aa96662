//! Error types for the volume dispatcher
//!
//! Provides structured error types for driver discovery, mutating backend
//! calls, registry construction and the single-driver dispatch policy.

use std::fmt;
use thiserror::Error;

/// Discovery operation that failed, used as context when wrapping errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryKind {
    BlockDevice,
    Instance,
    Volume,
    Snapshot,
}

impl fmt::Display for DiscoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryKind::BlockDevice => write!(f, "Driver Block Device discovery failed"),
            DiscoveryKind::Instance => write!(f, "Driver Instance discovery failed"),
            DiscoveryKind::Volume => write!(f, "Driver Volume discovery failed"),
            DiscoveryKind::Snapshot => write!(f, "Driver Snapshot discovery failed"),
        }
    }
}

/// Unified error type for the dispatcher and its drivers
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Discovery Errors
    // =========================================================================
    /// A discovery call on a single driver failed
    #[error("{kind}: {driver}: {reason}")]
    Discovery {
        kind: DiscoveryKind,
        driver: String,
        reason: String,
    },

    /// A fan-out discovery failed because one driver failed
    #[error("Error: {kind}: {driver}: {source}")]
    DiscoveryFailed {
        kind: DiscoveryKind,
        driver: String,
        #[source]
        source: Box<Error>,
    },

    // =========================================================================
    // Dispatch Policy Errors
    // =========================================================================
    #[error(
        "Multiple drivers detected ({count}), must declare a single driver with VOLUME_DISPATCHER_DRIVERS="
    )]
    MultipleDriversDetected { count: usize },

    // =========================================================================
    // Backend Errors
    // =========================================================================
    #[error("Backend operation failed: {driver} - {operation}: {reason}")]
    Backend {
        driver: String,
        operation: String,
        reason: String,
    },

    // =========================================================================
    // Registry Errors
    // =========================================================================
    #[error("No drivers initialized")]
    NoDriversInitialized,

    #[error("Unknown storage driver: {name}")]
    UnknownDriver { name: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // IO / Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a backend failure on a mutating call
    pub fn backend(
        driver: impl Into<String>,
        operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Backend {
            driver: driver.into(),
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a discovery failure on a single driver
    pub fn discovery(
        kind: DiscoveryKind,
        driver: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::Discovery {
            kind,
            driver: driver.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error signals a configuration problem rather than a
    /// backend failure
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MultipleDriversDetected { .. }
                | Error::NoDriversInitialized
                | Error::UnknownDriver { .. }
                | Error::Configuration(_)
        )
    }

    /// Check if a caller could reasonably retry this error.
    ///
    /// The dispatcher never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Discovery { .. } | Error::Backend { .. } | Error::Io(_) => true,
            Error::DiscoveryFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Result type alias for the dispatcher
pub type Result<T> = std::result::Result<T, Error>;
