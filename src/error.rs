//! Error types for geoalarm.
//!
//! All errors are strongly typed using thiserror so callers can pattern match
//! on the failure instead of parsing messages.

use thiserror::Error;

/// Validation errors raised while checking user or configuration input.
#[allow(missing_docs)]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid location '{input}': {reason}")]
    MalformedCoordinate {
        input: String,
        reason: String,
    },

    #[error("Coordinate {field} must be a finite number")]
    NonFiniteCoordinate {
        field: &'static str,
    },

    #[error("Latitude {value} is out of range [-90, 90]")]
    LatitudeOutOfRange {
        value: f64,
    },

    #[error("Longitude {value} is out of range [-180, 180]")]
    LongitudeOutOfRange {
        value: f64,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Execution errors raised by the monitor runtime.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Channel disconnected: {path}")]
    Disconnected {
        path: String,
    },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Failed to spawn worker thread: {message}")]
    WorkerSpawn {
        message: String,
    },
}

/// Top-level error type for geoalarm.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl AlarmError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Execution(e) => matches!(e, ExecutionError::Timeout { .. }),
            Self::Validation(_) | Self::Config { .. } | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for geoalarm operations.
pub type AlarmResult<T> = Result<T, AlarmError>;
