use thiserror::Error;

use crate::traits::backend_provider::Capability;

/// Errors reported by a backend provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("required capability missing: {0}")]
    MissingCapability(Capability),

    #[error("backend not initialized")]
    NotInitialized,

    #[error("backend is not processing")]
    NotProcessing,

    #[error("unknown driver: {0}")]
    UnknownDriver(String),

    #[error("driver error: {0}")]
    Driver(String),

    #[error("malformed backend result: {0}")]
    Malformed(String),

    #[error("backend panicked: {0}")]
    Panicked(String),

    #[error("backend call timed out")]
    Timeout,
}

/// Errors returned by session engine operations.
///
/// None of these are fatal; the session stays in its last good state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("invalid endpoint id: {0}")]
    InvalidEndpointId(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Invalid configuration value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
