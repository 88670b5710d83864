//! Driver error types

use thiserror::Error;

/// Error types for resource driver operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("Timeout exceeded while waiting for {operation} ({secs}s)")]
    Timeout { operation: String, secs: u64 },

    #[error("Execution context was destroyed")]
    ContextDestroyed,

    #[error("Resource asked to be reloaded: {0}")]
    ReloadRequested(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Driver command failed: {0}")]
    Command(String),

    #[error("Unable to decode driver output: {0}")]
    Decode(String),
}

impl DriverError {
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        DriverError::Timeout {
            operation: operation.into(),
            secs,
        }
    }
}
