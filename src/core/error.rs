//! Flow error types

use crate::driver::DriverError;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Errors raised while composing or running a flow
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Unable to load step \"{name}\"!\n{reason}")]
    StepLoad { name: String, reason: String },

    #[error("Invalid flow node: {0}")]
    InvalidShape(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("next() called multiple times")]
    NextCalledMultipleTimes,

    #[error("{0} must be implemented")]
    NotImplemented(String),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("{0}")]
    Step(String),
}

impl FlowError {
    pub fn step_load(name: impl Into<String>, reason: impl Into<String>) -> Self {
        FlowError::StepLoad {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Renders an error together with its whole `source()` chain.
pub struct ErrorReport<'a>(pub &'a (dyn StdError + 'static));

impl fmt::Display for ErrorReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.0)?;

        let mut source = self.0.source();
        if source.is_some() {
            write!(f, "\n\nCaused by:")?;
        }
        let mut index = 0;
        while let Some(cause) = source {
            write!(f, "\n    {}: {}", index, cause)?;
            index += 1;
            source = cause.source();
        }

        write!(f, "\n\nDetails: {:?}", self.0)
    }
}
