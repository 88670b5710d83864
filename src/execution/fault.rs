//! Fault classification

use crate::core::error::FlowError;
use crate::driver::DriverError;
use std::fmt;

/// Faults that reloading the resource is expected to clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverableFault {
    Timeout,
    ContextDestroyed,
    ReloadRequested,
}

impl fmt::Display for RecoverableFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoverableFault::Timeout => write!(f, "timeout"),
            RecoverableFault::ContextDestroyed => write!(f, "navigation"),
            RecoverableFault::ReloadRequested => write!(f, "reload request"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Recoverable(RecoverableFault),
    Fatal,
}

impl Fault {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Fault::Recoverable(_))
    }
}

/// Decide whether `error` can be cleared by a reload
pub fn classify(error: &FlowError) -> Fault {
    match error {
        FlowError::Driver(driver) => classify_driver(driver),
        _ => Fault::Fatal,
    }
}

pub fn classify_driver(error: &DriverError) -> Fault {
    match error {
        DriverError::Timeout { .. } => Fault::Recoverable(RecoverableFault::Timeout),
        DriverError::ContextDestroyed => Fault::Recoverable(RecoverableFault::ContextDestroyed),
        DriverError::ReloadRequested(_) => Fault::Recoverable(RecoverableFault::ReloadRequested),
        _ => Fault::Fatal,
    }
}
