//! flowbot - drives a controlled resource through a configured flow of steps,
//! cycle after cycle, recovering from transient faults by reloading it

pub mod cli;
pub mod core;
pub mod driver;
pub mod execution;
pub mod logging;
pub mod steps;

// Re-export commonly used types
pub use core::{AppConfig, ExecutionContext, FlowError, Step, StepNode, StepOutcome, Timespan};
pub use driver::{ChallengeSolver, DriverError, MemoryDriver, ResourceDriver};
pub use execution::{Composer, CycleSupervisor, Namespace, StepRegistry, SupervisorError};
pub use logging::CascadingLogger;
pub use steps::builtin_registry;
