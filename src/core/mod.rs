//! Core domain models
//!
//! Step contract, step tree, execution context, state, configuration and the
//! shared error type.

pub mod config;
pub mod context;
pub mod error;
pub mod node;
pub mod state;
pub mod step;
pub mod timespan;

pub use config::AppConfig;
pub use context::{ExecutionContext, Overlay};
pub use error::{ErrorReport, FlowError};
pub use node::StepNode;
pub use state::State;
pub use step::{Step, StepConfig, StepInit, StepOutcome};
pub use timespan::Timespan;
