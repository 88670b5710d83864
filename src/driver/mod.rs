//! Resource drivers: the controlled page-like resource a flow acts on

pub mod client;
pub mod error;
pub mod memory;
pub mod solver;
pub mod subprocess;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub use client::{DriverConfig, DriverKind};
pub use error::DriverError;
pub use memory::MemoryDriver;
pub use solver::{ChallengeSolver, SolverConfig, SubprocessSolver};
pub use subprocess::SubprocessDriver;

/// Operations a flow may perform on the controlled resource
#[async_trait]
pub trait ResourceDriver: Send + Sync {
    /// Reload/reset the resource
    async fn reload(&self) -> Result<(), DriverError>;

    /// Evaluate a script inside the resource and return its JSON result
    async fn evaluate(&self, script: &str) -> Result<Value, DriverError>;

    /// Whether at least one element matches `selector`
    async fn has_element(&self, selector: &str) -> Result<bool, DriverError>;

    /// Whether the first element matching `selector` carries `class`
    async fn element_has_class(&self, selector: &str, class: &str) -> Result<bool, DriverError>;

    /// Set the value of the input matching `selector`
    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    /// Raw image bytes of the element matching `selector`
    async fn capture(&self, selector: &str) -> Result<Vec<u8>, DriverError>;

    /// Wait until a successful response whose URL contains `url_fragment` arrives
    async fn wait_for_response(&self, url_fragment: &str) -> Result<(), DriverError>;

    /// The resource's monotonically-changing latest event id
    async fn latest_event_id(&self) -> Result<Value, DriverError>;

    /// Whether a reward challenge is pending
    async fn reward_pending(&self) -> Result<bool, DriverError>;

    /// Snapshot of the user record exposed by the resource
    async fn user(&self) -> Result<Value, DriverError>;
}

/// Build the driver selected by `config`
pub fn create_driver(config: &DriverConfig) -> Arc<dyn ResourceDriver> {
    match config.kind {
        DriverKind::Subprocess => Arc::new(SubprocessDriver::new(config)),
        DriverKind::Memory => Arc::new(MemoryDriver::new()),
    }
}
