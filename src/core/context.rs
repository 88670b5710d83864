//! Execution context - shared by every step for the lifetime of a run

use crate::core::{error::FlowError, state::State};
use crate::driver::ResourceDriver;
use crate::execution::dispatch::{CompiledStep, Next};
use crate::logging::CascadingLogger;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Values visible only to the branch that created them
///
/// Extending an overlay returns a new value; the original is untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    values: BTreeMap<String, Value>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this overlay with `key` set to `value`
    pub fn with(&self, key: impl Into<String>, value: Value) -> Self {
        let mut values = self.values.clone();
        values.insert(key.into(), value);
        Self { values }
    }

    /// Copy of this overlay carrying a `user` snapshot
    pub fn with_user(&self, user: Value) -> Self {
        self.with("user", user)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Execution context for a run
///
/// Contains the resource driver, the state bag, the narration logger and the
/// overlay of the branch currently executing.
pub struct ExecutionContext {
    /// The controlled resource
    pub driver: Arc<dyn ResourceDriver>,

    /// State that survives between steps and cycles
    pub state: State,

    /// Narration logger
    pub logger: CascadingLogger,

    overlay: Overlay,

    break_requested: bool,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("state", &self.state)
            .field("logger", &self.logger)
            .field("overlay", &self.overlay)
            .field("break_requested", &self.break_requested)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    pub fn new(driver: Arc<dyn ResourceDriver>, logger: CascadingLogger) -> Self {
        Self {
            driver,
            state: State::new(),
            logger,
            overlay: Overlay::new(),
            break_requested: false,
        }
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// The `user` snapshot injected by an enclosing branch, if any
    pub fn user(&self) -> Option<&Value> {
        self.overlay.get("user")
    }

    /// Ask the innermost loop to stop after its current pass
    pub fn request_break(&mut self) {
        self.break_requested = true;
    }

    pub fn break_requested(&self) -> bool {
        self.break_requested
    }

    /// Consume a pending break request
    pub fn take_break(&mut self) -> bool {
        std::mem::replace(&mut self.break_requested, false)
    }

    /// Run `step` with `overlay` in place, restoring the previous overlay
    /// afterwards (whether the step succeeded or not).
    pub async fn run_overlaid(
        &mut self,
        overlay: Overlay,
        step: &dyn CompiledStep,
    ) -> Result<(), FlowError> {
        let previous = std::mem::replace(&mut self.overlay, overlay);
        let result = step.call(self, Next::end()).await;
        self.overlay = previous;
        result
    }
}
