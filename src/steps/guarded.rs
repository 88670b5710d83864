//! Guarded steps - skipped while a reward is pending or a new event is waiting

use crate::core::{
    context::ExecutionContext,
    error::FlowError,
    step::{Step, StepInit, StepOutcome},
};
use async_trait::async_trait;

/// A step that triggers new activity on the resource
///
/// Such steps must stay idle while the resource is waiting on a reward
/// challenge or has produced an event this cycle has not processed yet.
#[async_trait]
pub trait GuardedStep: Send + Sync {
    fn name(&self) -> &str;

    fn config_key(&self) -> &str {
        self.name()
    }

    async fn initialize(&mut self, _init: &StepInit<'_>) -> Result<(), FlowError> {
        Ok(())
    }

    /// The step's own condition
    async fn guard(&mut self, _ctx: &ExecutionContext) -> Result<bool, FlowError> {
        Ok(true)
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError>;
}

/// Adapts a [`GuardedStep`] into a [`Step`]
pub struct Guarded<T>(pub T);

impl<T> Guarded<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }
}

#[async_trait]
impl<T: GuardedStep> Step for Guarded<T> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn config_key(&self) -> &str {
        self.0.config_key()
    }

    async fn initialize(&mut self, init: &StepInit<'_>) -> Result<(), FlowError> {
        self.0.initialize(init).await
    }

    async fn should_run(&mut self, ctx: &ExecutionContext) -> Result<bool, FlowError> {
        Ok(self.0.guard(ctx).await?
            && !ctx.driver.reward_pending().await?
            && !new_event_pending(ctx).await?)
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        self.0.run(ctx).await
    }
}

/// Whether the resource's latest event id moved since the cycle started
pub async fn new_event_pending(ctx: &ExecutionContext) -> Result<bool, FlowError> {
    let latest = ctx.driver.latest_event_id().await?;
    Ok(ctx.state.last_event_id().is_some_and(|last| *last != latest))
}
