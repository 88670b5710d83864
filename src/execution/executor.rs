//! Step executor - runs a single lifecycle step inside its own log scope

use crate::core::{
    context::ExecutionContext,
    error::FlowError,
    step::{Step, StepOutcome},
};
use crate::execution::dispatch::{CompiledStep, Next};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

/// Adapts a [`Step`] to the dispatch chain
///
/// Opens a `"[Name]"` scope, runs the step when `should_run` allows it, closes
/// the scope and continues only on [`StepOutcome::Continue`]. When the step
/// fails the scope stays open; whoever handles the error unwinds it.
pub struct LeafStep {
    name: String,
    step: Mutex<Box<dyn Step>>,
}

impl LeafStep {
    pub fn new(step: Box<dyn Step>) -> Self {
        Self {
            name: step.name().to_string(),
            step: Mutex::new(step),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the step, returning its outcome without touching any continuation
    pub async fn execute(&self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        let mut step = self.step.lock().await;

        if !step.should_run(ctx).await? {
            debug!("Skipping step {}", self.name);
            return Ok(StepOutcome::Continue);
        }

        debug!("Running step {}", self.name);
        step.run(ctx).await
    }
}

#[async_trait]
impl CompiledStep for LeafStep {
    async fn call(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> Result<(), FlowError> {
        ctx.logger.open(Some(&format!("[{}]", self.name)));
        let outcome = self.execute(ctx).await?;
        ctx.logger.close(None);

        match outcome {
            StepOutcome::Continue => next.run(ctx).await,
            StepOutcome::Abort => {
                debug!("Step {} aborted the rest of the pass", self.name);
                Ok(())
            }
        }
    }
}
