//! Triggers the resource's main action when it is available

use crate::core::{
    context::ExecutionContext,
    error::FlowError,
    step::{StepInit, StepOutcome},
    timespan::{self, Timespan},
};
use crate::steps::guarded::GuardedStep;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct TriggerActionConfig {
    /// Present while the action can be triggered
    element: String,
    /// Script that triggers it
    script: String,
    /// URL fragment of the response confirming it
    response: String,
    #[serde(default = "default_settle")]
    settle: Timespan,
}

fn default_settle() -> Timespan {
    Timespan::from_secs(2)
}

#[derive(Debug, Default)]
pub struct TriggerAction {
    config: Option<TriggerActionConfig>,
}

impl TriggerAction {
    fn config(&self) -> Result<&TriggerActionConfig, FlowError> {
        self.config
            .as_ref()
            .ok_or_else(|| FlowError::InvalidConfig("TriggerAction is not initialized".to_string()))
    }
}

#[async_trait]
impl GuardedStep for TriggerAction {
    fn name(&self) -> &str {
        "TriggerAction"
    }

    async fn initialize(&mut self, init: &StepInit<'_>) -> Result<(), FlowError> {
        self.config = Some(init.parse()?);
        Ok(())
    }

    async fn guard(&mut self, ctx: &ExecutionContext) -> Result<bool, FlowError> {
        let element = &self.config()?.element;
        Ok(ctx.driver.has_element(element).await?)
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        let config = self.config()?;

        ctx.logger.log("Triggering action…");
        ctx.driver.evaluate(&config.script).await?;

        ctx.logger.log("Waiting for response…");
        ctx.driver.wait_for_response(&config.response).await?;
        timespan::sleep(config.settle).await;

        ctx.logger.log("Done!");
        Ok(StepOutcome::Continue)
    }
}
