//! Backs off while the resource is under maintenance

use crate::core::{
    context::ExecutionContext,
    error::FlowError,
    step::{Step, StepInit, StepOutcome},
    timespan::Timespan,
};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CheckMaintenanceConfig {
    #[serde(default = "default_selector")]
    selector: String,
    #[serde(default = "default_class")]
    class: String,
    #[serde(default = "default_delay")]
    maintenance_cycle_delay: Timespan,
}

fn default_selector() -> String {
    "body".to_string()
}

fn default_class() -> String {
    "PageMaintenance".to_string()
}

fn default_delay() -> Timespan {
    Timespan::from_secs(10 * 60)
}

/// Reloads, delays the next cycle and ends the current pass when the
/// maintenance marker is present
#[derive(Debug)]
pub struct CheckMaintenance {
    selector: String,
    class: String,
    delay: Timespan,
}

impl Default for CheckMaintenance {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            class: default_class(),
            delay: default_delay(),
        }
    }
}

#[async_trait]
impl Step for CheckMaintenance {
    fn name(&self) -> &str {
        "CheckMaintenance"
    }

    async fn initialize(&mut self, init: &StepInit<'_>) -> Result<(), FlowError> {
        let config: CheckMaintenanceConfig = init.parse()?;
        self.selector = config.selector;
        self.class = config.class;
        self.delay = config.maintenance_cycle_delay;
        Ok(())
    }

    async fn should_run(&mut self, ctx: &ExecutionContext) -> Result<bool, FlowError> {
        Ok(ctx.driver.element_has_class(&self.selector, &self.class).await?)
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        ctx.logger.log("Maintenance detected.");
        ctx.driver.reload().await?;
        ctx.state.set_cycle_delay(self.delay);
        Ok(StepOutcome::Abort)
    }
}
