//! Dismisses popups that block the resource

use crate::core::{
    context::ExecutionContext,
    error::FlowError,
    step::{Step, StepInit, StepOutcome},
    timespan::{self, Timespan},
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// A popup the flow knows how to close
#[derive(Debug, Clone, Deserialize)]
pub struct Popup {
    pub name: String,
    /// Present while the popup is shown
    pub selector: String,
    /// Script that dismisses it
    pub dismiss: String,
    /// Script returning the popup's text, logged before dismissing
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClosePopupsConfig {
    #[serde(default)]
    popups: Vec<Popup>,
    #[serde(default = "default_settle")]
    settle: Timespan,
}

fn default_settle() -> Timespan {
    Timespan::from_secs(1)
}

#[derive(Debug, Default)]
pub struct ClosePopups {
    popups: Vec<Popup>,
    settle: Timespan,
}

#[async_trait]
impl Step for ClosePopups {
    fn name(&self) -> &str {
        "ClosePopups"
    }

    async fn initialize(&mut self, init: &StepInit<'_>) -> Result<(), FlowError> {
        let config: ClosePopupsConfig = init.parse()?;
        debug!("Watching {} popups", config.popups.len());
        self.popups = config.popups;
        self.settle = config.settle;
        Ok(())
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        for popup in &self.popups {
            if !ctx.driver.has_element(&popup.selector).await? {
                continue;
            }

            ctx.logger.log(format!("Closing {}…", popup.name));
            if let Some(script) = &popup.text {
                if let Some(text) = ctx.driver.evaluate(script).await?.as_str() {
                    ctx.logger.log(format!("> {}", text.trim()));
                }
            }

            timespan::sleep(self.settle).await;
            ctx.driver.evaluate(&popup.dismiss).await?;
        }

        Ok(StepOutcome::Continue)
    }
}
