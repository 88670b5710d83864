//! Reacts to new events and runs the configured environment modules

use crate::core::{
    context::ExecutionContext,
    error::FlowError,
    step::{Step, StepInit, StepOutcome},
};
use crate::execution::{dispatch::StepHandle, registry::Namespace};
use crate::steps::guarded::new_event_pending;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct UpdateEnvironmentConfig {
    #[serde(default)]
    show_latest_event: bool,
    #[serde(default)]
    latest_event_script: Option<String>,
    #[serde(default = "default_wrap_width")]
    wrap_width: usize,
    #[serde(default)]
    modules: Vec<String>,
}

fn default_wrap_width() -> usize {
    60
}

/// Wrap event text for the narration log, prefixing every line with `"> "`
pub fn format_event_text(text: &str, width: usize) -> String {
    let options = textwrap::Options::new(width)
        .initial_indent("> ")
        .subsequent_indent("> ");
    textwrap::fill(text.trim(), options)
}

pub struct UpdateEnvironment {
    latest_event_script: Option<String>,
    wrap_width: usize,
    modules: Vec<StepHandle>,
}

impl Default for UpdateEnvironment {
    fn default() -> Self {
        Self {
            latest_event_script: None,
            wrap_width: default_wrap_width(),
            modules: Vec::new(),
        }
    }
}

impl UpdateEnvironment {
    async fn show_latest_event(&self, ctx: &mut ExecutionContext, script: &str) -> Result<(), FlowError> {
        let text = ctx.driver.evaluate(script).await?;
        match text.as_str().map(str::trim) {
            Some(text) if !text.is_empty() => {
                ctx.logger.log(format_event_text(text, self.wrap_width));
            }
            _ => debug!("No event text to show"),
        }
        Ok(())
    }
}

#[async_trait]
impl Step for UpdateEnvironment {
    fn name(&self) -> &str {
        "UpdateEnvironment"
    }

    async fn initialize(&mut self, init: &StepInit<'_>) -> Result<(), FlowError> {
        let config: UpdateEnvironmentConfig = init.parse()?;

        if config.show_latest_event && config.latest_event_script.is_none() {
            return Err(FlowError::InvalidConfig(
                "steps.UpdateEnvironment.show_latest_event needs latest_event_script".to_string(),
            ));
        }

        debug!(
            "Enabled modules: {}",
            if config.modules.is_empty() { "none".to_string() } else { config.modules.join(", ") }
        );

        let mut modules = Vec::with_capacity(config.modules.len());
        for name in &config.modules {
            modules.push(init.load(name, Namespace::Environment).await?);
        }

        self.latest_event_script = config.latest_event_script.filter(|_| config.show_latest_event);
        self.wrap_width = config.wrap_width;
        self.modules = modules;
        Ok(())
    }

    async fn should_run(&mut self, ctx: &ExecutionContext) -> Result<bool, FlowError> {
        new_event_pending(ctx).await
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        let latest = ctx.driver.latest_event_id().await?;
        ctx.logger.log(format!("New event ID: {}", latest));

        if let Some(script) = &self.latest_event_script {
            self.show_latest_event(ctx, script).await?;
        }

        for module in &self.modules {
            let user = ctx.driver.user().await?;
            let overlay = ctx.overlay().with_user(user);
            ctx.run_overlaid(overlay, module.as_ref()).await?;
        }

        Ok(StepOutcome::Continue)
    }
}
