//! Reloads the resource once an hour at a fixed minute

use crate::core::{
    context::ExecutionContext,
    error::FlowError,
    step::{StepInit, StepOutcome},
};
use crate::steps::guarded::GuardedStep;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Timelike};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PeriodicReloadConfig {
    #[serde(default)]
    minute: u32,
}

/// Next occurrence of `hh:minute:05` that is not before `now`
///
/// The 5 seconds absorb a small clock skew with the remote side.
pub fn compute_next_check<Tz: TimeZone>(now: &DateTime<Tz>, minute: u32) -> DateTime<Tz> {
    let candidate = now
        .with_minute(minute)
        .and_then(|t| t.with_second(5))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or_else(|| now.clone());

    if candidate < *now {
        candidate + Duration::hours(1)
    } else {
        candidate
    }
}

#[derive(Debug)]
pub struct PeriodicReload {
    minute: u32,
    next_check: DateTime<Local>,
}

impl Default for PeriodicReload {
    fn default() -> Self {
        let now = Local::now();
        Self {
            minute: 0,
            next_check: compute_next_check(&now, 0),
        }
    }
}

impl PeriodicReload {
    pub fn next_check(&self) -> DateTime<Local> {
        self.next_check
    }
}

#[async_trait]
impl GuardedStep for PeriodicReload {
    fn name(&self) -> &str {
        "PeriodicReload"
    }

    async fn initialize(&mut self, init: &StepInit<'_>) -> Result<(), FlowError> {
        let config: PeriodicReloadConfig = init.parse()?;
        if config.minute > 59 {
            return Err(FlowError::InvalidConfig(format!(
                "steps.{}.minute must be between 0 and 59, got {}",
                init.config.key(),
                config.minute
            )));
        }
        self.minute = config.minute;
        self.next_check = compute_next_check(&Local::now(), self.minute);
        Ok(())
    }

    async fn guard(&mut self, _ctx: &ExecutionContext) -> Result<bool, FlowError> {
        Ok(Local::now() > self.next_check)
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        ctx.driver.reload().await?;
        self.next_check = compute_next_check(&Local::now(), self.minute);
        ctx.logger.log(format!(
            "Page reloaded for periodic check. Next check: {}",
            self.next_check.format("%H:%M:%S")
        ));
        Ok(StepOutcome::Continue)
    }
}
