//! Solves the reward challenge that blocks the resource

use crate::core::{
    context::ExecutionContext,
    error::FlowError,
    step::{Step, StepInit, StepOutcome},
    timespan::{self, Timespan},
};
use crate::driver::ChallengeSolver;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
struct SolveChallengeConfig {
    #[serde(default = "default_max_retry")]
    max_retry: u32,
    #[serde(default = "default_guess_length")]
    guess_length: usize,
    /// Link shown when the challenge page is not open yet
    link: String,
    open_script: String,
    /// Element holding the challenge image
    image: String,
    /// Input receiving the guess
    input: String,
    refresh_script: String,
    refresh_response: String,
    submit_script: String,
    submit_response: String,
    resume_script: String,
    #[serde(default = "default_settle")]
    settle: Timespan,
}

fn default_max_retry() -> u32 {
    5
}

fn default_guess_length() -> usize {
    5
}

fn default_settle() -> Timespan {
    Timespan::from_secs(1)
}

pub struct SolveChallenge {
    solver: Arc<dyn ChallengeSolver>,
    config: Option<SolveChallengeConfig>,
}

impl SolveChallenge {
    pub fn new(solver: Arc<dyn ChallengeSolver>) -> Self {
        Self { solver, config: None }
    }

    fn config(&self) -> Result<&SolveChallengeConfig, FlowError> {
        self.config
            .as_ref()
            .ok_or_else(|| FlowError::InvalidConfig("SolveChallenge is not initialized".to_string()))
    }

    fn is_plausible(&self, guess: &str, length: usize) -> bool {
        guess.chars().count() == length && !guess.contains('?')
    }

    async fn solve_with_retry(&self, ctx: &mut ExecutionContext) -> Result<(), FlowError> {
        let config = self.config()?;

        for attempt in 0..config.max_retry {
            let image = ctx.driver.capture(&config.image).await?;
            if image.is_empty() {
                return Err(FlowError::Step("Unable to load challenge image!".to_string()));
            }

            ctx.logger.log(format!("Attempt #{}:", attempt));
            let guess = match self.solver.solve(&image).await {
                Ok(guess) => {
                    ctx.logger.log(format!("> Guess: {}", guess));
                    Some(guess)
                }
                Err(err) => {
                    warn!("Solver failed: {}", err);
                    ctx.logger.log("Error while solving challenge:");
                    ctx.logger.log_error(&err);
                    None
                }
            };

            let guess = match guess {
                Some(guess) if self.is_plausible(&guess, config.guess_length) => guess,
                _ => {
                    ctx.logger.log("> Unable to solve, loading new challenge…");
                    ctx.driver.evaluate(&config.refresh_script).await?;
                    ctx.driver.wait_for_response(&config.refresh_response).await?;
                    timespan::sleep(config.settle).await;
                    continue;
                }
            };

            ctx.logger.log("> Submitting…");
            ctx.driver.fill(&config.input, &guess).await?;
            timespan::sleep(config.settle).await;
            ctx.driver.evaluate(&config.submit_script).await?;
            ctx.driver.wait_for_response(&config.submit_response).await?;
            timespan::sleep(config.settle).await;

            if !ctx.driver.reward_pending().await? {
                debug!("Challenge accepted after {} attempts", attempt + 1);
                return Ok(());
            }
        }

        Err(FlowError::Solver(
            "Unable to solve challenge: max number of attempts exceeded.".to_string(),
        ))
    }
}

#[async_trait]
impl Step for SolveChallenge {
    fn name(&self) -> &str {
        "SolveChallenge"
    }

    async fn initialize(&mut self, init: &StepInit<'_>) -> Result<(), FlowError> {
        let config: SolveChallengeConfig = init.parse()?;
        if config.max_retry == 0 {
            return Err(FlowError::InvalidConfig(
                "steps.SolveChallenge.max_retry must be at least 1".to_string(),
            ));
        }
        self.config = Some(config);
        Ok(())
    }

    async fn should_run(&mut self, ctx: &ExecutionContext) -> Result<bool, FlowError> {
        Ok(ctx.driver.reward_pending().await?)
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        let config = self.config()?;

        if ctx.driver.has_element(&config.link).await? {
            ctx.logger.log("Opening challenge page…");
            ctx.driver.evaluate(&config.open_script).await?;
        }

        ctx.logger.log("Solving challenge…");
        self.solve_with_retry(ctx).await?;
        ctx.logger.log("Challenge solved!");

        ctx.driver.evaluate(&config.resume_script).await?;

        // start the next cycle right away
        ctx.state.set_cycle_delay(Timespan::from_secs(1));
        Ok(StepOutcome::Continue)
    }
}
