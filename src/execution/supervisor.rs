//! Cycle supervisor - runs the compiled flow once per cycle, forever
//!
//! Each cycle runs inside a `"[start] - <timestamp>"` log scope. Recoverable
//! faults trigger a bounded reload/retry sub-loop; anything else ends the run.

use crate::core::{context::ExecutionContext, error::FlowError, timespan::{self, Timespan}};
use crate::execution::dispatch::{Next, StepHandle};
use crate::execution::fault::{classify, Fault, RecoverableFault};
use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Supervisor settings (`supervisor` config section)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Delay between cycles unless a step changes it
    #[serde(default = "default_cycle_delay")]
    pub cycle_delay: Timespan,

    /// Delay after recovering from a timeout
    #[serde(default = "default_timeout_cycle_delay")]
    pub timeout_cycle_delay: Timespan,

    /// Consecutive reload attempts before giving up
    #[serde(default = "default_max_reload_attempts")]
    pub max_reload_attempts: u32,

    /// Wait after failed reload `n` is `reload_backoff × n`
    #[serde(default = "default_reload_backoff")]
    pub reload_backoff: Timespan,

    /// Stop after this many cycles (unbounded when absent)
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

fn default_cycle_delay() -> Timespan {
    Timespan::from_secs(15 * 60)
}

fn default_timeout_cycle_delay() -> Timespan {
    Timespan::from_secs(10)
}

fn default_max_reload_attempts() -> u32 {
    3
}

fn default_reload_backoff() -> Timespan {
    Timespan::from_secs(15)
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            cycle_delay: default_cycle_delay(),
            timeout_cycle_delay: default_timeout_cycle_delay(),
            max_reload_attempts: default_max_reload_attempts(),
            reload_backoff: default_reload_backoff(),
            max_cycles: None,
        }
    }
}

impl SupervisorConfig {
    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = Some(max_cycles);
        self
    }

    pub fn with_cycle_delay(mut self, delay: Timespan) -> Self {
        self.cycle_delay = delay;
        self
    }

    pub fn with_max_reload_attempts(mut self, attempts: u32) -> Self {
        self.max_reload_attempts = attempts;
        self
    }
}

/// Why the supervisor stopped
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Unrecoverable error: {0}")]
    Fatal(#[source] FlowError),

    #[error("Reloaded too many times ({attempts} attempts)")]
    ReloadExhausted {
        attempts: u32,
        #[source]
        last: FlowError,
    },
}

/// How a cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Succeeded,
    Recovered(RecoverableFault),
}

/// Result of one cycle and the delay before the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub delay: Timespan,
}

pub struct CycleSupervisor {
    config: SupervisorConfig,
    flow: StepHandle,
    ctx: ExecutionContext,
    failures: u32,
    cycles: u64,
}

impl CycleSupervisor {
    pub fn new(config: SupervisorConfig, flow: StepHandle, ctx: ExecutionContext) -> Self {
        Self {
            config,
            flow,
            ctx,
            failures: 0,
            cycles: 0,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }

    /// Consecutive recoverable failures since the last successful cycle
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Cycles started so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run cycles until a fatal fault, or until `max_cycles` is reached.
    ///
    /// Sleeps the pending cycle delay between cycles.
    pub async fn run(&mut self) -> Result<u64, SupervisorError> {
        loop {
            let report = self.run_cycle().await?;

            if self.config.max_cycles.is_some_and(|max| self.cycles >= max) {
                info!("Stopping after {} cycles", self.cycles);
                return Ok(self.cycles);
            }

            debug!("Next cycle in {}", report.delay);
            timespan::sleep(report.delay).await;
        }
    }

    /// Run one cycle, including any reload/retry it needs
    pub async fn run_cycle(&mut self) -> Result<CycleReport, SupervisorError> {
        self.cycles += 1;
        let depth = self.ctx.logger.depth();
        let label = format!("[start] - {}", Local::now().format("%d/%m/%Y %H:%M:%S"));
        self.ctx.logger.open(Some(&label));
        self.ctx.state.set_cycle_delay(self.config.cycle_delay);
        debug!("Cycle {} started", self.cycles);

        let outcome = match self.run_flow().await {
            Ok(()) => {
                self.failures = 0;
                CycleOutcome::Succeeded
            }
            Err(err) => {
                self.ctx.logger.log("Encountered error:");
                self.ctx.logger.log_error(&err);

                let result = match classify(&err) {
                    Fault::Recoverable(fault) => self.recover(fault, err).await.map(|_| fault),
                    Fault::Fatal => Err(SupervisorError::Fatal(err)),
                };

                match result {
                    Ok(fault) => CycleOutcome::Recovered(fault),
                    Err(fatal) => {
                        error!("{}", fatal);
                        self.ctx.logger.log("Unrecoverable error. Exiting...");
                        self.ctx.logger.unwind_to(depth);
                        return Err(fatal);
                    }
                }
            }
        };

        self.ctx.logger.unwind_to(depth + 1);
        self.ctx.logger.close(Some("[end]"));

        let delay = self.ctx.state.cycle_delay().unwrap_or(self.config.cycle_delay);
        Ok(CycleReport { outcome, delay })
    }

    async fn run_flow(&mut self) -> Result<(), FlowError> {
        let event_id = self.ctx.driver.latest_event_id().await?;
        self.ctx.state.set_last_event_id(event_id);
        self.flow.call(&mut self.ctx, Next::end()).await
    }

    async fn recover(&mut self, fault: RecoverableFault, mut last: FlowError) -> Result<(), SupervisorError> {
        let max = self.config.max_reload_attempts;

        loop {
            if self.failures >= max {
                return Err(SupervisorError::ReloadExhausted {
                    attempts: self.failures,
                    last,
                });
            }

            self.failures += 1;
            let attempt = self.failures;
            warn!("Reloading after {} (attempt {}/{})", fault, attempt, max);
            self.ctx.logger.log(format!("Reloading page due to {}...", fault));

            let err = match self.ctx.driver.reload().await {
                Ok(()) => {
                    if fault == RecoverableFault::Timeout {
                        self.ctx.state.set_cycle_delay(self.config.timeout_cycle_delay);
                    }
                    return Ok(());
                }
                Err(err) => FlowError::from(err),
            };

            self.ctx.logger.log("Reload failed:");
            self.ctx.logger.log_error(&err);

            if !classify(&err).is_recoverable() {
                return Err(SupervisorError::Fatal(err));
            }
            if attempt >= max {
                return Err(SupervisorError::ReloadExhausted { attempts: attempt, last: err });
            }
            last = err;

            let wait = self.config.reload_backoff.times(attempt);
            self.ctx.logger.log(format!("Retrying in {}...", wait));
            timespan::sleep(wait).await;
        }
    }
}
