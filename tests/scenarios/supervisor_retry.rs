//! Test: Supervisor recovery over a composed flow

use crate::helpers::*;
use async_trait::async_trait;
use flowbot::core::{ExecutionContext, FlowError, Step, StepOutcome, Timespan};
use flowbot::driver::{DriverError, MemoryDriver};
use flowbot::execution::{
    CycleOutcome, CycleSupervisor, Namespace, RecoverableFault, SupervisorConfig,
    SupervisorError,
};
use flowbot::logging::MemorySink;
use std::sync::Arc;

/// Step that pokes the resource with a script
struct Probe;

#[async_trait]
impl Step for Probe {
    fn name(&self) -> &str {
        "Probe"
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        ctx.driver.evaluate("probe()").await?;
        Ok(StepOutcome::Continue)
    }
}

async fn supervisor(
    config: SupervisorConfig,
    driver: &Arc<MemoryDriver>,
) -> (CycleSupervisor, MemorySink) {
    let trace = trace();
    let mut registry = recording_registry(&["After"], &trace);
    registry.register_step(Namespace::Core, "Probe", || Box::new(Probe));
    let flow = compose("[Probe, After]", &registry).await.unwrap();
    let (ctx, sink) = context_with_sink(driver);
    (CycleSupervisor::new(config, flow, ctx), sink)
}

/// A timeout is recovered by one reload and shortens the next delay
#[tokio::test(start_paused = true)]
async fn test_timeout_recovers_with_short_delay() {
    let driver = Arc::new(MemoryDriver::new());
    driver.push_evaluate_failure(DriverError::timeout("probe()", 60));
    let (mut supervisor, sink) = supervisor(SupervisorConfig::default(), &driver).await;

    let report = supervisor.run_cycle().await.unwrap();

    assert_eq!(report.outcome, CycleOutcome::Recovered(RecoverableFault::Timeout));
    assert_eq!(report.delay, Timespan::from_secs(10));
    assert_eq!(driver.reload_count(), 1);
    assert_eq!(supervisor.failures(), 1);

    let lines = sink.trimmed();
    assert!(lines.iter().any(|l| l == "[Probe]"));
    assert!(lines.iter().any(|l| l == "Encountered error:"));
    assert!(lines.iter().any(|l| l == "Reloading page due to timeout..."));
    assert_eq!(lines.last().map(String::as_str), Some("[end]"));
    assert_eq!(supervisor.context().logger.depth(), 0);

    let report = supervisor.run_cycle().await.unwrap();
    assert_eq!(report.outcome, CycleOutcome::Succeeded);
    assert_eq!(report.delay, Timespan::from_secs(15 * 60));
    assert_eq!(supervisor.failures(), 0);
}

/// Failing reloads back off linearly, then the run gives up
#[tokio::test(start_paused = true)]
async fn test_failed_reloads_exhaust_the_budget() {
    let driver = Arc::new(MemoryDriver::new());
    driver.push_evaluate_failure(DriverError::ContextDestroyed);
    for _ in 0..3 {
        driver.push_reload_result(Err(DriverError::timeout("reload", 60)));
    }
    let (mut supervisor, sink) = supervisor(SupervisorConfig::default(), &driver).await;
    let started = tokio::time::Instant::now();

    let result = supervisor.run_cycle().await;

    match result {
        Err(SupervisorError::ReloadExhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected reload exhaustion, got {:?}", other.map(|r| r.outcome)),
    }
    assert_eq!(driver.reload_count(), 3);
    // 15s after the first failure, 30s after the second
    assert_eq!(started.elapsed(), std::time::Duration::from_secs(45));

    let lines = sink.trimmed();
    assert!(lines.iter().any(|l| l == "Reloading page due to navigation..."));
    assert!(lines.iter().any(|l| l == "Retrying in 15s..."));
    assert!(lines.iter().any(|l| l == "Retrying in 30s..."));
    assert_eq!(lines.last().map(String::as_str), Some("Unrecoverable error. Exiting..."));
}

/// Non-driver errors end the run without touching the resource
#[tokio::test(start_paused = true)]
async fn test_script_error_is_fatal() {
    let driver = Arc::new(MemoryDriver::new());
    driver.push_evaluate_failure(DriverError::Script("probe is not defined".to_string()));
    let (mut supervisor, _sink) = supervisor(SupervisorConfig::default(), &driver).await;

    let result = supervisor.run().await;

    assert!(matches!(result, Err(SupervisorError::Fatal(_))));
    assert_eq!(driver.reload_count(), 0);
    assert_eq!(supervisor.cycles(), 1);
}

/// A bounded run sleeps the cycle delay between cycles only
#[tokio::test(start_paused = true)]
async fn test_bounded_run_sleeps_between_cycles() {
    let driver = Arc::new(MemoryDriver::new());
    let config = SupervisorConfig::default()
        .with_max_cycles(3)
        .with_cycle_delay(Timespan::from_secs(60));
    let (mut supervisor, _sink) = supervisor(config, &driver).await;
    let started = tokio::time::Instant::now();

    let cycles = supervisor.run().await.unwrap();

    assert_eq!(cycles, 3);
    assert_eq!(started.elapsed(), std::time::Duration::from_secs(120));
    assert_eq!(
        driver.calls().iter().filter(|c| c.as_str() == "evaluate:probe()").count(),
        3
    );
}
