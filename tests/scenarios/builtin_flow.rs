//! Test: Built-in steps working together under the supervisor

use crate::helpers::*;
use async_trait::async_trait;
use flowbot::core::{AppConfig, ExecutionContext, FlowError, Timespan};
use flowbot::driver::{ChallengeSolver, DriverError, MemoryDriver};
use flowbot::execution::{CompiledStep, Composer, CycleSupervisor, Namespace, Next, StepHandle};
use flowbot::logging::MemorySink;
use flowbot::steps::builtin_registry;
use serde_json::json;
use std::sync::Arc;

/// Solver that always reads the same text
struct FixedSolver(&'static str);

#[async_trait]
impl ChallengeSolver for FixedSolver {
    async fn solve(&self, _image: &[u8]) -> Result<String, DriverError> {
        Ok(self.0.to_string())
    }
}

/// Produces a new event on the resource, as the triggered action would
struct NewEvent {
    driver: Arc<MemoryDriver>,
}

#[async_trait]
impl CompiledStep for NewEvent {
    async fn call(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> Result<(), FlowError> {
        self.driver.bump_event_id();
        next.run(ctx).await
    }
}

async fn supervisor(settings: &str, driver: &Arc<MemoryDriver>) -> (CycleSupervisor, MemorySink) {
    let config = AppConfig::from_yaml(settings).unwrap();
    let mut registry = builtin_registry(Arc::new(FixedSolver("abcde")));
    let event_driver = driver.clone();
    registry.register_fn(Namespace::Core, "NewEvent", move |_| {
        Ok(Arc::new(NewEvent { driver: event_driver.clone() }) as StepHandle)
    });

    let flow = Composer::new(&registry, &config).compose_flow().await.unwrap();
    let (ctx, sink) = context_with_sink(driver);
    (CycleSupervisor::new(config.supervisor.clone(), flow, ctx), sink)
}

fn evaluated(driver: &MemoryDriver, script: &str) -> bool {
    driver.calls().iter().any(|c| *c == format!("evaluate:{}", script))
}

/// Maintenance reloads, skips the rest of the pass and waits ten minutes
#[tokio::test(start_paused = true)]
async fn test_maintenance_cuts_the_cycle_short() {
    let driver = Arc::new(MemoryDriver::new());
    driver.add_class("body", "PageMaintenance");
    driver.add_element("#trigger");
    let (mut supervisor, sink) = supervisor("", &driver).await;

    let report = supervisor.run_cycle().await.unwrap();

    assert_eq!(report.delay, Timespan::from_secs(10 * 60));
    assert_eq!(driver.reload_count(), 1);
    assert!(!evaluated(&driver, "trigger()"));
    assert!(sink.trimmed().iter().any(|l| l == "Maintenance detected."));
}

/// With nothing else going on the action is triggered and confirmed
#[tokio::test(start_paused = true)]
async fn test_action_is_triggered() {
    let driver = Arc::new(MemoryDriver::new());
    driver.add_element("#trigger");
    let (mut supervisor, sink) = supervisor("", &driver).await;

    let report = supervisor.run_cycle().await.unwrap();

    assert_eq!(report.delay, Timespan::from_secs(15 * 60));
    assert!(evaluated(&driver, "trigger()"));
    assert!(driver.calls().iter().any(|c| c == "wait:activeturn"));
    let lines = sink.trimmed();
    assert!(lines.iter().any(|l| l == "[TriggerAction]"));
    assert!(lines.iter().any(|l| l == "Done!"));
}

/// A pending reward blocks the action and is solved instead
#[tokio::test(start_paused = true)]
async fn test_pending_reward_is_solved_first() {
    let driver = Arc::new(MemoryDriver::new());
    driver.add_element("#trigger");
    driver.set_reward_pending(true);
    driver.set_image("#challengeImage", vec![0x89, 0x50, 0x4e, 0x47]);
    driver.clear_reward_on("submitChallenge()");
    let (mut supervisor, sink) = supervisor("flow: [TriggerAction, SolveChallenge]", &driver).await;

    let report = supervisor.run_cycle().await.unwrap();

    assert_eq!(report.delay, Timespan::from_secs(1));
    assert!(!evaluated(&driver, "trigger()"));
    assert_eq!(driver.input_value("#challengeInput").as_deref(), Some("abcde"));
    assert!(evaluated(&driver, "resume()"));
    assert!(sink.trimmed().iter().any(|l| l == "Challenge solved!"));
}

/// A new event is narrated and the environment modules see the user snapshot
#[tokio::test(start_paused = true)]
async fn test_new_event_runs_environment_modules() {
    let settings = r#"
flow: [NewEvent, TriggerAction, UpdateEnvironment]
steps:
  UpdateEnvironment:
    show_latest_event: true
    latest_event_script: "latestEvent()"
    modules: [ReportLocation]
"#;
    let driver = Arc::new(MemoryDriver::new());
    driver.add_element("#trigger");
    driver.set_script_result("latestEvent()", json!("Caught a pike in the marsh."));
    driver.set_user(json!({"environment_name": "marsh"}));
    let (mut supervisor, sink) = supervisor(settings, &driver).await;

    supervisor.run_cycle().await.unwrap();

    assert!(!evaluated(&driver, "trigger()"));
    let lines = sink.trimmed();
    assert!(lines.iter().any(|l| l == "New event ID: 2"));
    assert!(lines.iter().any(|l| l == "> Caught a pike in the marsh."));
    assert!(lines.iter().any(|l| l == "[ReportLocation]"));
    assert!(lines.iter().any(|l| l == "environment_name: marsh"));
    assert_eq!(supervisor.context().user(), None);

    // Same location on the next event: nothing new to report
    sink.clear();
    supervisor.run_cycle().await.unwrap();

    let lines = sink.trimmed();
    assert!(lines.iter().any(|l| l == "New event ID: 3"));
    assert!(!lines.iter().any(|l| l.starts_with("environment_name")));
}

/// Unknown environment modules are caught while composing
#[tokio::test]
async fn test_unknown_module_fails_composition() {
    let config = AppConfig::from_yaml("steps: {UpdateEnvironment: {modules: [Nowhere]}}").unwrap();
    let registry = builtin_registry(Arc::new(FixedSolver("abcde")));

    let result = Composer::new(&registry, &config).compose_flow().await;

    assert!(matches!(result, Err(FlowError::StepLoad { .. })));
}
