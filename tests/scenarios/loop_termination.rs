//! Test: Loop termination - repeat-until-break

use crate::helpers::*;
use flowbot::execution::{Namespace, StepRegistry};

fn registry_with_counter(trace: &Trace, names: &[&str], break_after: usize) -> StepRegistry {
    let mut registry = recording_registry(names, trace);
    let counter_trace = trace.clone();
    registry.register_step(Namespace::Core, "Counter", move || {
        Box::new(RecordingStep::new("Counter", &counter_trace).breaking_after(break_after))
    });
    registry
}

/// A break requested on pass k stops the loop after exactly k passes
#[tokio::test]
async fn test_loop_stops_after_k_passes() {
    let trace = trace();
    let registry = registry_with_counter(&trace, &["Head", "Tail", "After"], 3);
    let flow = compose("[Head, [[Counter, Tail]], After]", &registry).await.unwrap();
    let mut ctx = context();

    run_once(&flow, &mut ctx).await.unwrap();

    assert_eq!(
        entries(&trace),
        vec!["Head", "Counter", "Tail", "Counter", "Tail", "Counter", "Tail", "After"]
    );
    assert!(!ctx.break_requested());
}

/// Aborting inside the loop body only ends the current pass
#[tokio::test]
async fn test_abort_inside_loop_restarts_the_pass() {
    let trace = trace();
    let mut registry = registry_with_counter(&trace, &["Never", "After"], 2);
    let skip_trace = trace.clone();
    registry.register_step(Namespace::Core, "Skip", move || {
        Box::new(RecordingStep::new("Skip", &skip_trace).aborting())
    });
    let flow = compose("[[[Counter, Skip, Never]], After]", &registry).await.unwrap();

    run_once(&flow, &mut context()).await.unwrap();

    assert_eq!(entries(&trace), vec!["Counter", "Skip", "Counter", "Skip", "After"]);
}

/// A loop-only flow is a loop, not a sequence holding one list
#[tokio::test]
async fn test_top_level_loop() {
    let trace = trace();
    let registry = registry_with_counter(&trace, &[], 2);
    let flow = compose("[[Counter]]", &registry).await.unwrap();

    run_once(&flow, &mut context()).await.unwrap();

    assert_eq!(entries(&trace), vec!["Counter", "Counter"]);
}

/// A break already pending when the loop starts skips the body and is consumed
#[tokio::test]
async fn test_pending_break_skips_the_loop() {
    let trace = trace();
    let registry = registry_with_counter(&trace, &["After"], 1);
    let flow = compose("[[[Counter]], After]", &registry).await.unwrap();
    let mut ctx = context();

    ctx.request_break();
    run_once(&flow, &mut ctx).await.unwrap();

    assert_eq!(entries(&trace), vec!["After"]);
    assert!(!ctx.break_requested());
}
