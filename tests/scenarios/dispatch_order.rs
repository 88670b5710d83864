//! Test: Dispatch order - sequences, continuations and early truncation

use crate::helpers::*;
use flowbot::core::FlowError;
use flowbot::execution::{Namespace, StepHandle};
use std::sync::Arc;

/// Every leaf of a flat sequence runs once, in declaration order
#[tokio::test]
async fn test_sequence_runs_in_declaration_order() {
    let trace = trace();
    let registry = recording_registry(&["A", "B", "C", "D"], &trace);
    let flow = compose("[A, B, C, D]", &registry).await.unwrap();

    run_once(&flow, &mut context()).await.unwrap();

    assert_eq!(entries(&trace), vec!["A", "B", "C", "D"]);
}

/// Nested sequences hand control back to their parent when they finish
#[tokio::test]
async fn test_nested_sequences_continue_outer() {
    let trace = trace();
    let registry = recording_registry(&["A", "B", "C", "D"], &trace);
    let flow = compose("[A, [B, [C]], D]", &registry).await.unwrap();

    run_once(&flow, &mut context()).await.unwrap();

    assert_eq!(entries(&trace), vec!["A", "B", "C", "D"]);
}

/// Invoking a continuation twice fails without running anything twice
#[tokio::test]
async fn test_continuation_called_twice_is_rejected() {
    let trace = trace();
    let mut registry = recording_registry(&["A", "B", "C"], &trace);
    registry.register_fn(Namespace::Core, "Twice", |_| Ok(Arc::new(ContinueTwice) as StepHandle));
    let flow = compose("[A, Twice, B, C]", &registry).await.unwrap();

    let result = run_once(&flow, &mut context()).await;

    assert!(matches!(result, Err(FlowError::NextCalledMultipleTimes)));
    assert_eq!(entries(&trace), vec!["A", "B", "C"]);
}

/// An aborting step stops its siblings and the enclosing sequence's continuation
#[tokio::test]
async fn test_abort_truncates_the_pass() {
    let trace = trace();
    let mut registry = recording_registry(&["A", "B", "C", "D"], &trace);
    let stop_trace = trace.clone();
    registry.register_step(Namespace::Core, "Stop", move || {
        Box::new(RecordingStep::new("Stop", &stop_trace).aborting())
    });
    let flow = compose("[A, [B, Stop, C], D]", &registry).await.unwrap();

    run_once(&flow, &mut context()).await.unwrap();

    assert_eq!(entries(&trace), vec!["A", "B", "Stop"]);
}

/// A typo in the flow is caught before anything runs
#[tokio::test]
async fn test_unknown_step_is_reported_by_name() {
    let trace = trace();
    let registry = recording_registry(&["A"], &trace);

    let result = compose("[A, Typo]", &registry).await;

    match result {
        Err(FlowError::StepLoad { name, .. }) => assert_eq!(name, "Typo"),
        Err(other) => panic!("expected a step load error, got {}", other),
        Ok(_) => panic!("expected a step load error"),
    }
    assert!(entries(&trace).is_empty());
}
