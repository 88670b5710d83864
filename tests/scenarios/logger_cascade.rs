//! Test: Narration cascade across steps of a composed flow

use crate::helpers::*;
use flowbot::driver::MemoryDriver;
use flowbot::execution::{Namespace, StepRegistry};
use std::sync::Arc;

fn narrating_registry() -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry
        .register_step(Namespace::Core, "Quiet", || {
            Box::new(NarratingStep::new("Quiet").info("nothing to do"))
        })
        .register_step(Namespace::Core, "Loud", || {
            Box::new(NarratingStep::new("Loud").info("looking around").log("found it"))
        })
        .register_step(Namespace::Core, "Later", || {
            Box::new(NarratingStep::new("Later").info("still nothing"))
        });
    registry
}

/// Only the chain leading to an important line is shown; quiet siblings vanish
#[tokio::test]
async fn test_only_important_chains_are_shown() {
    let flow = compose("[Quiet, Loud, Later]", &narrating_registry()).await.unwrap();
    let (mut ctx, sink) = context_with_sink(&Arc::new(MemoryDriver::new()));

    ctx.logger.open(Some("[start]"));
    run_once(&flow, &mut ctx).await.unwrap();
    ctx.logger.close(Some("[end]"));

    assert_eq!(
        sink.lines(),
        vec!["[start]", "[Loud]", "  looking around", "  found it", "[end]"]
    );
}

/// A cycle where nothing important happens prints nothing at all
#[tokio::test]
async fn test_quiet_cycle_prints_nothing() {
    let flow = compose("[Quiet, Later]", &narrating_registry()).await.unwrap();
    let (mut ctx, sink) = context_with_sink(&Arc::new(MemoryDriver::new()));

    ctx.logger.open(Some("[start]"));
    run_once(&flow, &mut ctx).await.unwrap();
    ctx.logger.close(Some("[end]"));

    assert!(sink.lines().is_empty());
}

/// Steps inside a loop narrate under the same cycle scope on every pass
#[tokio::test]
async fn test_loop_passes_share_the_cycle_scope() {
    let trace = trace();
    let mut registry = narrating_registry();
    let counter_trace = trace.clone();
    registry.register_step(Namespace::Core, "Counter", move || {
        Box::new(RecordingStep::new("Counter", &counter_trace).breaking_after(2))
    });
    let flow = compose("[[[Counter, Loud]]]", &registry).await.unwrap();
    let (mut ctx, sink) = context_with_sink(&Arc::new(MemoryDriver::new()));

    ctx.logger.open(Some("[start]"));
    run_once(&flow, &mut ctx).await.unwrap();

    assert_eq!(
        sink.lines(),
        vec![
            "[start]",
            "[Loud]",
            "  looking around",
            "  found it",
            "[Loud]",
            "  looking around",
            "  found it",
        ]
    );
    assert_eq!(ctx.logger.depth(), 1);
}
