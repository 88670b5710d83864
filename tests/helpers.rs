//! Test utility functions for flowbot

#![allow(dead_code)]

use async_trait::async_trait;
use flowbot::core::{AppConfig, ExecutionContext, FlowError, Step, StepNode, StepOutcome};
use flowbot::driver::MemoryDriver;
use flowbot::execution::{CompiledStep, Composer, Namespace, Next, StepHandle, StepRegistry};
use flowbot::logging::{CascadingLogger, MemorySink};
use std::sync::{Arc, Mutex};

/// Shared record of which steps ran, in order
pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn trace() -> Trace {
    Arc::default()
}

pub fn entries(trace: &Trace) -> Vec<String> {
    trace.lock().unwrap().clone()
}

/// Lifecycle step that records its name and returns a fixed outcome
pub struct RecordingStep {
    name: String,
    trace: Trace,
    outcome: StepOutcome,
    break_after: Option<usize>,
    runs: usize,
}

impl RecordingStep {
    pub fn new(name: &str, trace: &Trace) -> Self {
        Self {
            name: name.to_string(),
            trace: trace.clone(),
            outcome: StepOutcome::Continue,
            break_after: None,
            runs: 0,
        }
    }

    pub fn aborting(mut self) -> Self {
        self.outcome = StepOutcome::Abort;
        self
    }

    /// Request a loop break on run number `runs`
    pub fn breaking_after(mut self, runs: usize) -> Self {
        self.break_after = Some(runs);
        self
    }
}

#[async_trait]
impl Step for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        self.runs += 1;
        self.trace.lock().unwrap().push(self.name.clone());
        if self.break_after == Some(self.runs) {
            ctx.request_break();
        }
        Ok(self.outcome)
    }
}

/// Raw compiled step that invokes its continuation twice
pub struct ContinueTwice;

#[async_trait]
impl CompiledStep for ContinueTwice {
    async fn call(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> Result<(), FlowError> {
        next.run(ctx).await?;
        next.run(ctx).await
    }
}

/// Step that narrates through the cascading logger
pub struct NarratingStep {
    name: String,
    lines: Vec<(bool, String)>,
}

impl NarratingStep {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn info(mut self, line: &str) -> Self {
        self.lines.push((false, line.to_string()));
        self
    }

    pub fn log(mut self, line: &str) -> Self {
        self.lines.push((true, line.to_string()));
        self
    }
}

#[async_trait]
impl Step for NarratingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        for (important, line) in &self.lines {
            if *important {
                ctx.logger.log(line);
            } else {
                ctx.logger.info(line);
            }
        }
        Ok(StepOutcome::Continue)
    }
}

/// Registry with a recording step for each name
pub fn recording_registry(names: &[&str], trace: &Trace) -> StepRegistry {
    let mut registry = StepRegistry::new();
    for name in names {
        let step_name = name.to_string();
        let trace = trace.clone();
        registry.register_step(Namespace::Core, name, move || {
            Box::new(RecordingStep::new(&step_name, &trace))
        });
    }
    registry
}

/// Compose a flow given in YAML against `registry`
pub async fn compose(flow_yaml: &str, registry: &StepRegistry) -> Result<StepHandle, FlowError> {
    let node = StepNode::from_yaml_str(flow_yaml)?;
    let config = AppConfig::default();
    Composer::new(registry, &config).compose(&node, Namespace::Core).await
}

/// Context over `driver` whose narration goes to the returned sink
pub fn context_with_sink(driver: &Arc<MemoryDriver>) -> (ExecutionContext, MemorySink) {
    let sink = MemorySink::new();
    let ctx = ExecutionContext::new(driver.clone(), CascadingLogger::new(Arc::new(sink.clone())));
    (ctx, sink)
}

pub fn context() -> ExecutionContext {
    context_with_sink(&Arc::new(MemoryDriver::new())).0
}

/// Run a compiled flow once with no outer continuation
pub async fn run_once(flow: &StepHandle, ctx: &mut ExecutionContext) -> Result<(), FlowError> {
    flow.call(ctx, Next::end()).await
}
