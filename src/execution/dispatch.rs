//! Continuation-passing dispatch for compiled steps
//!
//! Every compiled node is a [`CompiledStep`]: an async function of the context
//! and a continuation ([`Next`]). A sequence hands element *i* a continuation
//! that dispatches element *i + 1*; past the last element it invokes the
//! sequence's own continuation.

use crate::core::{context::ExecutionContext, error::FlowError};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// A compiled node of the flow tree
#[async_trait]
pub trait CompiledStep: Send + Sync {
    /// Perform this node's effect; call `next.run(ctx)` to proceed.
    ///
    /// Returning without calling `next` truncates the rest of the enclosing
    /// sequence for this pass.
    async fn call(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> Result<(), FlowError>;
}

/// Shared handle to a compiled node
pub type StepHandle = Arc<dyn CompiledStep>;

/// Continuation handed to a compiled step
///
/// Each continuation may be invoked at most once; a second invocation (of this
/// or of any earlier continuation of the same sequence pass) fails with
/// [`FlowError::NextCalledMultipleTimes`] without running anything.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    target: Option<(&'a Dispatch<'a>, usize)>,
}

impl<'a> Next<'a> {
    /// A continuation that does nothing
    pub fn end() -> Self {
        Next { target: None }
    }

    pub fn is_end(&self) -> bool {
        self.target.is_none()
    }

    /// Hand control to the next step
    pub async fn run(self, ctx: &mut ExecutionContext) -> Result<(), FlowError> {
        match self.target {
            Some((dispatch, index)) => dispatch.dispatch(index, ctx).await,
            None => Ok(()),
        }
    }
}

/// One pass over a sequence of steps
pub struct Dispatch<'a> {
    steps: &'a [StepHandle],
    outer: Next<'a>,
    last_index: AtomicIsize,
}

impl<'a> Dispatch<'a> {
    pub fn new(steps: &'a [StepHandle], outer: Next<'a>) -> Self {
        Self {
            steps,
            outer,
            last_index: AtomicIsize::new(-1),
        }
    }

    /// Run element `index`, or the outer continuation once past the end
    pub fn dispatch<'s>(
        &'s self,
        index: usize,
        ctx: &'s mut ExecutionContext,
    ) -> BoxFuture<'s, Result<(), FlowError>> {
        Box::pin(async move {
            let previous = self.last_index.fetch_max(index as isize, Ordering::SeqCst);
            if previous >= index as isize {
                error!("Continuation for index {} invoked again (last dispatched: {})", index, previous);
                return Err(FlowError::NextCalledMultipleTimes);
            }

            match self.steps.get(index) {
                Some(step) => {
                    debug!("Dispatching step {}/{}", index + 1, self.steps.len());
                    let next = Next {
                        target: Some((self, index + 1)),
                    };
                    step.call(ctx, next).await
                }
                None => self.outer.run(ctx).await,
            }
        })
    }
}

/// Plain sequence: run elements in order, then the outer continuation
pub struct Sequence {
    steps: Vec<StepHandle>,
}

impl Sequence {
    pub fn new(steps: Vec<StepHandle>) -> Self {
        Self { steps }
    }
}

#[async_trait]
impl CompiledStep for Sequence {
    async fn call(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> Result<(), FlowError> {
        let dispatch = Dispatch::new(&self.steps, next);
        dispatch.dispatch(0, ctx).await
    }
}

/// Repeats its inner sequence until the context requests a break
pub struct Loop {
    body: Sequence,
}

impl Loop {
    pub fn new(body: Sequence) -> Self {
        Self { body }
    }
}

#[async_trait]
impl CompiledStep for Loop {
    async fn call(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> Result<(), FlowError> {
        let mut passes = 0usize;
        while !ctx.break_requested() {
            passes += 1;
            self.body.call(ctx, Next::end()).await?;
        }
        ctx.take_break();
        debug!("Loop finished after {} passes", passes);
        next.run(ctx).await
    }
}
