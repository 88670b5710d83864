//! Composer - compiles a step tree into one dispatchable step

use crate::core::{
    config::AppConfig,
    error::FlowError,
    node::StepNode,
    step::StepInit,
};
use crate::execution::{
    dispatch::{Loop, Sequence, StepHandle},
    executor::LeafStep,
    registry::{Namespace, StepFactoryKind, StepRegistry},
};
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds compiled steps from the registry and the configuration
///
/// Every call creates fresh step instances; two compositions of the same tree
/// share no step state.
pub struct Composer<'a> {
    registry: &'a StepRegistry,
    config: &'a AppConfig,
}

impl<'a> Composer<'a> {
    pub fn new(registry: &'a StepRegistry, config: &'a AppConfig) -> Self {
        Self { registry, config }
    }

    /// Compile the configured flow
    pub async fn compose_flow(&self) -> Result<StepHandle, FlowError> {
        let flow = self.config.flow()?;
        info!("Composing flow: {}", flow);
        self.compose(&flow, Namespace::Core).await
    }

    /// Compile `node`, resolving leaves in `namespace`
    pub fn compose<'s>(
        &'s self,
        node: &'s StepNode,
        namespace: Namespace,
    ) -> BoxFuture<'s, Result<StepHandle, FlowError>> {
        Box::pin(async move {
            match node {
                StepNode::Leaf(name) => self.load_leaf(name, namespace).await,
                StepNode::Sequence(children) => {
                    let steps = self.compose_all(children, namespace).await?;
                    Ok(Arc::new(Sequence::new(steps)) as StepHandle)
                }
                StepNode::Loop(children) => {
                    if children.is_empty() {
                        return Err(FlowError::InvalidShape("loop with an empty body".to_string()));
                    }
                    let steps = self.compose_all(children, namespace).await?;
                    Ok(Arc::new(Loop::new(Sequence::new(steps))) as StepHandle)
                }
            }
        })
    }

    async fn compose_all(
        &self,
        children: &[StepNode],
        namespace: Namespace,
    ) -> Result<Vec<StepHandle>, FlowError> {
        let mut steps = Vec::with_capacity(children.len());
        for child in children {
            steps.push(self.compose(child, namespace).await?);
        }
        Ok(steps)
    }

    /// Instantiate and initialize the step registered as `name`
    pub fn load_leaf<'s>(
        &'s self,
        name: &'s str,
        namespace: Namespace,
    ) -> BoxFuture<'s, Result<StepHandle, FlowError>> {
        Box::pin(async move {
            debug!("Loading step {} ({})", name, namespace);

            match self.registry.resolve(name, namespace)? {
                StepFactoryKind::Lifecycle(factory) => {
                    let mut step = factory();
                    let key = step.config_key().to_string();
                    let init = StepInit::new(self.config.step_config(&key), self);
                    step.initialize(&init).await?;
                    Ok(Arc::new(LeafStep::new(step)) as StepHandle)
                }
                StepFactoryKind::Function(factory) => factory(&self.config.step_config(name)),
            }
        })
    }
}
