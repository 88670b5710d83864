//! Step registry - resolves step names to factories

use crate::core::{error::FlowError, step::{Step, StepConfig}};
use crate::execution::dispatch::StepHandle;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Where a step name is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Steps that make up the flow itself
    Core,
    /// Modules run by `UpdateEnvironment`
    Environment,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Core => write!(f, "core"),
            Namespace::Environment => write!(f, "env"),
        }
    }
}

type StepFactory = Arc<dyn Fn() -> Box<dyn Step> + Send + Sync>;
type FnFactory = Arc<dyn Fn(&StepConfig) -> Result<StepHandle, FlowError> + Send + Sync>;

/// How a registered name is turned into a compiled step
#[derive(Clone)]
pub enum StepFactoryKind {
    /// A lifecycle [`Step`], initialized and wrapped in a log scope
    Lifecycle(StepFactory),
    /// A raw compiled step built straight from its config slice
    Function(FnFactory),
}

/// Name → factory map for both namespaces
#[derive(Clone, Default)]
pub struct StepRegistry {
    entries: BTreeMap<(Namespace, String), StepFactoryKind>,
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lifecycle step; `factory` must return a fresh instance per call
    pub fn register_step<F>(&mut self, namespace: Namespace, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Step> + Send + Sync + 'static,
    {
        self.entries.insert(
            (namespace, name.to_string()),
            StepFactoryKind::Lifecycle(Arc::new(factory)),
        );
        self
    }

    /// Register a function-style step built from its config slice
    pub fn register_fn<F>(&mut self, namespace: Namespace, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&StepConfig) -> Result<StepHandle, FlowError> + Send + Sync + 'static,
    {
        self.entries.insert(
            (namespace, name.to_string()),
            StepFactoryKind::Function(Arc::new(factory)),
        );
        self
    }

    pub fn resolve(&self, name: &str, namespace: Namespace) -> Result<&StepFactoryKind, FlowError> {
        self.entries
            .get(&(namespace, name.to_string()))
            .ok_or_else(|| {
                FlowError::step_load(name, format!("no step named \"{}\" in namespace {}", name, namespace))
            })
    }

    pub fn contains(&self, name: &str, namespace: Namespace) -> bool {
        self.entries.contains_key(&(namespace, name.to_string()))
    }

    /// Registered names in `namespace`, sorted
    pub fn names(&self, namespace: Namespace) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|(ns, _)| *ns == namespace)
            .map(|(_, name)| name.as_str())
            .collect()
    }
}
