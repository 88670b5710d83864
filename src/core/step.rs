//! Step contract

use crate::core::{context::ExecutionContext, error::FlowError};
use crate::execution::composer::Composer;
use crate::execution::dispatch::StepHandle;
use crate::execution::registry::Namespace;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_yaml::Value;

/// What the flow should do after a step ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Proceed to the next step
    Continue,
    /// Skip the remainder of the enclosing sequence for this pass
    Abort,
}

/// A single named unit of work
///
/// Lifecycle: `initialize` once before the first execution, then per pass
/// `should_run` followed (when true) by `run`.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    /// Key of this step's slice in the `steps` config section
    fn config_key(&self) -> &str {
        self.name()
    }

    /// Called once when the flow is composed
    async fn initialize(&mut self, _init: &StepInit<'_>) -> Result<(), FlowError> {
        Ok(())
    }

    /// Return false to skip this step
    async fn should_run(&mut self, _ctx: &ExecutionContext) -> Result<bool, FlowError> {
        Ok(true)
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        let _ = ctx;
        Err(FlowError::NotImplemented(format!("{}::run()", self.name())))
    }
}

/// A step's configuration slice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepConfig {
    key: String,
    value: Value,
}

impl StepConfig {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_null()
    }

    /// Deserialize the slice; a missing slice reads as an empty mapping
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, FlowError> {
        let value = if self.value.is_null() {
            Value::Mapping(Default::default())
        } else {
            self.value.clone()
        };

        serde_yaml::from_value(value)
            .map_err(|e| FlowError::InvalidConfig(format!("steps.{}: {}", self.key, e)))
    }
}

/// What a step receives when it is initialized
pub struct StepInit<'a> {
    pub config: StepConfig,
    composer: &'a Composer<'a>,
}

impl<'a> StepInit<'a> {
    pub fn new(config: StepConfig, composer: &'a Composer<'a>) -> Self {
        Self { config, composer }
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, FlowError> {
        self.config.parse()
    }

    /// Load and initialize another step by name from `namespace`
    pub async fn load(&self, name: &str, namespace: Namespace) -> Result<StepHandle, FlowError> {
        self.composer.load_leaf(name, namespace).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default = "default_limit")]
        limit: u32,
        mode: Option<String>,
    }

    fn default_limit() -> u32 {
        3
    }

    #[test]
    fn test_missing_slice_parses_as_defaults() {
        let config = StepConfig::new("Sample", Value::Null);
        let sample: Sample = config.parse().unwrap();
        assert_eq!(sample.limit, 3);
        assert!(sample.mode.is_none());
        assert!(config.is_missing());
    }

    #[test]
    fn test_invalid_slice_names_key() {
        let value: Value = serde_yaml::from_str("limit: many").unwrap();
        let config = StepConfig::new("Sample", value);
        let err = config.parse::<Sample>().unwrap_err();
        assert!(err.to_string().contains("steps.Sample"));
    }
}
