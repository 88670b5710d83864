//! Environment module reporting changes in the user's location fields

use crate::core::{
    context::ExecutionContext,
    error::FlowError,
    step::{Step, StepInit, StepOutcome},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Remembers the last value seen per key
#[derive(Debug, Default)]
pub struct ChangeCache {
    values: HashMap<String, Value>,
}

impl ChangeCache {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Store `value` under `key`, returning whether it differs from the previous one
    pub fn has_changed(&mut self, key: &str, value: &Value) -> bool {
        if self.values.get(key) == Some(value) {
            return false;
        }
        self.values.insert(key.to_string(), value.clone());
        true
    }
}

/// Look up a dotted path (`"a.b.c"`) in a JSON document
pub fn lookup<'v>(document: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(document, |value, segment| match value {
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => value.get(segment),
        })
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "none".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ReportLocationConfig {
    #[serde(default = "default_fields")]
    fields: Vec<String>,
}

fn default_fields() -> Vec<String> {
    vec!["environment_name".to_string()]
}

#[derive(Debug)]
pub struct ReportLocation {
    fields: Vec<String>,
    cache: ChangeCache,
}

impl Default for ReportLocation {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            cache: ChangeCache::default(),
        }
    }
}

#[async_trait]
impl Step for ReportLocation {
    fn name(&self) -> &str {
        "ReportLocation"
    }

    async fn initialize(&mut self, init: &StepInit<'_>) -> Result<(), FlowError> {
        let config: ReportLocationConfig = init.parse()?;
        self.fields = config.fields;
        Ok(())
    }

    async fn should_run(&mut self, ctx: &ExecutionContext) -> Result<bool, FlowError> {
        Ok(ctx.user().is_some())
    }

    async fn run(&mut self, ctx: &mut ExecutionContext) -> Result<StepOutcome, FlowError> {
        let Some(user) = ctx.user().cloned() else {
            return Ok(StepOutcome::Continue);
        };

        for field in &self.fields {
            let value = lookup(&user, field).cloned().unwrap_or(Value::Null);
            if self.cache.has_changed(field, &value) {
                ctx.logger.log(format!("{}: {}", field, display(&value)));
            }
        }

        Ok(StepOutcome::Continue)
    }
}
