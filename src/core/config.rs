//! Bot configuration from YAML
//!
//! The embedded `default.yml` is deep-merged with the user's settings file:
//! mappings merge key by key, anything else is replaced by the user's value.

use crate::core::{error::FlowError, node::StepNode, step::StepConfig};
use crate::driver::{DriverConfig, SolverConfig};
use crate::execution::supervisor::SupervisorConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Built-in defaults
pub const DEFAULT_SETTINGS: &str = include_str!("default.yml");

/// Environment variable naming the settings file
pub const SETTINGS_ENV: &str = "FLOWBOT_SETTINGS";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    #[serde(default)]
    pub driver: DriverConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    /// The step tree, validated by [`AppConfig::flow`]
    #[serde(default)]
    flow: Value,

    /// Configuration slices keyed by step name (or config key)
    #[serde(default)]
    steps: Mapping,
}

impl AppConfig {
    /// Load a settings file on top of the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Parse user settings on top of the defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut merged: Value = serde_yaml::from_str(DEFAULT_SETTINGS)
            .context("Built-in defaults are not valid YAML")?;
        let user: Value = serde_yaml::from_str(yaml)?;
        if !user.is_null() {
            merge_yaml(&mut merged, user);
        }

        let config: AppConfig = serde_yaml::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults only
    pub fn defaults() -> Result<Self> {
        Self::from_yaml("")
    }

    /// Resolve and load the settings file.
    ///
    /// An explicit path must exist; the default location falls back to the
    /// built-in defaults when nothing is there.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            return Self::from_file(path);
        }
        match default_settings_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Self::defaults(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.flow()?;

        if self.supervisor.max_reload_attempts == 0 {
            anyhow::bail!("supervisor.max_reload_attempts must be at least 1");
        }

        if !self.steps.keys().all(|k| k.is_string()) {
            anyhow::bail!("steps keys must be step names");
        }

        Ok(())
    }

    /// The validated step tree
    pub fn flow(&self) -> Result<StepNode, FlowError> {
        if self.flow.is_null() {
            return Err(FlowError::InvalidConfig("no flow configured".to_string()));
        }
        StepNode::from_yaml(&self.flow)
    }

    /// The configuration slice stored under `key`
    pub fn step_config(&self, key: &str) -> StepConfig {
        let value = self.steps.get(key).cloned().unwrap_or(Value::Null);
        StepConfig::new(key, value)
    }

    /// Replace the flow tree
    pub fn with_flow(mut self, flow: &StepNode) -> Result<Self> {
        self.flow = serde_yaml::to_value(flow)?;
        Ok(self)
    }

    /// Set (replace) the slice stored under `key`
    pub fn with_step_config(mut self, key: &str, value: Value) -> Self {
        self.steps.insert(Value::String(key.to_string()), value);
        self
    }
}

/// `<config dir>/flowbot/settings.yml`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("flowbot").join("settings.yml"))
}

/// Deep-merge `overlay` into `base`
pub fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
