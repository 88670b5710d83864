//! Driver configuration

use serde::{Deserialize, Serialize};

/// Which driver backs the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// External helper command, one invocation per operation
    #[default]
    Subprocess,
    /// In-process scripted resource (rehearsals and tests)
    Memory,
}

/// Configuration for the resource driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub kind: DriverKind,

    /// Path to the helper executable
    ///
    /// If not provided, defaults to "page-driver" (assumes it's on PATH).
    #[serde(default)]
    pub command: Option<String>,

    /// Extra arguments placed before the operation name
    #[serde(default)]
    pub args: Vec<String>,

    /// Timeout for a single operation in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: DriverKind::default(),
            command: None,
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, command: String) -> Self {
        self.command = Some(command);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_kind(mut self, kind: DriverKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn command_or_default(&self) -> String {
        self.command.clone().unwrap_or_else(|| "page-driver".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_config_builder() {
        let config = DriverConfig::new()
            .with_command("/opt/driver".to_string())
            .with_timeout(30)
            .with_kind(DriverKind::Memory);

        assert_eq!(config.command, Some("/opt/driver".to_string()));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.kind, DriverKind::Memory);
    }

    #[test]
    fn test_driver_config_defaults_from_yaml() {
        let config: DriverConfig = serde_yaml::from_str("kind: subprocess").unwrap();
        assert_eq!(config.command_or_default(), "page-driver");
        assert_eq!(config.timeout_secs, 60);
        assert!(config.args.is_empty());
    }
}
