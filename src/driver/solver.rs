//! Challenge solving: an opaque `solve(image) -> guess` collaborator

use crate::driver::subprocess::run_helper;
use crate::driver::DriverError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Turns a challenge image into a guess
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    async fn solve(&self, image: &[u8]) -> Result<String, DriverError>;
}

/// Configuration for the external solver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Solver executable; the image is written to its stdin
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Solver that pipes the image to a helper command and reads the guess from stdout
#[derive(Debug, Clone)]
pub struct SubprocessSolver {
    command: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl SubprocessSolver {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            command: config
                .command
                .clone()
                .unwrap_or_else(|| "challenge-solver".to_string()),
            args: config.args.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl ChallengeSolver for SubprocessSolver {
    async fn solve(&self, image: &[u8]) -> Result<String, DriverError> {
        let stdout = run_helper(&self.command, &self.args, Some(image), self.timeout_secs).await?;
        let guess = String::from_utf8(stdout).map_err(|e| DriverError::Decode(e.to_string()))?;
        Ok(guess.trim().to_string())
    }
}
