//! Subprocess driver - calls a helper executable once per operation

use crate::driver::{DriverConfig, DriverError, ResourceDriver};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Exit code a helper uses to say "reload me and try again" (EX_TEMPFAIL)
pub const EXIT_RELOAD_REQUESTED: i32 = 75;

/// Run `program args...`, optionally feeding `input` on stdin, and return stdout.
///
/// # Errors
/// Returns `DriverError` if:
/// - The executable cannot be spawned
/// - The command does not finish within `timeout_secs`
/// - It exits with a non-zero status (classified from exit code and stderr)
pub async fn run_helper(
    program: &str,
    args: &[String],
    input: Option<&[u8]>,
    timeout_secs: u64,
) -> Result<Vec<u8>, DriverError> {
    let operation = args.last().cloned().unwrap_or_else(|| program.to_string());
    debug!("Spawning {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| DriverError::Command(format!("Failed to spawn {}: {}", program, e)))?;

    let stdin = child.stdin.take();
    let feed = async move {
        let (Some(bytes), Some(mut stdin)) = (input, stdin) else {
            return Ok(());
        };
        match stdin.write_all(bytes).await {
            // the helper may exit without reading all of its input
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
            result => result,
        }
    };

    // stdin is fed while stdout is drained so neither pipe can fill up,
    // and both run under the same deadline
    let (fed, output) = timeout(Duration::from_secs(timeout_secs), async {
        tokio::join!(feed, child.wait_with_output())
    })
    .await
    .map_err(|_| DriverError::timeout(operation.clone(), timeout_secs))?;

    fed.map_err(|e| DriverError::Command(format!("Failed to write to {}: {}", program, e)))?;
    let output =
        output.map_err(|e| DriverError::Command(format!("Failed to run {}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let exit_code = output.status.code().unwrap_or(-1);
        warn!("{} exited with code {}: {}", program, exit_code, stderr);
        return Err(classify_failure(&operation, exit_code, &stderr, timeout_secs));
    }

    debug!("{} returned {} bytes of output", program, output.stdout.len());
    Ok(output.stdout)
}

/// Map a failed helper invocation onto a driver error
pub fn classify_failure(operation: &str, exit_code: i32, stderr: &str, timeout_secs: u64) -> DriverError {
    if exit_code == EXIT_RELOAD_REQUESTED {
        DriverError::ReloadRequested(stderr.to_string())
    } else if stderr.contains("Execution context was destroyed") {
        DriverError::ContextDestroyed
    } else if stderr.contains("Timeout") || stderr.contains("timeout") {
        DriverError::timeout(operation, timeout_secs)
    } else {
        DriverError::Script(format!("exit code {}: {}", exit_code, stderr))
    }
}

/// Driver backed by an external helper command
///
/// Each operation runs `<command> <args...> <operation> <operands...>`; stdout
/// carries the JSON result (raw bytes for `capture`).
#[derive(Debug, Clone)]
pub struct SubprocessDriver {
    command: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl SubprocessDriver {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            command: config.command_or_default(),
            args: config.args.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    #[cfg(test)]
    pub fn command(&self) -> &str {
        &self.command
    }

    async fn invoke(&self, operation: &str, operands: &[&str]) -> Result<Vec<u8>, DriverError> {
        let mut args = self.args.clone();
        args.push(operation.to_string());
        args.extend(operands.iter().map(|s| s.to_string()));
        run_helper(&self.command, &args, None, self.timeout_secs).await
    }

    async fn invoke_json(&self, operation: &str, operands: &[&str]) -> Result<Value, DriverError> {
        let stdout = self.invoke(operation, operands).await?;
        parse_json_output(&stdout)
    }
}

/// Decode helper stdout as JSON; empty output is `null`
pub fn parse_json_output(stdout: &[u8]) -> Result<Value, DriverError> {
    let text = std::str::from_utf8(stdout).map_err(|e| DriverError::Decode(e.to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| DriverError::Decode(format!("{}: {}", e, text)))
}

fn expect_bool(value: Value, operation: &str) -> Result<bool, DriverError> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(DriverError::Decode(format!(
            "{} returned {} instead of a boolean",
            operation, other
        ))),
    }
}

#[async_trait]
impl ResourceDriver for SubprocessDriver {
    async fn reload(&self) -> Result<(), DriverError> {
        self.invoke("reload", &[]).await.map(|_| ())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
        self.invoke_json("evaluate", &[script]).await
    }

    async fn has_element(&self, selector: &str) -> Result<bool, DriverError> {
        let value = self.invoke_json("has-element", &[selector]).await?;
        expect_bool(value, "has-element")
    }

    async fn element_has_class(&self, selector: &str, class: &str) -> Result<bool, DriverError> {
        let value = self.invoke_json("has-class", &[selector, class]).await?;
        expect_bool(value, "has-class")
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        self.invoke("fill", &[selector, text]).await.map(|_| ())
    }

    async fn capture(&self, selector: &str) -> Result<Vec<u8>, DriverError> {
        self.invoke("capture", &[selector]).await
    }

    async fn wait_for_response(&self, url_fragment: &str) -> Result<(), DriverError> {
        self.invoke("wait-response", &[url_fragment]).await.map(|_| ())
    }

    async fn latest_event_id(&self) -> Result<Value, DriverError> {
        self.invoke_json("latest-event-id", &[]).await
    }

    async fn reward_pending(&self) -> Result<bool, DriverError> {
        let value = self.invoke_json("reward-pending", &[]).await?;
        expect_bool(value, "reward-pending")
    }

    async fn user(&self) -> Result<Value, DriverError> {
        self.invoke_json("user", &[]).await
    }
}
