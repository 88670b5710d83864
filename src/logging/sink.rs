//! Destinations for flushed narration lines

use std::sync::{Arc, Mutex, PoisonError};

/// Receives lines the cascading logger decided to display
pub trait LogSink: Send + Sync {
    fn write_lines(&self, lines: &[String]);
}

/// Prints to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_lines(&self, lines: &[String]) {
        if !lines.is_empty() {
            println!("{}", lines.join("\n"));
        }
    }
}

/// Collects lines in memory; clones share the same buffer
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Lines with indentation stripped
    pub fn trimmed(&self) -> Vec<String> {
        self.lines().iter().map(|l| l.trim_start().to_string()).collect()
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl LogSink for MemorySink {
    fn write_lines(&self, lines: &[String]) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(lines.iter().cloned());
    }
}
