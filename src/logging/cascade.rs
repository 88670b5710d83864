//! A logger that caches narration and only displays it once it becomes important.
//!
//! Blocks are opened/closed and nested. `log(data)` marks the current block and
//! every enclosing block important, which displays (root first) everything those
//! blocks buffered so far. For example:
//!
//! ```text
//! [ A,
//!   [B],
//!   [C, info(C1)],
//!   [D, info(D1), info(D2),
//!     [E, log(E1), info(E2)]
//!   ],
//!   A1,
//!   [F, info(F1)],
//!   [G, info(G1), log(G2), info(G3)]
//! ]
//! ```
//!
//! displays `A, D, D1, D2, E, E1, E2, A1, G, G1, G2, G3`. B, C and F never hold an
//! important entry, so their lines are dropped when they close.

use crate::core::error::ErrorReport;
use crate::logging::sink::{LogSink, StdoutSink};
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

#[derive(Debug)]
struct LogBlock {
    important: bool,
    level: usize,
    cached: Vec<String>,
}

/// Nested, buffering narration logger
pub struct CascadingLogger {
    blocks: Vec<LogBlock>,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for CascadingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadingLogger")
            .field("blocks", &self.blocks)
            .finish_non_exhaustive()
    }
}

impl Default for CascadingLogger {
    fn default() -> Self {
        Self::new(Arc::new(StdoutSink))
    }
}

impl CascadingLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            blocks: Vec::new(),
            sink,
        }
    }

    /// Number of open blocks
    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// Push a new block, recording `label` in it when given
    pub fn open(&mut self, label: Option<&str>) {
        let level = self.blocks.last().map_or(0, |parent| parent.level + 1);
        self.blocks.push(LogBlock {
            important: false,
            level,
            cached: Vec::new(),
        });

        if let Some(label) = label {
            self.info(label);
        }
    }

    /// Record `label` (when given) and pop the innermost block, dropping its buffer
    pub fn close(&mut self, label: Option<&str>) {
        if let Some(label) = label {
            self.info(label);
        }
        self.blocks.pop();
    }

    /// Pop blocks until only `depth` remain
    pub fn unwind_to(&mut self, depth: usize) {
        self.blocks.truncate(depth);
    }

    /// Record a non-important entry
    pub fn info(&mut self, data: impl Display) {
        self.append(data.to_string(), false);
    }

    /// Record an important entry, flushing the current block chain
    pub fn log(&mut self, data: impl Display) {
        self.append(data.to_string(), true);
    }

    /// Record an error with its full diagnostic text, as an important entry
    pub fn log_error(&mut self, error: &(dyn StdError + 'static)) {
        self.log(ErrorReport(error));
    }

    fn append(&mut self, data: String, important: bool) {
        let Some(current) = self.blocks.last() else {
            return;
        };
        let level = current.level;

        if !important && !current.important {
            if let Some(current) = self.blocks.last_mut() {
                current.cached.push(data);
            }
            return;
        }

        // Walk towards the root until an already-flushed block is found.
        let mut pending: Vec<Vec<String>> = Vec::new();
        for block in self.blocks.iter_mut().rev() {
            if block.important {
                break;
            }
            pending.push(
                block
                    .cached
                    .drain(..)
                    .flat_map(|entry| format_entry(&entry, block.level))
                    .collect(),
            );
            block.important = true;
        }

        let mut lines: Vec<String> = pending.into_iter().rev().flatten().collect();
        lines.extend(format_entry(&data, level));
        self.sink.write_lines(&lines);
    }
}

/// Split an entry into lines and indent each one for `level`.
///
/// Scope labels (`"[...]"`) sit one level shallower than their content.
pub fn format_entry(entry: &str, level: usize) -> Vec<String> {
    entry
        .split('\n')
        .map(|line| {
            let effective = if line.starts_with('[') {
                level.saturating_sub(1)
            } else {
                level
            };
            format!("{}{}", " ".repeat(effective * 2), line)
        })
        .collect()
}
