//! CLI output formatting

use crate::core::node::StepNode;
use crate::execution::SupervisorError;
use crate::core::ErrorReport;

// Re-export style
pub use console::style;
use console::Emoji;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Render a step tree, one node per line
pub fn format_tree(node: &StepNode) -> String {
    let mut lines = Vec::new();
    push_tree(node, 0, &mut lines);
    lines.join("\n")
}

fn push_tree(node: &StepNode, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match node {
        StepNode::Leaf(name) => lines.push(format!("{}- {}", indent, name)),
        StepNode::Sequence(children) => {
            let inner = if depth == 0 {
                depth
            } else {
                lines.push(format!("{}- sequence", indent));
                depth + 1
            };
            for child in children {
                push_tree(child, inner, lines);
            }
        }
        StepNode::Loop(children) => {
            lines.push(format!("{}- {}", indent, style("loop").cyan()));
            for child in children {
                push_tree(child, depth + 1, lines);
            }
        }
    }
}

/// Describe why the supervisor stopped
pub fn format_supervisor_error(error: &SupervisorError) -> String {
    let headline = match error {
        SupervisorError::Fatal(_) => style("Unrecoverable error").red().bold(),
        SupervisorError::ReloadExhausted { .. } => style("Reloaded too many times").red().bold(),
    };
    format!("{} {}\n{}", CROSS, headline, ErrorReport(error))
}

/// Format a list of names under a heading
pub fn format_names(heading: &str, names: &[&str]) -> String {
    let mut out = format!("{} {}:", INFO, style(heading).bold());
    if names.is_empty() {
        out.push_str(&format!("\n  {}", style("none").dim()));
    }
    for name in names {
        out.push_str(&format!("\n  {}", name));
    }
    out
}
