//! CLI command definitions

use clap::Args;

/// Run the flow
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Stop after this many cycles
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Use the in-memory driver instead of the configured one
    #[arg(long)]
    pub dry_run: bool,
}

/// Validate the settings
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output the composed tree in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List registered steps
#[derive(Debug, Args, Clone)]
pub struct StepsCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse a timespan literal
#[derive(Debug, Args, Clone)]
pub struct TimespanCommand {
    /// Literal such as "1h30m", "10s" or a millisecond count
    pub literal: String,
}
