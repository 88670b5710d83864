//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{RunCommand, StepsCommand, TimespanCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Automation agent driving a page-like resource through a flow of steps
#[derive(Debug, Parser, Clone)]
#[command(name = "flowbot")]
#[command(version)]
#[command(about = "Runs a configured flow of steps against a controlled resource, cycle after cycle", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the flow, cycle after cycle
    Run(RunCommand),

    /// Validate the settings and compose the flow without running it
    Validate(ValidateCommand),

    /// List registered steps
    Steps(StepsCommand),

    /// Parse a timespan literal
    Timespan(TimespanCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
