//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HealthCommand, HistoryCommand, MetricsCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Resilient HTTP service pipeline orchestrator
#[derive(Debug, Parser, Clone)]
#[command(name = "relay")]
#[command(author = "Relay Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A resilient HTTP service pipeline orchestrator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline execution
    Run(RunCommand),

    /// Validate an orchestrator configuration
    Validate(ValidateCommand),

    /// Probe the health of every configured component
    Health(HealthCommand),

    /// Show execution history
    History(HistoryCommand),

    /// Show aggregate pipeline metrics
    Metrics(MetricsCommand),
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
