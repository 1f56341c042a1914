//! CLI command definitions

use crate::core::PipelineMode;
use clap::Args;

/// Pipeline mode argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    Quick,
    Analysis,
    Full,
}

impl From<ModeArg> for PipelineMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Quick => PipelineMode::Quick,
            ModeArg::Analysis => PipelineMode::Analysis,
            ModeArg::Full => PipelineMode::Full,
        }
    }
}

/// Run a pipeline execution
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to the orchestrator configuration file
    #[arg(short, long)]
    pub file: String,

    /// Input payload as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub input: String,

    /// Extra input fields (key=value), merged over --input
    #[arg(long, value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    /// Pipeline mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Full)]
    pub mode: ModeArg,

    /// Explicit execution id (generated when omitted)
    #[arg(long)]
    pub execution_id: Option<String>,

    /// Don't save the execution to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate an orchestrator configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to the orchestrator configuration file
    #[arg(short, long)]
    pub file: String,

    /// Output the parsed configuration as JSON
    #[arg(long)]
    pub json: bool,
}

/// Probe component health
#[derive(Debug, Args, Clone)]
pub struct HealthCommand {
    /// Path to the orchestrator configuration file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show execution history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Number of recent executions to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show one specific execution in full
    #[arg(long)]
    pub execution_id: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show aggregate pipeline metrics
#[derive(Debug, Args, Clone)]
pub struct MetricsCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
