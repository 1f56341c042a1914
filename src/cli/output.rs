//! CLI output formatting

use crate::core::{ExecutionStatus, PipelineExecution, StepRecord, StepStatus};
use crate::execution::ComponentHealth;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");

/// Create a spinner for live step progress
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::InProgress => style("IN PROGRESS").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format a step status for display
pub fn format_step_status(status: StepStatus) -> String {
    match status {
        StepStatus::Pending => style("PENDING").dim().to_string(),
        StepStatus::InProgress => style("IN PROGRESS").yellow().to_string(),
        StepStatus::Completed => style("COMPLETED").green().to_string(),
        StepStatus::Failed => style("FAILED").red().to_string(),
        StepStatus::Skipped => style("SKIPPED").dim().to_string(),
    }
}

/// One-line step summary for the run report
pub fn format_step_line(step: &StepRecord) -> String {
    let duration = step
        .duration_ms
        .map(|ms| format!(" ({:.0}ms)", ms))
        .unwrap_or_default();
    let degraded = if step.degraded {
        style(" [degraded]").yellow().to_string()
    } else {
        String::new()
    };
    format!(
        "{} - {}{}{}",
        style(&step.name).bold(),
        format_step_status(step.status),
        duration,
        degraded
    )
}

/// One-line execution summary for history listings
pub fn format_execution_summary(execution: &PipelineExecution) -> String {
    let status_icon = match execution.status {
        ExecutionStatus::Completed => CHECK,
        ExecutionStatus::Failed => CROSS,
        _ => SPINNER,
    };

    format!(
        "{} {} - {} - {} - {} steps - {}",
        status_icon,
        style(&execution.execution_id).dim(),
        execution.mode,
        format_status(execution.status),
        execution.steps.len(),
        style(execution.started_at.format("%Y-%m-%d %H:%M:%S UTC")).dim()
    )
}

/// One-line component health summary
pub fn format_component_health(name: &str, health: &ComponentHealth) -> String {
    match health {
        ComponentHealth::Healthy {
            response_time_ms, ..
        } => format!(
            "{} {} - {} ({:.0}ms)",
            CHECK,
            style(name).bold(),
            style("healthy").green(),
            response_time_ms
        ),
        ComponentHealth::Unhealthy { http_status } => format!(
            "{} {} - {} (HTTP {})",
            CROSS,
            style(name).bold(),
            style("unhealthy").red(),
            http_status
        ),
        ComponentHealth::Unreachable { error } => format!(
            "{} {} - {} ({})",
            CROSS,
            style(name).bold(),
            style("unreachable").red(),
            error
        ),
        ComponentHealth::Disabled => format!(
            "{} {} - {}",
            INFO,
            style(name).bold(),
            style("disabled").dim()
        ),
    }
}
