use anyhow::{Context, Result};
use relay::cli::commands::{
    HealthCommand, HistoryCommand, MetricsCommand, RunCommand, ValidateCommand,
};
use relay::cli::output::*;
use relay::cli::{Cli, Command};
use relay::execution::probe_components;
use relay::{
    ExecutionEvent, ExecutionStatus, HttpServiceClient, Orchestrator, PipelineConfig,
    PipelineMode,
};
use serde_json::{Map, Value};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[cfg(feature = "sqlite")]
use relay::persistence::{ExecutionStore, SqliteExecutionStore};
#[cfg(feature = "sqlite")]
use relay::PipelineMetrics;
#[cfg(feature = "sqlite")]
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_config(cmd)?,
        Command::Health(cmd) => check_health(cmd).await?,
        Command::History(cmd) => show_history(cmd).await?,
        Command::Metrics(cmd) => show_metrics(cmd).await?,
    }

    Ok(())
}

/// Parse the --input JSON object and merge --set overrides into it
fn build_input(cmd: &RunCommand) -> Result<Map<String, Value>> {
    let value: Value =
        serde_json::from_str(&cmd.input).context("--input must be valid JSON")?;
    let mut input = match value {
        Value::Object(map) => map,
        _ => anyhow::bail!("--input must be a JSON object"),
    };

    for (key, value) in &cmd.set {
        input.insert(key.clone(), Value::String(value.clone()));
    }

    Ok(input)
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file)
        .context("Failed to load orchestrator configuration")?;

    println!(
        "{} Loaded configuration: {} steps, {} components",
        INFO,
        style(config.sequence.steps.len()).cyan(),
        style(config.components.len()).cyan()
    );

    let input = build_input(cmd)?;
    let mode = PipelineMode::from(cmd.mode);

    let orchestrator = Orchestrator::new(config, HttpServiceClient::new())?;

    #[cfg(feature = "sqlite")]
    let orchestrator = if cmd.no_history {
        orchestrator
    } else {
        let store: Arc<dyn ExecutionStore> =
            Arc::new(SqliteExecutionStore::with_default_path().await?);
        orchestrator.with_store(store)
    };

    // Live step output while the pipeline runs
    let spinner = create_spinner();
    {
        let spinner = spinner.clone();
        orchestrator
            .add_event_handler(move |event| match event {
                ExecutionEvent::StepStarted { step, component } => {
                    spinner.set_message(format!("running step {} ({})", step, component));
                }
                ExecutionEvent::StepCompleted { step, duration_ms } => {
                    spinner.println(format!(
                        "{} step {} completed in {:.0}ms",
                        CHECK, step, duration_ms
                    ));
                }
                ExecutionEvent::StepFailed { step, error } => {
                    spinner.println(format!("{} step {} failed: {}", CROSS, step, error));
                }
                ExecutionEvent::FallbackApplied { step } => {
                    spinner.println(format!(
                        "{} fallback data applied for critical step {}",
                        WARN, step
                    ));
                }
                ExecutionEvent::StepSkipped { step } => {
                    spinner.println(format!("{} step {} skipped (disabled)", INFO, step));
                }
                _ => {}
            })
            .await;
    }

    println!();
    let execution = orchestrator
        .execute(input, mode, cmd.execution_id.clone())
        .await;
    spinner.finish_and_clear();

    println!(
        "\n{} Execution {} - {}",
        INFO,
        style(&execution.execution_id).dim(),
        format_status(execution.status)
    );
    for step in &execution.steps {
        println!("  {}", format_step_line(step));
    }
    if let Some(duration) = execution.total_duration_ms {
        println!("  Total duration: {}", style(format!("{:.0}ms", duration)).cyan());
    }

    if execution.status == ExecutionStatus::Failed {
        if let Some(error) = &execution.error {
            println!("\n{} {}", CROSS, style(error).red());
        }
        std::process::exit(1);
    }

    Ok(())
}

fn validate_config(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating configuration...", INFO);

    match PipelineConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Configuration is valid!", CHECK);
            println!("  Steps: {}", style(config.sequence.steps.len()).cyan());
            println!("  Components: {}", style(config.components.len()).cyan());
            println!(
                "  Default flow: {}",
                style(config.routing.default_flow.join(" -> ")).bold()
            );
            for (mode, flow) in &config.routing.bypass_modes {
                println!("  {}: {}", style(mode).bold(), flow.join(" -> "));
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

async fn check_health(cmd: &HealthCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file)
        .context("Failed to load orchestrator configuration")?;

    let client = HttpServiceClient::new();
    let health = probe_components(&client, &config.components).await;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&health)?);
        return Ok(());
    }

    println!("{} Component health:", INFO);
    let mut names: Vec<_> = health.keys().collect();
    names.sort();
    for name in names {
        println!("  {}", format_component_health(name, &health[name]));
    }

    Ok(())
}

#[cfg(feature = "sqlite")]
async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = SqliteExecutionStore::with_default_path().await?;

    // If a specific execution is requested, show it in full
    if let Some(execution_id) = &cmd.execution_id {
        match store.load(execution_id).await? {
            Some(execution) => {
                println!("{}", serde_json::to_string_pretty(&execution)?);
            }
            None => {
                println!("{} Execution not found", WARN);
            }
        }
        return Ok(());
    }

    let executions = store.list_recent(cmd.limit).await?;
    if executions.is_empty() {
        println!("{} No executions found", INFO);
        return Ok(());
    }

    if cmd.json {
        let data = serde_json::json!({ "executions": executions });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{} Execution history (latest {}):", INFO, cmd.limit);
        for execution in &executions {
            println!("  {}", format_execution_summary(execution));
        }
    }

    Ok(())
}

#[cfg(not(feature = "sqlite"))]
async fn show_history(_cmd: &HistoryCommand) -> Result<()> {
    anyhow::bail!("the history command requires the 'sqlite' feature")
}

#[cfg(feature = "sqlite")]
async fn show_metrics(cmd: &MetricsCommand) -> Result<()> {
    let store = SqliteExecutionStore::with_default_path().await?;

    // Aggregate over the most recent stored runs
    let executions = store.list_recent(1000).await?;
    let metrics = PipelineMetrics::from_executions(&executions);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!("{} Pipeline metrics:", INFO);
    println!(
        "  Total executions: {}",
        style(metrics.total_executions).cyan()
    );
    println!(
        "  Successful: {}",
        style(metrics.successful_executions).green()
    );
    println!("  Failed: {}", style(metrics.failed_executions).red());
    println!(
        "  Success rate: {}",
        style(format!("{:.2}%", metrics.success_rate_percent)).cyan()
    );
    println!(
        "  Average duration: {}",
        style(format!("{:.2}ms", metrics.avg_duration_ms)).cyan()
    );
    if let Some(last) = metrics.last_execution {
        println!(
            "  Last execution: {}",
            style(last.format("%Y-%m-%d %H:%M:%S UTC")).dim()
        );
    }

    Ok(())
}

#[cfg(not(feature = "sqlite"))]
async fn show_metrics(_cmd: &MetricsCommand) -> Result<()> {
    anyhow::bail!("the metrics command requires the 'sqlite' feature")
}
