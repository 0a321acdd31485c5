use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{Level, debug, error, info};

use renderflow_bus::EventBus;
use renderflow_engine::{Executor, RunContext, RunOutcome, default_registry, host::NullGraphicsHost, parse_workflow_file};
use renderflow_types::ParamValue;

/// Workflow-driven rendering pipeline runner.
#[derive(Parser)]
#[command(name = "renderflow", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a workflow file to its terminal state.
    Run {
        /// Path to the workflow document (JSON or YAML).
        file: PathBuf,
        /// Seed the run context with an override before the first step,
        /// e.g. `--set capture_verified=true`. Values parse as number,
        /// boolean, or text.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },
    /// Validate a workflow file without executing any step.
    Check {
        /// Path to the workflow document (JSON or YAML).
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    init_tracing();
    match dispatch(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .try_init();
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Run { file, overrides } => run_workflow(&file, &overrides),
        Command::Check { file } => check_workflow(&file),
    }
}

fn run_workflow(file: &Path, overrides: &[String]) -> Result<ExitCode> {
    let workflow = parse_workflow_file(file)?;
    let registry = default_registry(Arc::new(NullGraphicsHost::new()));

    let mut bus = EventBus::new();
    bus.subscribe_all(|event| {
        debug!(kind = ?event.kind, payload = %event.payload, "telemetry");
    });

    let mut context = RunContext::new();
    for entry in overrides {
        let (key, value) = split_override(entry)?;
        context.set(key, parse_literal(value));
    }

    let report = Executor::new(&registry).with_notifier(&bus).run(&workflow, &mut context)?;

    match report.outcome {
        RunOutcome::Completed => {
            info!(steps = report.records.len(), "workflow completed");
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Exited { code, message } => {
            match message {
                Some(message) => info!(code, %message, "workflow exited"),
                None => info!(code, "workflow exited"),
            }
            Ok(ExitCode::from(code.clamp(0, 255) as u8))
        }
        RunOutcome::Failed { step_id, message } => {
            error!(step_id = %step_id, %message, "workflow failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check_workflow(file: &Path) -> Result<ExitCode> {
    let workflow = parse_workflow_file(file)?;
    let registry = default_registry(Arc::new(NullGraphicsHost::new()));
    let order = Executor::new(&registry)
        .validate(&workflow)
        .with_context(|| format!("workflow '{}' failed validation", file.display()))?;
    info!(steps = order.len(), "workflow is valid");
    Ok(ExitCode::SUCCESS)
}

fn split_override(entry: &str) -> Result<(&str, &str)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => bail!("invalid --set override '{entry}', expected KEY=VALUE"),
    }
}

/// Parses an override value the way workflow literals are typed: numbers
/// and booleans keep their type, everything else is text.
fn parse_literal(value: &str) -> ParamValue {
    if let Ok(number) = value.parse::<f64>() {
        return ParamValue::Number(number);
    }
    match value {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        other => ParamValue::Text(other.to_string()),
    }
}
