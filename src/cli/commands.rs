//! CLI command handlers.
//!
//! Each handler returns the JSON it would print, so tests can inspect
//! output without capturing stdout. [`run_cli`] does the printing and maps
//! errors to exit codes.

use std::path::Path;
use std::process::ExitCode;

use tracing::info;

use crate::config::{SimConfig, SimulationRequest};
use crate::domains::models::ModelKind;
use crate::engine::QualificationEngine;
use crate::error::SimResult;

use super::output::{print_help, print_version, render_report};
use super::{Args, Command};

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    let output = match args.command {
        Command::Simulate {
            request_path,
            seed_override,
            iterations_override,
        } => simulate(&request_path, seed_override, iterations_override),
        Command::Model {
            kind,
            seed_override,
        } => model(kind, seed_override),
        Command::ModelMc {
            kind,
            iterations_override,
            seed_override,
        } => model_monte_carlo(kind, iterations_override, seed_override),
        Command::Help => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Command::Version => {
            print_version();
            return ExitCode::SUCCESS;
        }
        Command::Invalid(message) => {
            eprintln!("Error: {message}");
            eprintln!("Run 'qualisim help' for usage.");
            return ExitCode::from(2);
        }
    };

    match output {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Simulate the parameters of a request file.
///
/// One parameter yields a single-parameter result, more yield the joint
/// result with per-parameter diagnostics.
///
/// # Errors
///
/// Returns error if the request cannot be loaded or the simulation fails.
pub fn simulate(
    path: &Path,
    seed_override: Option<u64>,
    iterations_override: Option<usize>,
) -> SimResult<String> {
    let mut request = SimulationRequest::load(path)?;
    if let Some(seed) = seed_override {
        request.config.seed = Some(seed);
    }
    if let Some(iterations) = iterations_override {
        request.config.iterations = iterations;
    }

    let parameters = request.to_parameters()?;
    let mut engine = QualificationEngine::new(request.config)?;
    info!(
        request = %path.display(),
        parameters = parameters.len(),
        seed = engine.seed(),
        "running request"
    );

    if let [parameter] = parameters.as_slice() {
        let result = engine.run_single(parameter)?;
        render_report(engine.seed(), &result)
    } else {
        let result = engine.run_multi(&parameters)?;
        render_report(engine.seed(), &result)
    }
}

/// Evaluate a model over its default grid.
///
/// # Errors
///
/// Returns error if the model evaluation fails.
pub fn model(kind: ModelKind, seed: Option<u64>) -> SimResult<String> {
    let mut engine = engine_for(seed, None)?;
    let result = engine.run_model(kind, None)?;
    render_report(engine.seed(), &result)
}

/// Run the model-level Monte Carlo with the default variation preset.
///
/// # Errors
///
/// Returns error if the iteration count is zero or a model run fails.
pub fn model_monte_carlo(
    kind: ModelKind,
    iterations: Option<usize>,
    seed: Option<u64>,
) -> SimResult<String> {
    let mut engine = engine_for(seed, iterations)?;
    let result = engine.run_model_monte_carlo(kind, None)?;
    render_report(engine.seed(), &result)
}

fn engine_for(
    seed: Option<u64>,
    model_iterations: Option<usize>,
) -> SimResult<QualificationEngine> {
    let defaults = SimConfig::default();
    QualificationEngine::new(SimConfig {
        seed,
        model_iterations: model_iterations.unwrap_or(defaults.model_iterations),
        ..defaults
    })
}
