//! CLI output formatting.
//!
//! Results go to stdout as pretty JSON, diagnostics to stderr.

use serde::Serialize;

use crate::error::SimResult;

/// A result tagged with the seed that produced it, so any run can be
/// replayed with `--seed`.
#[derive(Debug, Serialize)]
pub struct Report<'a, T: Serialize> {
    /// Master seed of the run.
    pub seed: u64,
    /// Command result.
    pub result: &'a T,
}

/// Render a report as pretty JSON.
///
/// # Errors
///
/// Returns [`crate::error::SimError::Json`] if serialization fails.
pub fn render_report<T: Serialize>(seed: u64, result: &T) -> SimResult<String> {
    Ok(serde_json::to_string_pretty(&Report { seed, result })?)
}

/// Print version information.
pub fn print_version() {
    println!("{}", version_string());
}

/// Version line, with the source revision when the build recorded one.
#[must_use]
pub fn version_string() -> String {
    match option_env!("QUALISIM_GIT_HASH") {
        Some(hash) if !hash.is_empty() => {
            format!("qualisim {} ({hash})", env!("CARGO_PKG_VERSION"))
        }
        _ => format!("qualisim {}", env!("CARGO_PKG_VERSION")),
    }
}

/// Print help message.
pub fn print_help() {
    println!(
        r"qualisim - Monte Carlo risk simulation for product qualification tests

USAGE:
    qualisim <COMMAND> [OPTIONS]

COMMANDS:
    simulate <request.yaml>     Simulate the parameters of a request file
        --seed <N>              Override the configured seed
        --iterations <N>        Override the configured iteration count

    model <kind>                Evaluate a model over its default grid
        --seed <N>              Seed for the measurement noise

    model-mc <kind>             Monte Carlo over model parameter uncertainty
        --iterations <N>        Iterations (default: 1000)
        --seed <N>              Seed

    help                        Show this help message
    version                     Show version information

MODELS:
    solubility, dissociation, texture, shelf-life, microbial

EXAMPLES:
    qualisim simulate request.yaml --seed 42
    qualisim model shelf-life
    qualisim model-mc solubility --iterations 500 --seed 7

Set RUST_LOG=info for run summaries on stderr.
"
    );
}
