//! qualisim CLI - Monte Carlo risk simulation for qualification tests
//!
//! Command-line interface for running simulations. Results are printed to
//! stdout as JSON; logs go to stderr, filtered by `RUST_LOG`.

use std::process::ExitCode;

use qualisim::cli::{run_cli, Args};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    run_cli(Args::parse())
}
