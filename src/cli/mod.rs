//! CLI module for qualisim.
//!
//! This module contains all CLI logic extracted from main.rs to enable
//! full test coverage. The entry point `run_cli` can be called from main.rs
//! with parsed arguments.

mod args;
mod commands;
mod output;

pub use args::{Args, Command};
pub use commands::{model, model_monte_carlo, run_cli, simulate};
pub use output::{print_help, print_version, render_report, version_string, Report};
