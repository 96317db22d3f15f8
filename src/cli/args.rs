//! CLI argument parsing.
//!
//! This module provides the argument parser for the qualisim CLI.
//! Extracted to enable comprehensive testing of argument parsing logic.

use std::path::PathBuf;

use crate::domains::models::ModelKind;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the parameter simulation of a request file
    Simulate {
        /// Path to the request YAML file.
        request_path: PathBuf,
        /// Optional seed override.
        seed_override: Option<u64>,
        /// Optional iteration override.
        iterations_override: Option<usize>,
    },
    /// Evaluate a model over its default grid
    Model {
        /// Model to evaluate.
        kind: ModelKind,
        /// Optional seed.
        seed_override: Option<u64>,
    },
    /// Run the model-level Monte Carlo
    ModelMc {
        /// Model to simulate.
        kind: ModelKind,
        /// Optional iteration override.
        iterations_override: Option<usize>,
        /// Optional seed.
        seed_override: Option<u64>,
    },
    /// Show help
    Help,
    /// Show version
    Version,
    /// Unparseable command line
    Invalid(String),
}

/// Options shared by every command.
#[derive(Debug, Default)]
struct Options {
    seed: Option<u64>,
    iterations: Option<usize>,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    ///
    /// This method is testable as it accepts any iterator of strings,
    /// not just `std::env::args()`.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    /// Internal parsing from a vector of strings.
    fn parse_from_vec(args: &[String]) -> Self {
        if args.len() < 2 {
            return Self {
                command: Command::Help,
            };
        }

        let command = match args[1].as_str() {
            "simulate" => Self::parse_simulate_command(args),
            "model" => Self::parse_model_command(args, false),
            "model-mc" => Self::parse_model_command(args, true),
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => Command::Invalid(format!("unknown command: {unknown}")),
        };

        Self { command }
    }

    /// Parse the 'simulate' command arguments.
    fn parse_simulate_command(args: &[String]) -> Command {
        let Some(path) = args.get(2) else {
            return Command::Invalid("'simulate' requires a request path".to_string());
        };
        match Self::parse_options(&args[3..], true) {
            Ok(options) => Command::Simulate {
                request_path: PathBuf::from(path),
                seed_override: options.seed,
                iterations_override: options.iterations,
            },
            Err(message) => Command::Invalid(message),
        }
    }

    /// Parse the 'model' and 'model-mc' command arguments.
    fn parse_model_command(args: &[String], monte_carlo: bool) -> Command {
        let Some(name) = args.get(2) else {
            return Command::Invalid(format!("'{}' requires a model name", args[1]));
        };
        let kind = match name.parse::<ModelKind>() {
            Ok(kind) => kind,
            Err(e) => return Command::Invalid(e.to_string()),
        };
        match Self::parse_options(&args[3..], monte_carlo) {
            Ok(options) if monte_carlo => Command::ModelMc {
                kind,
                iterations_override: options.iterations,
                seed_override: options.seed,
            },
            Ok(options) => Command::Model {
                kind,
                seed_override: options.seed,
            },
            Err(message) => Command::Invalid(message),
        }
    }

    /// Parse `--seed` and, where accepted, `--iterations`.
    fn parse_options(rest: &[String], accepts_iterations: bool) -> Result<Options, String> {
        let mut options = Options::default();
        let mut iter = rest.iter();
        while let Some(flag) = iter.next() {
            match flag.as_str() {
                "--seed" => {
                    let value = iter.next().ok_or("--seed requires a value")?;
                    options.seed = Some(
                        value
                            .parse()
                            .map_err(|_| format!("invalid seed: {value}"))?,
                    );
                }
                "--iterations" if accepts_iterations => {
                    let value = iter.next().ok_or("--iterations requires a value")?;
                    options.iterations = Some(
                        value
                            .parse()
                            .map_err(|_| format!("invalid iteration count: {value}"))?,
                    );
                }
                other => return Err(format!("unexpected argument: {other}")),
            }
        }
        Ok(options)
    }
}
