//! Configuration system with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs with `deny_unknown_fields`
//! - Declarative range checks via `validator`
//! - Runtime semantic validation
//!
//! A [`SimulationRequest`] bundles a configuration with the parameter
//! records to simulate, in one YAML document:
//!
//! ```yaml
//! config:
//!   seed: 42
//!   iterations: 5000
//! parameters:
//!   - name: viscosity
//!     mean: 1200
//!     std_dev: 40
//!     target_value: 1200
//!     tolerance: 100
//! tests:
//!   - name: brix
//!     target_value: 12.0
//!     tolerance: 0.6
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::domains::model_mc::DEFAULT_MODEL_ITERATIONS;
use crate::domains::monte_carlo::{
    MonteCarloEngine, DEFAULT_CONFIDENCE_LEVEL, DEFAULT_DISTRIBUTION_CAP, DEFAULT_ITERATIONS,
};
use crate::domains::parameter::{ParameterRecord, QualificationTest, TestParameter};
use crate::domains::statistics::{validate_confidence_level, DEFAULT_HISTOGRAM_BINS};
use crate::error::{SimError, SimResult};

/// Top-level simulation configuration.
///
/// Loaded from YAML files with full schema validation. Every field has a
/// default, so an empty document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Master seed. Absent means a fresh seed per engine, reported back
    /// through the engine's RNG.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Trials per parameter simulation.
    #[validate(range(min = 1))]
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Iterations of the model-level Monte Carlo.
    #[validate(range(min = 1))]
    #[serde(default = "default_model_iterations")]
    pub model_iterations: usize,

    /// Confidence level in percent, exclusive of 0 and 100.
    #[validate(range(exclusive_min = 0.0, exclusive_max = 100.0))]
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,

    /// Histogram bin count.
    #[validate(range(min = 1))]
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Length cap of the reported sorted distribution.
    #[serde(default = "default_distribution_cap")]
    pub distribution_cap: usize,
}

const fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

const fn default_model_iterations() -> usize {
    DEFAULT_MODEL_ITERATIONS
}

const fn default_confidence_level() -> f64 {
    DEFAULT_CONFIDENCE_LEVEL
}

const fn default_histogram_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

const fn default_distribution_cap() -> usize {
    DEFAULT_DISTRIBUTION_CAP
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Run declarative and semantic validation.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Validation`] or [`SimError::Config`].
    pub fn check(&self) -> SimResult<()> {
        // Poka-Yoke: validate all constraints
        self.validate()?;
        self.validate_semantic()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        // NaN slips through the range check
        validate_confidence_level(self.confidence_level)
            .map_err(|e| SimError::config(e.to_string()))?;
        Ok(())
    }

    /// Parameter engine configured from this config.
    ///
    /// # Errors
    ///
    /// Returns an error if the iteration count, confidence level or bin
    /// count is out of range.
    pub fn monte_carlo_engine(&self) -> SimResult<MonteCarloEngine> {
        Ok(
            MonteCarloEngine::new(self.iterations, self.confidence_level)?
                .with_histogram_bins(self.histogram_bins)?
                .with_distribution_cap(self.distribution_cap),
        )
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: None,
            iterations: default_iterations(),
            model_iterations: default_model_iterations(),
            confidence_level: default_confidence_level(),
            histogram_bins: default_histogram_bins(),
            distribution_cap: default_distribution_cap(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    seed: Option<u64>,
    iterations: Option<usize>,
    model_iterations: Option<usize>,
    confidence_level: Option<f64>,
    histogram_bins: Option<usize>,
    distribution_cap: Option<usize>,
}

impl SimConfigBuilder {
    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the parameter-simulation iteration count.
    #[must_use]
    pub const fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Set the model Monte Carlo iteration count.
    #[must_use]
    pub const fn model_iterations(mut self, iterations: usize) -> Self {
        self.model_iterations = Some(iterations);
        self
    }

    /// Set the confidence level in percent.
    #[must_use]
    pub const fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = Some(level);
        self
    }

    /// Set the histogram bin count.
    #[must_use]
    pub const fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Set the distribution length cap.
    #[must_use]
    pub const fn distribution_cap(mut self, cap: usize) -> Self {
        self.distribution_cap = Some(cap);
        self
    }

    /// Build the configuration.
    ///
    /// Unset fields keep their defaults. Validation happens when the
    /// configuration is handed to an engine.
    #[must_use]
    pub fn build(self) -> SimConfig {
        let defaults = SimConfig::default();
        SimConfig {
            seed: self.seed,
            iterations: self.iterations.unwrap_or(defaults.iterations),
            model_iterations: self.model_iterations.unwrap_or(defaults.model_iterations),
            confidence_level: self.confidence_level.unwrap_or(defaults.confidence_level),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            distribution_cap: self.distribution_cap.unwrap_or(defaults.distribution_cap),
        }
    }
}

/// A configuration plus the parameters to simulate.
///
/// `parameters` take explicit distributions; `tests` are qualification
/// tests known only by target and tolerance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimulationRequest {
    /// Engine configuration.
    #[validate(nested)]
    #[serde(default)]
    pub config: SimConfig,

    /// Parameter records.
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,

    /// Qualification tests, mapped to parameters with a 3-sigma spread.
    #[serde(default)]
    pub tests: Vec<QualificationTest>,
}

impl SimulationRequest {
    /// Load a request from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a request from YAML.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let request: Self = serde_yaml::from_str(yaml)?;
        request.config.check()?;
        Ok(request)
    }

    /// Convert every record into a validated [`TestParameter`], explicit
    /// parameters first.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptyParameterList`] if the request holds no
    /// records, or the first conversion error.
    pub fn to_parameters(&self) -> SimResult<Vec<TestParameter>> {
        if self.parameters.is_empty() && self.tests.is_empty() {
            return Err(SimError::EmptyParameterList);
        }
        self.parameters
            .iter()
            .cloned()
            .map(TestParameter::try_from)
            .chain(self.tests.iter().map(QualificationTest::to_parameter))
            .collect()
    }
}
