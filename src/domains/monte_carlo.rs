//! Monte Carlo risk simulation over test parameters.
//!
//! Two entry points:
//! - single parameter: sample one [`TestParameter`] repeatedly, score each
//!   draw against its acceptance band and summarize the sample;
//! - multiple parameters: run the single-parameter simulation per
//!   parameter for diagnostics, then sample every parameter jointly per
//!   iteration. The joint trial value is the unweighted mean of the drawn
//!   values and the trial passes only if every parameter with a band is
//!   inside it.
//!
//! Parameters are not rescaled before averaging; callers combining
//! variables with different units must normalize them first.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domains::parameter::TestParameter;
use crate::domains::statistics::{
    confidence_bounds, create_histogram, mean_std, sorted_copy, validate_confidence_level,
    Histogram, Percentiles, DEFAULT_HISTOGRAM_BINS,
};
use crate::engine::jidoka::{ensure_finite, JidokaGuard};
use crate::engine::rng::SimRng;
use crate::error::{SimError, SimResult};

/// Default number of trials for project-level risk simulations.
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Default confidence level in percent.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 95.0;

/// Maximum length of [`SimulationResult::distribution_data`].
pub const DEFAULT_DISTRIBUTION_CAP: usize = 1000;

/// Summary of one Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Number of trials, always the requested count.
    pub iterations: usize,
    /// Sample mean.
    pub mean_value: f64,
    /// Population standard deviation of the sample.
    pub std_deviation: f64,
    /// Requested confidence level (percent).
    pub confidence_level: f64,
    /// Empirical lower confidence bound.
    pub lower_bound: f64,
    /// Empirical upper confidence bound.
    pub upper_bound: f64,
    /// Percentage (0-100) of trials inside the acceptance band.
    ///
    /// `None` when no acceptance criterion was defined, which is distinct
    /// from a 0% pass rate.
    pub success_probability: Option<f64>,
    /// Lowest values of the sorted sample, capped for chart payloads.
    pub distribution_data: Vec<f64>,
    /// Standard percentiles.
    pub percentiles: Percentiles,
    /// Equal-width histogram of the sample.
    pub histogram: Histogram,
}

impl SimulationResult {
    /// Whether an acceptance criterion was evaluated.
    #[must_use]
    pub const fn has_criterion(&self) -> bool {
        self.success_probability.is_some()
    }
}

/// Outcome of a multi-parameter run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiParameterResult {
    /// Joint simulation over all parameters.
    ///
    /// Parameters without a band pass every trial. When no parameter has a
    /// band, `overall.success_probability` is `None` rather than 100%.
    pub overall: SimulationResult,
    /// Independent per-parameter runs, keyed by name.
    pub individual: BTreeMap<String, SimulationResult>,
}

/// Monte Carlo engine for test-parameter simulation.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    /// Number of trials.
    iterations: usize,
    /// Confidence level in percent.
    confidence_level: f64,
    /// Histogram bin count.
    histogram_bins: usize,
    /// Length cap of the reported distribution.
    distribution_cap: usize,
}

impl MonteCarloEngine {
    /// Create a new engine.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidIterations`] for zero iterations or
    /// [`SimError::InvalidConfidenceLevel`] outside (0, 100).
    pub fn new(iterations: usize, confidence_level: f64) -> SimResult<Self> {
        if iterations == 0 {
            return Err(SimError::InvalidIterations(iterations));
        }
        validate_confidence_level(confidence_level)?;
        Ok(Self {
            iterations,
            confidence_level,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            distribution_cap: DEFAULT_DISTRIBUTION_CAP,
        })
    }

    /// Set the histogram bin count.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if `bins` is zero.
    pub fn with_histogram_bins(mut self, bins: usize) -> SimResult<Self> {
        if bins == 0 {
            return Err(SimError::config("histogram needs at least one bin"));
        }
        self.histogram_bins = bins;
        Ok(self)
    }

    /// Set the cap on reported distribution points.
    #[must_use]
    pub const fn with_distribution_cap(mut self, cap: usize) -> Self {
        self.distribution_cap = cap;
        self
    }

    /// Number of trials per run.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Confidence level in percent.
    #[must_use]
    pub const fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Simulate a single parameter.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] if the parameter does not
    /// validate, or [`SimError::NonFiniteValue`] if sampling diverges.
    pub fn run(&self, parameter: &TestParameter, rng: &mut SimRng) -> SimResult<SimulationResult> {
        parameter.validate()?;
        debug!(
            parameter = %parameter.name,
            iterations = self.iterations,
            confidence_level = self.confidence_level,
            seed = rng.master_seed(),
            "single-parameter simulation"
        );
        if parameter.acceptance.is_none() {
            warn!(
                parameter = %parameter.name,
                "no acceptance band; success probability not computed"
            );
        }

        let mut samples = Vec::with_capacity(self.iterations);
        let mut successes = 0_usize;

        for _ in 0..self.iterations {
            let value = parameter.sample(rng);
            if parameter.passes(value) == Some(true) {
                successes += 1;
            }
            samples.push(value);
        }

        let successes = parameter.acceptance.map(|_| successes);
        let result = self.summarize(&parameter.name, &samples, successes)?;
        info!(
            parameter = %parameter.name,
            mean = result.mean_value,
            success_probability = ?result.success_probability,
            "single-parameter simulation complete"
        );
        Ok(result)
    }

    /// Simulate several parameters jointly.
    ///
    /// The per-parameter results are computed from fresh draws, independent
    /// of the joint trials.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptyParameterList`],
    /// [`SimError::DuplicateParameter`] or any error of [`Self::run`].
    pub fn run_multi(
        &self,
        parameters: &[TestParameter],
        rng: &mut SimRng,
    ) -> SimResult<MultiParameterResult> {
        if parameters.is_empty() {
            return Err(SimError::EmptyParameterList);
        }
        let mut seen = HashSet::with_capacity(parameters.len());
        for parameter in parameters {
            parameter.validate()?;
            if !seen.insert(parameter.name.as_str()) {
                return Err(SimError::DuplicateParameter(parameter.name.clone()));
            }
        }
        debug!(
            parameters = parameters.len(),
            iterations = self.iterations,
            seed = rng.master_seed(),
            "multi-parameter simulation"
        );

        let mut individual = BTreeMap::new();
        for parameter in parameters {
            individual.insert(parameter.name.clone(), self.run(parameter, rng)?);
        }

        let has_criterion = parameters.iter().any(|p| p.acceptance.is_some());
        let n_params = parameters.len() as f64;
        let mut overall_samples = Vec::with_capacity(self.iterations);
        let mut values = Vec::with_capacity(parameters.len());
        let mut successes = 0_usize;

        for _ in 0..self.iterations {
            values.clear();
            values.extend(parameters.iter().map(|p| p.sample(rng)));

            let all_passed = parameters
                .iter()
                .zip(&values)
                .all(|(p, &v)| p.passes(v).unwrap_or(true));
            if all_passed {
                successes += 1;
            }
            overall_samples.push(values.iter().sum::<f64>() / n_params);
        }

        let successes = has_criterion.then_some(successes);
        let overall = self.summarize("overall", &overall_samples, successes)?;
        info!(
            parameters = parameters.len(),
            mean = overall.mean_value,
            success_probability = ?overall.success_probability,
            "multi-parameter simulation complete"
        );

        Ok(MultiParameterResult {
            overall,
            individual,
        })
    }

    /// Aggregate a raw sample into a [`SimulationResult`].
    fn summarize(
        &self,
        context: &str,
        samples: &[f64],
        successes: Option<usize>,
    ) -> SimResult<SimulationResult> {
        let guard = JidokaGuard::new(context);
        guard.check_all(samples)?;

        let (mean_value, std_deviation) = mean_std(samples)?;
        ensure_finite(|| format!("{context} mean"), mean_value)?;
        ensure_finite(|| format!("{context} std deviation"), std_deviation)?;
        let sorted = sorted_copy(samples);
        let (lower_bound, upper_bound) = confidence_bounds(&sorted, self.confidence_level)?;
        let percentiles = Percentiles::from_sorted(&sorted)?;
        let histogram = create_histogram(samples, self.histogram_bins)?;
        let success_probability =
            successes.map(|count| 100.0 * count as f64 / self.iterations as f64);

        let mut distribution_data = sorted;
        distribution_data.truncate(self.distribution_cap);

        Ok(SimulationResult {
            iterations: self.iterations,
            mean_value,
            std_deviation,
            confidence_level: self.confidence_level,
            lower_bound,
            upper_bound,
            success_probability,
            distribution_data,
            percentiles,
            histogram,
        })
    }
}

/// Simulate one parameter with default histogram and payload settings.
///
/// # Errors
///
/// See [`MonteCarloEngine::new`] and [`MonteCarloEngine::run`].
///
/// # Example
///
/// ```rust
/// use qualisim::domains::monte_carlo::run_monte_carlo_simulation;
/// use qualisim::domains::parameter::TestParameter;
/// use qualisim::engine::rng::SimRng;
///
/// let brix = TestParameter::triangular("brix", 10.0, 12.0, 14.0).with_acceptance(12.0, 2.0);
/// let mut rng = SimRng::new(42);
/// let result = run_monte_carlo_simulation(&brix, 5000, 95.0, &mut rng).unwrap();
/// assert_eq!(result.success_probability, Some(100.0));
/// ```
pub fn run_monte_carlo_simulation(
    parameter: &TestParameter,
    iterations: usize,
    confidence_level: f64,
    rng: &mut SimRng,
) -> SimResult<SimulationResult> {
    MonteCarloEngine::new(iterations, confidence_level)?.run(parameter, rng)
}

/// Simulate several parameters with default histogram and payload settings.
///
/// # Errors
///
/// See [`MonteCarloEngine::new`] and [`MonteCarloEngine::run_multi`].
pub fn run_multi_parameter_simulation(
    parameters: &[TestParameter],
    iterations: usize,
    confidence_level: f64,
    rng: &mut SimRng,
) -> SimResult<MultiParameterResult> {
    MonteCarloEngine::new(iterations, confidence_level)?.run_multi(parameters, rng)
}
