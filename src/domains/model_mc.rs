//! Monte Carlo over scientific models.
//!
//! Each iteration redraws the varied constants uniformly in their range,
//! rebuilds the model and evaluates it over the same input grid. The
//! aggregate holds, per grid point, the mean across iterations and the
//! empirical 2.5 / 97.5 percent order statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domains::models::{ModelResult, ScientificModel};
use crate::domains::statistics::{confidence_bounds, DescriptiveStats};
use crate::engine::rng::SimRng;
use crate::error::{SimError, SimResult};

/// Default iteration count for model-level simulations.
pub const DEFAULT_MODEL_ITERATIONS: usize = 1000;

/// Confidence level of the per-point band, in percent.
pub const MODEL_BAND_LEVEL: f64 = 95.0;

/// Uniform range for one model constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    /// Lower end.
    pub min: f64,
    /// Upper end.
    pub max: f64,
}

impl ParamRange {
    /// Create a range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn sample(&self, rng: &mut SimRng) -> f64 {
        rng.gen_range_f64(self.min, self.max)
    }
}

/// Per-point confidence band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    /// Lower bound per grid point.
    pub lower: Vec<f64>,
    /// Upper bound per grid point.
    pub upper: Vec<f64>,
}

/// Aggregate view over all iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedModelResult {
    /// Mean response per grid point.
    pub mean_values: Vec<f64>,
    /// 95% empirical band per grid point.
    pub confidence_interval: ConfidenceBand,
    /// Statistics of the per-iteration curve means.
    pub statistics: DescriptiveStats,
}

/// Output of [`monte_carlo_simulation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMonteCarloResult {
    /// Iterations run.
    pub iterations: usize,
    /// One model evaluation per iteration.
    pub results: Vec<ModelResult>,
    /// Aggregate view.
    pub aggregated: AggregatedModelResult,
}

fn check_variations(
    model: &str,
    param_count: usize,
    variations: &BTreeMap<usize, ParamRange>,
) -> SimResult<()> {
    for (&index, range) in variations {
        if index >= param_count {
            return Err(SimError::model_input(
                model,
                format!("variation index {index} outside parameter vector of length {param_count}"),
            ));
        }
        if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
            return Err(SimError::model_input(
                model,
                format!(
                    "variation range for index {index} is invalid: [{}, {}]",
                    range.min, range.max
                ),
            ));
        }
    }
    Ok(())
}

/// Run a model repeatedly under parameter uncertainty.
///
/// Indices absent from `variations` keep their value from `base`.
///
/// # Errors
///
/// Returns [`SimError::InvalidIterations`] for zero iterations,
/// [`SimError::InvalidModelInput`] for an out-of-range index or an
/// inverted range, and any error raised by the model itself.
pub fn monte_carlo_simulation<M: ScientificModel>(
    base: &M,
    inputs: &[f64],
    variations: &BTreeMap<usize, ParamRange>,
    iterations: usize,
    rng: &mut SimRng,
) -> SimResult<ModelMonteCarloResult> {
    if iterations == 0 {
        return Err(SimError::InvalidIterations(iterations));
    }
    let base_params = base.params();
    check_variations(M::NAME, base_params.len(), variations)?;

    debug!(
        model = M::NAME,
        iterations,
        points = inputs.len(),
        varied = variations.len(),
        seed = rng.master_seed(),
        "starting model monte carlo"
    );

    let mut results = Vec::with_capacity(iterations);
    let mut params = base_params.clone();
    for _ in 0..iterations {
        for (&index, range) in variations {
            params[index] = range.sample(rng);
        }
        let model = M::with_params(&params)?;
        results.push(model.evaluate(inputs, rng)?);
    }

    let aggregated = aggregate(&results, inputs.len())?;
    info!(
        model = M::NAME,
        iterations,
        mean = aggregated.statistics.mean,
        "model monte carlo complete"
    );

    Ok(ModelMonteCarloResult {
        iterations,
        results,
        aggregated,
    })
}

fn aggregate(results: &[ModelResult], points: usize) -> SimResult<AggregatedModelResult> {
    let mut mean_values = Vec::with_capacity(points);
    let mut lower = Vec::with_capacity(points);
    let mut upper = Vec::with_capacity(points);

    let mut column = Vec::with_capacity(results.len());
    for i in 0..points {
        column.clear();
        column.extend(results.iter().map(|r| r.values[i]));
        mean_values.push(column.iter().sum::<f64>() / column.len() as f64);

        column.sort_by(f64::total_cmp);
        let (lo, hi) = confidence_bounds(&column, MODEL_BAND_LEVEL)?;
        lower.push(lo);
        upper.push(hi);
    }

    let curve_means: Vec<f64> = results.iter().map(|r| r.statistics.mean).collect();
    Ok(AggregatedModelResult {
        mean_values,
        confidence_interval: ConfidenceBand { lower, upper },
        statistics: DescriptiveStats::from_values(&curve_means)?,
    })
}
