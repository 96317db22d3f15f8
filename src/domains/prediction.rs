//! Uncertainty around an externally supplied test prediction.
//!
//! A point prediction (produced elsewhere) is perturbed by process noise
//! (normal) and formulation noise (triangular, centered on zero), both
//! relative to the prediction. The resulting sample answers "how likely
//! is this test to fail its limit?".
//!
//! Process parameters that move together (temperature and viscosity, say)
//! are drawn jointly from a multivariate normal through a Cholesky factor
//! of their scaled correlation matrix.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domains::statistics::{calculate_percentile, mean_std, sorted_copy};
use crate::engine::jidoka::JidokaGuard;
use crate::engine::rng::{check_triangular, SimRng};
use crate::error::{SimError, SimResult};

/// Default relative process variability.
pub const DEFAULT_PROCESS_VARIABILITY: f64 = 0.05;

/// Default relative formulation variability.
pub const DEFAULT_FORMULA_VARIABILITY: f64 = 0.03;

/// Formulation variability never exceeds this fraction.
pub const MAX_FORMULA_VARIABILITY: f64 = 0.08;

/// Covariance of correlated draws is the correlation matrix times this.
pub const CORRELATED_COVARIANCE_SCALE: f64 = 0.05;

const CRITICAL_INGREDIENTS: [&str; 4] = ["cacau", "lecitina", "emulsificante", "gordura"];

/// Relative process variability of a production site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessVariability {
    /// Overall relative variability, used as the process noise.
    pub overall: f64,
    /// Temperature control.
    pub temperature: f64,
    /// Mixing time.
    pub mixing_time: f64,
    /// Line speed.
    pub line_speed: f64,
}

/// Conservative variability for sites without history.
pub const UNKNOWN_FACTORY_VARIABILITY: ProcessVariability = ProcessVariability {
    overall: 0.06,
    temperature: 0.04,
    mixing_time: 0.07,
    line_speed: 0.05,
};

const FACTORY_VARIABILITY: [(&str, ProcessVariability); 4] = [
    (
        "Araraquara - SP",
        ProcessVariability {
            overall: 0.04,
            temperature: 0.02,
            mixing_time: 0.05,
            line_speed: 0.03,
        },
    ),
    (
        "Montes Claros - MG",
        ProcessVariability {
            overall: 0.05,
            temperature: 0.03,
            mixing_time: 0.06,
            line_speed: 0.04,
        },
    ),
    (
        "São José dos Campos - SP",
        ProcessVariability {
            overall: 0.045,
            temperature: 0.025,
            mixing_time: 0.055,
            line_speed: 0.035,
        },
    ),
    (
        "Caçapava - SP",
        ProcessVariability {
            overall: 0.05,
            temperature: 0.03,
            mixing_time: 0.06,
            line_speed: 0.04,
        },
    ),
];

/// Historical process variability of `factory`.
///
/// Unknown sites get [`UNKNOWN_FACTORY_VARIABILITY`].
#[must_use]
pub fn estimate_process_variability(factory: &str) -> ProcessVariability {
    let factory = factory.trim();
    FACTORY_VARIABILITY
        .iter()
        .find(|(name, _)| *name == factory)
        .map_or_else(
            || {
                debug!(factory, "no variability history; using conservative default");
                UNKNOWN_FACTORY_VARIABILITY
            },
            |(_, variability)| *variability,
        )
}

/// Relative noise levels applied to a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariabilityProfile {
    /// Standard deviation of the normal process noise.
    pub process: f64,
    /// Half-width of the triangular formulation noise.
    pub formula: f64,
}

impl Default for VariabilityProfile {
    fn default() -> Self {
        Self {
            process: DEFAULT_PROCESS_VARIABILITY,
            formula: DEFAULT_FORMULA_VARIABILITY,
        }
    }
}

impl VariabilityProfile {
    /// Profile for a formulation, see [`estimate_formula_variability`].
    #[must_use]
    pub fn for_ingredients<S: AsRef<str>>(ingredients: &[S]) -> Self {
        Self {
            formula: estimate_formula_variability(ingredients),
            ..Self::default()
        }
    }

    /// Profile for a formulation made at `factory`.
    #[must_use]
    pub fn estimate<S: AsRef<str>>(factory: &str, ingredients: &[S]) -> Self {
        Self {
            process: estimate_process_variability(factory).overall,
            formula: estimate_formula_variability(ingredients),
        }
    }

    fn validate(&self) -> SimResult<()> {
        if !self.process.is_finite() || self.process < 0.0 {
            return Err(SimError::invalid_parameter(
                "process_variability",
                format!("must be finite and >= 0, got {}", self.process),
            ));
        }
        check_triangular(-self.formula, 0.0, self.formula).map_err(|_| {
            SimError::invalid_parameter(
                "formula_variability",
                format!("must be finite and >= 0, got {}", self.formula),
            )
        })
    }
}

/// Formulation variability from an ingredient list: 3% plus 1% per
/// critical ingredient, capped at 8%.
#[must_use]
pub fn estimate_formula_variability<S: AsRef<str>>(ingredients: &[S]) -> f64 {
    let critical = ingredients
        .iter()
        .filter(|name| {
            let name = name.as_ref().to_lowercase();
            CRITICAL_INGREDIENTS.iter().any(|c| name.contains(c))
        })
        .count();
    (DEFAULT_FORMULA_VARIABILITY + 0.01 * critical as f64).min(MAX_FORMULA_VARIABILITY)
}

/// Summary of simulated test results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionStats {
    /// Sample mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Smallest simulated result.
    pub min: f64,
    /// Largest simulated result.
    pub max: f64,
    /// 5th percentile.
    pub p5: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 50th percentile.
    pub median: f64,
}

/// Simulated test results around a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSimulation {
    /// One value per iteration, in draw order.
    pub samples: Vec<f64>,
    /// Summary of `samples`.
    pub stats: PredictionStats,
}

/// Jointly simulated process parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedSamples {
    /// Parameter names, in column order.
    pub names: Vec<String>,
    /// One row per iteration, one column per parameter.
    pub rows: Vec<Vec<f64>>,
}

impl CorrelatedSamples {
    /// Values of column `index` across all iterations; empty when out of
    /// range.
    #[must_use]
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index).copied())
            .collect()
    }
}

/// Side of an acceptance limit that counts as failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    /// Values above the limit fail.
    Upper,
    /// Values below the limit fail.
    Lower,
}

/// Simulate test results as `base · (1 + N(0, process) + Tri(−formula, 0, formula))`.
///
/// # Errors
///
/// Returns [`SimError::InvalidIterations`] for zero iterations,
/// [`SimError::InvalidParameter`] for a negative or non-finite profile, or
/// [`SimError::NonFiniteValue`] for a non-finite prediction.
pub fn simulate_test_results(
    base_prediction: f64,
    profile: &VariabilityProfile,
    iterations: usize,
    rng: &mut SimRng,
) -> SimResult<PredictionSimulation> {
    if iterations == 0 {
        return Err(SimError::InvalidIterations(iterations));
    }
    profile.validate()?;
    let guard = JidokaGuard::new("prediction");
    guard.check_value(0, base_prediction)?;

    debug!(
        base_prediction,
        process = profile.process,
        formula = profile.formula,
        iterations,
        "simulating test results"
    );

    let samples: Vec<f64> = (0..iterations)
        .map(|_| {
            let process = rng.gen_normal(0.0, profile.process);
            let formula = rng.gen_triangular_unchecked(-profile.formula, 0.0, profile.formula);
            base_prediction * (1.0 + process + formula)
        })
        .collect();
    guard.check_all(&samples)?;

    let (mean, std) = mean_std(&samples)?;
    let sorted = sorted_copy(&samples);
    let stats = PredictionStats {
        mean,
        std,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p5: calculate_percentile(&sorted, 5.0)?,
        p95: calculate_percentile(&sorted, 95.0)?,
        median: calculate_percentile(&sorted, 50.0)?,
    };

    Ok(PredictionSimulation { samples, stats })
}

/// Simulate correlated process parameters as `base · (1 + x)` with
/// `x ~ N(0, CORRELATED_COVARIANCE_SCALE · correlation)`.
///
/// `correlation` is row-major, one row per parameter in `parameters`
/// order. It must be symmetric and positive definite; perfectly correlated
/// (singular) matrices are rejected.
///
/// # Errors
///
/// Returns [`SimError::InvalidIterations`], [`SimError::EmptyParameterList`],
/// [`SimError::DuplicateParameter`], [`SimError::InvalidParameter`] for a
/// malformed correlation matrix, or [`SimError::NonFiniteValue`] for a
/// non-finite base value.
pub fn simulate_correlated_parameters<S: AsRef<str>>(
    parameters: &[(S, f64)],
    correlation: &[Vec<f64>],
    iterations: usize,
    rng: &mut SimRng,
) -> SimResult<CorrelatedSamples> {
    if iterations == 0 {
        return Err(SimError::InvalidIterations(iterations));
    }
    if parameters.is_empty() {
        return Err(SimError::EmptyParameterList);
    }
    let mut seen = HashSet::with_capacity(parameters.len());
    for (name, _) in parameters {
        if !seen.insert(name.as_ref()) {
            return Err(SimError::DuplicateParameter(name.as_ref().to_string()));
        }
    }
    let bases: Vec<f64> = parameters.iter().map(|(_, base)| *base).collect();
    JidokaGuard::new("correlated base").check_all(&bases)?;

    let n = bases.len();
    check_correlation(correlation, n)?;
    let covariance: Vec<Vec<f64>> = correlation
        .iter()
        .map(|row| row.iter().map(|r| r * CORRELATED_COVARIANCE_SCALE).collect())
        .collect();
    let l = cholesky(&covariance)?;

    debug!(parameters = n, iterations, "simulating correlated parameters");

    let guard = JidokaGuard::new("correlated");
    let mut z = vec![0.0; n];
    let mut rows = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        for zi in &mut z {
            *zi = rng.gen_standard_normal();
        }
        let row: Vec<f64> = (0..n)
            .map(|i| {
                let x: f64 = (0..=i).map(|j| l[i][j] * z[j]).sum();
                bases[i] * (1.0 + x)
            })
            .collect();
        guard.check_all(&row)?;
        rows.push(row);
    }

    Ok(CorrelatedSamples {
        names: parameters
            .iter()
            .map(|(name, _)| name.as_ref().to_string())
            .collect(),
        rows,
    })
}

/// Shape, finiteness and symmetry of a correlation matrix.
fn check_correlation(matrix: &[Vec<f64>], n: usize) -> SimResult<()> {
    if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        return Err(SimError::invalid_parameter(
            "correlation_matrix",
            format!("expected {n}x{n} for {n} parameters"),
        ));
    }
    for i in 0..n {
        for j in 0..n {
            let value = matrix[i][j];
            if !value.is_finite() {
                return Err(SimError::invalid_parameter(
                    "correlation_matrix",
                    format!("entry ({i}, {j}) is {value}"),
                ));
            }
            if (value - matrix[j][i]).abs() > 1e-12 {
                return Err(SimError::invalid_parameter(
                    "correlation_matrix",
                    format!("not symmetric at ({i}, {j})"),
                ));
            }
        }
        if (matrix[i][i] - 1.0).abs() > 1e-12 {
            warn!(index = i, value = matrix[i][i], "correlation diagonal is not 1");
        }
    }
    Ok(())
}

/// Cholesky decomposition (lower triangular).
fn cholesky(matrix: &[Vec<f64>]) -> SimResult<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[i][k] * l[j][k];
            }

            if i == j {
                let val = matrix[i][i] - sum;
                // a rounding residue of a singular matrix is not a pivot
                if val <= matrix[i][i].abs() * 1e-12 {
                    return Err(SimError::invalid_parameter(
                        "correlation_matrix",
                        "not positive definite",
                    ));
                }
                l[i][j] = val.sqrt();
            } else {
                l[i][j] = (matrix[i][j] - sum) / l[j][j];
            }
        }
    }

    Ok(l)
}

/// Fraction (0-1) of samples strictly beyond `limit`.
///
/// # Errors
///
/// Returns [`SimError::EmptySample`] if `samples` is empty.
pub fn probability_of_fail(samples: &[f64], limit: f64, kind: LimitKind) -> SimResult<f64> {
    if samples.is_empty() {
        return Err(SimError::empty_sample("probability of fail"));
    }
    let failures = samples
        .iter()
        .filter(|&&v| match kind {
            LimitKind::Upper => v > limit,
            LimitKind::Lower => v < limit,
        })
        .count();
    Ok(failures as f64 / samples.len() as f64)
}

/// Interpolated percentile interval at `confidence` (a fraction in (0, 1)).
///
/// # Errors
///
/// Returns [`SimError::EmptySample`] or [`SimError::InvalidConfidenceLevel`].
pub fn prediction_interval(samples: &[f64], confidence: f64) -> SimResult<(f64, f64)> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(SimError::InvalidConfidenceLevel(confidence * 100.0));
    }
    let sorted = sorted_copy(samples);
    let alpha = 1.0 - confidence;
    Ok((
        calculate_percentile(&sorted, alpha / 2.0 * 100.0)?,
        calculate_percentile(&sorted, (1.0 - alpha / 2.0) * 100.0)?,
    ))
}
