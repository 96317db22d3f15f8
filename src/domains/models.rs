//! Physico-chemical models for food qualification tests.
//!
//! Five closed-form models, each mapping an input grid (temperature, pH or
//! time) to a predicted response:
//!
//! | Model | Law | Input |
//! |-------|-----|-------|
//! | [`SolubilityModel`] | Van't Hoff: `S0 · exp(−ΔH / (R·T))` | °C |
//! | [`DissociationModel`] | `Ka / (Ka + 10^−pH)` | pH |
//! | [`TextureModel`] | Maxwell: `σ0 · exp(−t/τ)` | s |
//! | [`ShelfLifeModel`] | Arrhenius: `ln 2 / (A · exp(−Ea / (R·T)))` | °C |
//! | [`MicrobialGrowthModel`] | modified Gompertz | h |
//!
//! Every point gets an independent uniform noise draw modeling measurement
//! error (multiplicative for shelf life, additive otherwise). This is not
//! the parameter uncertainty of the model-level Monte Carlo in
//! [`crate::domains::model_mc`]. A noise magnitude of zero makes a model
//! fully deterministic.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domains::model_mc::{monte_carlo_simulation, ModelMonteCarloResult, ParamRange};
use crate::domains::statistics::DescriptiveStats;
use crate::engine::jidoka::JidokaGuard;
use crate::engine::rng::SimRng;
use crate::error::{SimError, SimResult};

/// Universal gas constant, J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.314;

/// Offset from degrees Celsius to kelvin.
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Points in a default input grid.
pub const DEFAULT_GRID_POINTS: usize = 50;

/// Output of one model evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    /// Response at each grid point.
    pub values: Vec<f64>,
    /// Constants used, echoed for traceability.
    pub parameters: BTreeMap<String, f64>,
    /// Summary of `values`.
    pub statistics: DescriptiveStats,
}

impl ModelResult {
    fn build(
        model: &str,
        values: Vec<f64>,
        parameters: impl IntoIterator<Item = (&'static str, f64)>,
    ) -> SimResult<Self> {
        JidokaGuard::new(model).check_all(&values)?;
        let statistics = DescriptiveStats::from_values(&values)?;
        Ok(Self {
            values,
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            statistics,
        })
    }
}

/// A model with a flat parameter vector, so the model-level Monte Carlo
/// can redraw individual constants by index.
pub trait ScientificModel: Sized {
    /// Model name used in errors and logs.
    const NAME: &'static str;

    /// Parameter names in vector order (noise magnitude last).
    const PARAMETER_NAMES: &'static [&'static str];

    /// Evaluate over an input grid.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidModelInput`] for unusable constants or
    /// inputs, and [`SimError::NonFiniteValue`] if the law overflows.
    fn evaluate(&self, inputs: &[f64], rng: &mut SimRng) -> SimResult<ModelResult>;

    /// Current parameter vector.
    fn params(&self) -> Vec<f64>;

    /// Rebuild from a parameter vector.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidModelInput`] on a length mismatch.
    fn with_params(params: &[f64]) -> SimResult<Self>;
}

fn expect_params<const N: usize>(model: &str, params: &[f64]) -> SimResult<[f64; N]> {
    params.try_into().map_err(|_| {
        SimError::model_input(
            model,
            format!("expected {N} parameters, got {}", params.len()),
        )
    })
}

fn check_common(model: &str, inputs: &[f64], noise: f64) -> SimResult<()> {
    if inputs.is_empty() {
        return Err(SimError::model_input(model, "input grid is empty"));
    }
    if let Some(bad) = inputs.iter().find(|v| !v.is_finite()) {
        return Err(SimError::model_input(model, format!("non-finite input {bad}")));
    }
    if !noise.is_finite() || noise < 0.0 {
        return Err(SimError::model_input(
            model,
            format!("noise must be finite and >= 0, got {noise}"),
        ));
    }
    Ok(())
}

fn to_kelvin(model: &str, celsius: f64) -> SimResult<f64> {
    let kelvin = celsius + CELSIUS_TO_KELVIN;
    if kelvin <= 0.0 {
        return Err(SimError::model_input(
            model,
            format!("temperature {celsius} °C is at or below absolute zero"),
        ));
    }
    Ok(kelvin)
}

fn check_finite_constant(model: &str, name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::model_input(model, format!("{name} must be finite")))
    }
}

/// Van't Hoff solubility versus temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolubilityModel {
    /// Reference solubility S0 (g/L).
    pub s0: f64,
    /// Dissolution enthalpy ΔH (J/mol).
    pub delta_h: f64,
    /// Additive noise magnitude (g/L).
    pub noise: f64,
}

impl Default for SolubilityModel {
    fn default() -> Self {
        Self {
            s0: 2000.0,
            delta_h: 5000.0,
            noise: 50.0,
        }
    }
}

impl ScientificModel for SolubilityModel {
    const NAME: &'static str = "solubility";
    const PARAMETER_NAMES: &'static [&'static str] = &["s0", "delta_h", "noise"];

    fn evaluate(&self, temperatures: &[f64], rng: &mut SimRng) -> SimResult<ModelResult> {
        check_common(Self::NAME, temperatures, self.noise)?;
        check_finite_constant(Self::NAME, "s0", self.s0)?;
        check_finite_constant(Self::NAME, "delta_h", self.delta_h)?;

        let values = temperatures
            .iter()
            .map(|&t| {
                let kelvin = to_kelvin(Self::NAME, t)?;
                let solubility = self.s0 * (-self.delta_h / (GAS_CONSTANT * kelvin)).exp();
                Ok(solubility + rng.gen_symmetric_noise(self.noise))
            })
            .collect::<SimResult<Vec<_>>>()?;

        ModelResult::build(
            Self::NAME,
            values,
            [
                ("s0", self.s0),
                ("delta_h", self.delta_h),
                ("gas_constant", GAS_CONSTANT),
            ],
        )
    }

    fn params(&self) -> Vec<f64> {
        vec![self.s0, self.delta_h, self.noise]
    }

    fn with_params(params: &[f64]) -> SimResult<Self> {
        let [s0, delta_h, noise] = expect_params::<3>(Self::NAME, params)?;
        Ok(Self { s0, delta_h, noise })
    }
}

/// Weak-acid dissociated fraction versus pH.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DissociationModel {
    /// Dissociation constant Ka.
    pub ka: f64,
    /// Additive noise magnitude (fraction).
    pub noise: f64,
}

impl Default for DissociationModel {
    fn default() -> Self {
        Self {
            ka: 1e-4,
            noise: 0.01,
        }
    }
}

impl ScientificModel for DissociationModel {
    const NAME: &'static str = "dissociation";
    const PARAMETER_NAMES: &'static [&'static str] = &["ka", "noise"];

    fn evaluate(&self, ph_values: &[f64], rng: &mut SimRng) -> SimResult<ModelResult> {
        check_common(Self::NAME, ph_values, self.noise)?;
        if !self.ka.is_finite() || self.ka < 0.0 {
            return Err(SimError::model_input(
                Self::NAME,
                format!("ka must be finite and >= 0, got {}", self.ka),
            ));
        }

        let values = ph_values
            .iter()
            .map(|&ph| {
                let fraction = self.ka / (self.ka + 10_f64.powf(-ph));
                (fraction + rng.gen_symmetric_noise(self.noise)).clamp(0.0, 1.0)
            })
            .collect();

        ModelResult::build(Self::NAME, values, [("ka", self.ka)])
    }

    fn params(&self) -> Vec<f64> {
        vec![self.ka, self.noise]
    }

    fn with_params(params: &[f64]) -> SimResult<Self> {
        let [ka, noise] = expect_params::<2>(Self::NAME, params)?;
        Ok(Self { ka, noise })
    }
}

/// Maxwell stress relaxation versus time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureModel {
    /// Initial stress σ0 (Pa).
    pub sigma0: f64,
    /// Relaxation time τ (s).
    pub tau: f64,
    /// Additive noise magnitude (Pa).
    pub noise: f64,
}

impl Default for TextureModel {
    fn default() -> Self {
        Self {
            sigma0: 100.0,
            tau: 20.0,
            noise: 5.0,
        }
    }
}

impl ScientificModel for TextureModel {
    const NAME: &'static str = "texture";
    const PARAMETER_NAMES: &'static [&'static str] = &["sigma0", "tau", "noise"];

    fn evaluate(&self, times: &[f64], rng: &mut SimRng) -> SimResult<ModelResult> {
        check_common(Self::NAME, times, self.noise)?;
        check_finite_constant(Self::NAME, "sigma0", self.sigma0)?;
        if !self.tau.is_finite() || self.tau <= 0.0 {
            return Err(SimError::model_input(
                Self::NAME,
                format!("tau must be positive, got {}", self.tau),
            ));
        }

        let values = times
            .iter()
            .map(|&t| self.sigma0 * (-t / self.tau).exp() + rng.gen_symmetric_noise(self.noise))
            .collect();

        ModelResult::build(
            Self::NAME,
            values,
            [("sigma0", self.sigma0), ("tau", self.tau)],
        )
    }

    fn params(&self) -> Vec<f64> {
        vec![self.sigma0, self.tau, self.noise]
    }

    fn with_params(params: &[f64]) -> SimResult<Self> {
        let [sigma0, tau, noise] = expect_params::<3>(Self::NAME, params)?;
        Ok(Self { sigma0, tau, noise })
    }
}

/// Arrhenius shelf life (half-life of the degradation reaction) versus
/// storage temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShelfLifeModel {
    /// Pre-exponential factor A.
    pub a: f64,
    /// Activation energy Ea (J/mol).
    pub ea: f64,
    /// Relative noise magnitude (fraction of the shelf life).
    pub noise: f64,
}

impl Default for ShelfLifeModel {
    fn default() -> Self {
        Self {
            a: 1e10,
            ea: 50_000.0,
            noise: 0.1,
        }
    }
}

impl ScientificModel for ShelfLifeModel {
    const NAME: &'static str = "shelf_life";
    const PARAMETER_NAMES: &'static [&'static str] = &["a", "ea", "noise"];

    fn evaluate(&self, temperatures: &[f64], rng: &mut SimRng) -> SimResult<ModelResult> {
        check_common(Self::NAME, temperatures, self.noise)?;
        check_finite_constant(Self::NAME, "ea", self.ea)?;
        if !self.a.is_finite() || self.a <= 0.0 {
            return Err(SimError::model_input(
                Self::NAME,
                format!("pre-exponential factor must be positive, got {}", self.a),
            ));
        }

        let guard = JidokaGuard::new("shelf_life.rate");
        let values = temperatures
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let kelvin = to_kelvin(Self::NAME, t)?;
                let rate = self.a * (-self.ea / (GAS_CONSTANT * kelvin)).exp();
                // a vanishing rate means an unbounded shelf life
                let shelf_life = guard.check_value(i, std::f64::consts::LN_2 / rate)?;
                Ok(shelf_life * (1.0 + rng.gen_symmetric_noise(self.noise)))
            })
            .collect::<SimResult<Vec<_>>>()?;

        ModelResult::build(
            Self::NAME,
            values,
            [
                ("a", self.a),
                ("ea", self.ea),
                ("gas_constant", GAS_CONSTANT),
            ],
        )
    }

    fn params(&self) -> Vec<f64> {
        vec![self.a, self.ea, self.noise]
    }

    fn with_params(params: &[f64]) -> SimResult<Self> {
        let [a, ea, noise] = expect_params::<3>(Self::NAME, params)?;
        Ok(Self { a, ea, noise })
    }
}

/// Modified Gompertz microbial growth versus time.
///
/// `N(t) = N0 · exp(−exp(μ·e/N0 · (λ − t) + 1))`, floored at zero after noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicrobialGrowthModel {
    /// Initial population N0 (CFU/mL).
    pub n0: f64,
    /// Growth rate μ.
    pub mu: f64,
    /// Lag phase λ (h).
    pub lambda: f64,
    /// Additive noise magnitude (CFU/mL).
    pub noise: f64,
}

impl Default for MicrobialGrowthModel {
    fn default() -> Self {
        Self {
            n0: 100.0,
            mu: 0.1,
            lambda: 5.0,
            noise: 10.0,
        }
    }
}

impl ScientificModel for MicrobialGrowthModel {
    const NAME: &'static str = "microbial";
    const PARAMETER_NAMES: &'static [&'static str] = &["n0", "mu", "lambda", "noise"];

    fn evaluate(&self, times: &[f64], rng: &mut SimRng) -> SimResult<ModelResult> {
        check_common(Self::NAME, times, self.noise)?;
        check_finite_constant(Self::NAME, "mu", self.mu)?;
        check_finite_constant(Self::NAME, "lambda", self.lambda)?;
        if !self.n0.is_finite() || self.n0 <= 0.0 {
            return Err(SimError::model_input(
                Self::NAME,
                format!("initial population must be positive, got {}", self.n0),
            ));
        }

        let values = times
            .iter()
            .map(|&t| {
                let exponent = self.mu * std::f64::consts::E / self.n0 * (self.lambda - t) + 1.0;
                let population = self.n0 * (-exponent.exp()).exp();
                (population + rng.gen_symmetric_noise(self.noise)).max(0.0)
            })
            .collect();

        ModelResult::build(
            Self::NAME,
            values,
            [("n0", self.n0), ("mu", self.mu), ("lambda", self.lambda)],
        )
    }

    fn params(&self) -> Vec<f64> {
        vec![self.n0, self.mu, self.lambda, self.noise]
    }

    fn with_params(params: &[f64]) -> SimResult<Self> {
        let [n0, mu, lambda, noise] = expect_params::<4>(Self::NAME, params)?;
        Ok(Self {
            n0,
            mu,
            lambda,
            noise,
        })
    }
}

/// Selector over the five models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// [`SolubilityModel`].
    Solubility,
    /// [`DissociationModel`].
    Dissociation,
    /// [`TextureModel`].
    Texture,
    /// [`ShelfLifeModel`].
    #[serde(alias = "shelfLife")]
    ShelfLife,
    /// [`MicrobialGrowthModel`].
    Microbial,
}

impl ModelKind {
    /// All models.
    pub const ALL: [Self; 5] = [
        Self::Solubility,
        Self::Dissociation,
        Self::Texture,
        Self::ShelfLife,
        Self::Microbial,
    ];

    /// Command-line / wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Solubility => "solubility",
            Self::Dissociation => "dissociation",
            Self::Texture => "texture",
            Self::ShelfLife => "shelf-life",
            Self::Microbial => "microbial",
        }
    }

    /// Default 50-point input grid.
    ///
    /// Solubility 20-98.4 °C, dissociation pH 1-6.88, texture 0-98 s,
    /// shelf life 50-148 °C, microbial 0-47 h.
    #[must_use]
    pub fn default_inputs(&self) -> Vec<f64> {
        let (start, step) = match self {
            Self::Solubility => (20.0, 1.6),
            Self::Dissociation => (1.0, 0.12),
            Self::Texture => (0.0, 2.0),
            Self::ShelfLife => (50.0, 2.0),
            Self::Microbial => (0.0, 0.96),
        };
        (0..DEFAULT_GRID_POINTS)
            .map(|i| start + i as f64 * step)
            .collect()
    }

    /// Default parameter-uncertainty ranges, keyed by parameter index.
    #[must_use]
    pub fn default_variations(&self) -> BTreeMap<usize, ParamRange> {
        let ranges: &[(usize, f64, f64)] = match self {
            Self::Solubility => &[(0, 1500.0, 2500.0), (1, 4000.0, 6000.0)],
            Self::Dissociation => &[(0, 5e-5, 2e-4)],
            Self::Texture => &[(0, 80.0, 120.0), (1, 15.0, 25.0)],
            Self::ShelfLife => &[(0, 5e9, 2e10), (1, 45_000.0, 55_000.0)],
            Self::Microbial => &[(0, 80.0, 120.0), (1, 0.08, 0.12), (2, 4.0, 6.0)],
        };
        ranges
            .iter()
            .map(|&(index, min, max)| (index, ParamRange::new(min, max)))
            .collect()
    }

    /// Parameter names of the selected model.
    #[must_use]
    pub const fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            Self::Solubility => SolubilityModel::PARAMETER_NAMES,
            Self::Dissociation => DissociationModel::PARAMETER_NAMES,
            Self::Texture => TextureModel::PARAMETER_NAMES,
            Self::ShelfLife => ShelfLifeModel::PARAMETER_NAMES,
            Self::Microbial => MicrobialGrowthModel::PARAMETER_NAMES,
        }
    }

    /// Evaluate the model with its default constants.
    ///
    /// # Errors
    ///
    /// See [`ScientificModel::evaluate`].
    pub fn run(&self, inputs: &[f64], rng: &mut SimRng) -> SimResult<ModelResult> {
        match self {
            Self::Solubility => SolubilityModel::default().evaluate(inputs, rng),
            Self::Dissociation => DissociationModel::default().evaluate(inputs, rng),
            Self::Texture => TextureModel::default().evaluate(inputs, rng),
            Self::ShelfLife => ShelfLifeModel::default().evaluate(inputs, rng),
            Self::Microbial => MicrobialGrowthModel::default().evaluate(inputs, rng),
        }
    }

    /// Model-level Monte Carlo with default constants and the given
    /// variations.
    ///
    /// # Errors
    ///
    /// See [`monte_carlo_simulation`].
    pub fn monte_carlo(
        &self,
        inputs: &[f64],
        variations: &BTreeMap<usize, ParamRange>,
        iterations: usize,
        rng: &mut SimRng,
    ) -> SimResult<ModelMonteCarloResult> {
        match self {
            Self::Solubility => monte_carlo_simulation(
                &SolubilityModel::default(),
                inputs,
                variations,
                iterations,
                rng,
            ),
            Self::Dissociation => monte_carlo_simulation(
                &DissociationModel::default(),
                inputs,
                variations,
                iterations,
                rng,
            ),
            Self::Texture => monte_carlo_simulation(
                &TextureModel::default(),
                inputs,
                variations,
                iterations,
                rng,
            ),
            Self::ShelfLife => monte_carlo_simulation(
                &ShelfLifeModel::default(),
                inputs,
                variations,
                iterations,
                rng,
            ),
            Self::Microbial => monte_carlo_simulation(
                &MicrobialGrowthModel::default(),
                inputs,
                variations,
                iterations,
                rng,
            ),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Self> {
        match s {
            "solubility" => Ok(Self::Solubility),
            "dissociation" => Ok(Self::Dissociation),
            "texture" => Ok(Self::Texture),
            "shelf-life" | "shelf_life" | "shelfLife" => Ok(Self::ShelfLife),
            "microbial" => Ok(Self::Microbial),
            other => Err(SimError::config(format!("unknown model '{other}'"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, rel: f64) {
        assert!(
            ((actual - expected) / expected).abs() < rel,
            "{actual} != {expected}"
        );
    }

    #[test]
    fn test_solubility_noise_free_values() {
        let model = SolubilityModel {
            noise: 0.0,
            ..SolubilityModel::default()
        };
        let r = model.evaluate(&[25.0, 50.0, 75.0], &mut SimRng::new(1)).unwrap();
        assert_close(r.values[0], 266.084, 1e-4);
        assert_close(r.values[1], 311.021, 1e-4);
        assert_close(r.values[2], 355.491, 1e-4);
        assert!(r.values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(r.parameters["gas_constant"], GAS_CONSTANT);
        assert_eq!(r.parameters["s0"], 2000.0);
    }

    #[test]
    fn test_noise_free_is_bit_reproducible() {
        let inputs = ModelKind::Solubility.default_inputs();
        let model = SolubilityModel {
            noise: 0.0,
            ..SolubilityModel::default()
        };
        let a = model.evaluate(&inputs, &mut SimRng::new(1)).unwrap();
        let b = model.evaluate(&inputs, &mut SimRng::new(999)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_solubility_below_absolute_zero() {
        let err = SolubilityModel::default()
            .evaluate(&[-300.0], &mut SimRng::new(1))
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidModelInput { .. }));
    }

    #[test]
    fn test_noise_bounded() {
        let model = TextureModel::default();
        let times = ModelKind::Texture.default_inputs();
        let r = model.evaluate(&times, &mut SimRng::new(4)).unwrap();
        for (&t, &v) in times.iter().zip(&r.values) {
            let clean = 100.0 * (-t / 20.0).exp();
            assert!((v - clean).abs() <= 5.0);
        }
    }

    #[test]
    fn test_texture_values() {
        let model = TextureModel {
            noise: 0.0,
            ..TextureModel::default()
        };
        let r = model.evaluate(&[0.0, 20.0, 40.0], &mut SimRng::new(1)).unwrap();
        assert_eq!(r.values[0], 100.0);
        assert_close(r.values[1], 36.7879, 1e-4);
        assert_close(r.values[2], 13.5335, 1e-4);
    }

    #[test]
    fn test_texture_rejects_non_positive_tau() {
        let model = TextureModel {
            tau: 0.0,
            ..TextureModel::default()
        };
        assert!(model.evaluate(&[1.0], &mut SimRng::new(1)).is_err());
    }

    #[test]
    fn test_dissociation_half_at_pka() {
        let model = DissociationModel {
            noise: 0.0,
            ..DissociationModel::default()
        };
        let r = model.evaluate(&[2.0, 4.0, 6.0], &mut SimRng::new(1)).unwrap();
        assert_close(r.values[0], 0.009_901, 1e-3);
        assert!((r.values[1] - 0.5).abs() < 1e-12);
        assert_close(r.values[2], 0.990_099, 1e-4);
    }

    #[test]
    fn test_dissociation_clamped() {
        let model = DissociationModel {
            ka: 1e-4,
            noise: 0.5,
        };
        let r = model
            .evaluate(&ModelKind::Dissociation.default_inputs(), &mut SimRng::new(2))
            .unwrap();
        assert!(r.values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_shelf_life_values_and_trend() {
        let model = ShelfLifeModel {
            noise: 0.0,
            ..ShelfLifeModel::default()
        };
        let r = model.evaluate(&[25.0, 50.0, 100.0], &mut SimRng::new(1)).unwrap();
        assert_close(r.values[0], 0.039_896, 1e-4);
        assert_close(r.values[1], 0.008_380, 1e-3);
        assert!(r.values.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_shelf_life_noise_is_relative() {
        let model = ShelfLifeModel::default();
        let r = model.evaluate(&[60.0; 200], &mut SimRng::new(6)).unwrap();
        let clean = ShelfLifeModel {
            noise: 0.0,
            ..model
        }
        .evaluate(&[60.0], &mut SimRng::new(6))
        .unwrap()
        .values[0];
        assert!(r.values.iter().all(|v| (v / clean - 1.0).abs() <= 0.1 + 1e-12));
    }

    #[test]
    fn test_shelf_life_vanishing_rate_is_error() {
        let model = ShelfLifeModel {
            a: 1.0,
            ea: 1e7,
            noise: 0.0,
        };
        let err = model.evaluate(&[-200.0], &mut SimRng::new(1)).unwrap_err();
        assert!(matches!(err, SimError::NonFiniteValue { .. }));
    }

    #[test]
    fn test_microbial_values_floored() {
        let model = MicrobialGrowthModel {
            noise: 0.0,
            ..MicrobialGrowthModel::default()
        };
        let r = model.evaluate(&[0.0, 5.0, 48.0], &mut SimRng::new(1)).unwrap();
        assert_close(r.values[0], 6.357_85, 1e-4);
        assert_close(r.values[1], 6.598_80, 1e-4);
        assert_close(r.values[2], 8.906_23, 1e-4);

        let noisy = MicrobialGrowthModel {
            noise: 1000.0,
            ..MicrobialGrowthModel::default()
        };
        let r = noisy
            .evaluate(&ModelKind::Microbial.default_inputs(), &mut SimRng::new(3))
            .unwrap();
        assert!(r.values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_microbial_rejects_zero_population() {
        let model = MicrobialGrowthModel {
            n0: 0.0,
            ..MicrobialGrowthModel::default()
        };
        assert!(model.evaluate(&[1.0], &mut SimRng::new(1)).is_err());
    }

    #[test]
    fn test_common_input_checks() {
        let model = SolubilityModel::default();
        assert!(model.evaluate(&[], &mut SimRng::new(1)).is_err());
        assert!(model.evaluate(&[f64::NAN], &mut SimRng::new(1)).is_err());
        let negative_noise = SolubilityModel {
            noise: -1.0,
            ..model
        };
        assert!(negative_noise.evaluate(&[25.0], &mut SimRng::new(1)).is_err());
    }

    #[test]
    fn test_params_roundtrip() {
        let model = MicrobialGrowthModel::default();
        let rebuilt = MicrobialGrowthModel::with_params(&model.params()).unwrap();
        assert_eq!(model, rebuilt);
        assert!(SolubilityModel::with_params(&[1.0, 2.0]).is_err());
        assert_eq!(
            SolubilityModel::PARAMETER_NAMES.len(),
            SolubilityModel::default().params().len()
        );
    }

    #[test]
    fn test_statistics_attached() {
        let model = TextureModel {
            noise: 0.0,
            ..TextureModel::default()
        };
        let r = model.evaluate(&[0.0, 20.0, 40.0], &mut SimRng::new(1)).unwrap();
        assert_eq!(r.statistics.max, 100.0);
        assert_eq!(r.statistics.median, r.values[1]);
    }

    #[test]
    fn test_default_inputs() {
        for kind in ModelKind::ALL {
            let inputs = kind.default_inputs();
            assert_eq!(inputs.len(), DEFAULT_GRID_POINTS);
            assert!(inputs.windows(2).all(|w| w[0] < w[1]));
        }
        assert_eq!(ModelKind::Solubility.default_inputs()[0], 20.0);
        assert!((ModelKind::Microbial.default_inputs()[49] - 47.04).abs() < 1e-9);
    }

    #[test]
    fn test_default_variations_within_parameter_vector() {
        for kind in ModelKind::ALL {
            let n = kind.parameter_names().len();
            for (&index, range) in &kind.default_variations() {
                assert!(index < n - 1, "{kind}: noise must not be varied");
                assert!(range.min < range.max);
            }
        }
    }

    #[test]
    fn test_kind_parsing() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
        assert_eq!("shelfLife".parse::<ModelKind>().unwrap(), ModelKind::ShelfLife);
        assert!("viscosity".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_every_kind_runs_on_default_grid() {
        let mut rng = SimRng::new(42);
        for kind in ModelKind::ALL {
            let r = kind.run(&kind.default_inputs(), &mut rng).unwrap();
            assert_eq!(r.values.len(), DEFAULT_GRID_POINTS);
        }
    }
}
