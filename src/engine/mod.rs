//! Core simulation engine.
//!
//! [`QualificationEngine`] couples a validated [`SimConfig`] with one
//! [`SimRng`] and exposes every simulation the crate offers:
//! - Deterministic RNG (PCG with partitioned seeds)
//! - Jidoka guards for stop-on-error
//! - Parameter, model and prediction Monte Carlo behind one handle
//!
//! Calls on the same engine advance the same generator, so a sequence of
//! calls is reproducible from the seed but two identical calls in a row
//! return different samples.

pub mod jidoka;
pub mod rng;

use std::collections::BTreeMap;

pub use jidoka::JidokaGuard;
pub use rng::SimRng;

use crate::config::SimConfig;
use crate::domains::model_mc::{ModelMonteCarloResult, ParamRange};
use crate::domains::models::{ModelKind, ModelResult};
use crate::domains::monte_carlo::{MonteCarloEngine, MultiParameterResult, SimulationResult};
use crate::domains::parameter::TestParameter;
use crate::domains::prediction::{
    simulate_correlated_parameters, simulate_test_results, CorrelatedSamples,
    PredictionSimulation, VariabilityProfile,
};
use crate::error::{SimError, SimResult};

/// Main simulation engine.
#[derive(Debug, Clone)]
pub struct QualificationEngine {
    /// Validated configuration.
    config: SimConfig,
    /// Parameter simulator built from the configuration.
    monte_carlo: MonteCarloEngine,
    /// Random number generator.
    rng: SimRng,
}

impl QualificationEngine {
    /// Create a new engine from configuration.
    ///
    /// Seeds from `config.seed`, or from entropy when absent.
    ///
    /// # Errors
    ///
    /// Returns error if configuration validation fails.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.check()?;
        let monte_carlo = config.monte_carlo_engine()?;
        let rng = SimRng::from_optional_seed(config.seed);
        Ok(Self {
            config,
            monte_carlo,
            rng,
        })
    }

    /// Engine with default configuration and a fixed seed.
    ///
    /// # Errors
    ///
    /// Never fails for the default configuration; the `Result` mirrors
    /// [`QualificationEngine::new`].
    pub fn with_seed(seed: u64) -> SimResult<Self> {
        Self::new(SimConfig::builder().seed(seed).build())
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Seed the generator was built from, including an entropy-drawn one.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.master_seed()
    }

    /// Get reference to RNG.
    #[must_use]
    pub const fn rng(&self) -> &SimRng {
        &self.rng
    }

    /// Get mutable reference to RNG.
    #[must_use]
    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    /// Simulate one parameter.
    ///
    /// # Errors
    ///
    /// See [`MonteCarloEngine::run`].
    pub fn run_single(&mut self, parameter: &TestParameter) -> SimResult<SimulationResult> {
        self.monte_carlo.run(parameter, &mut self.rng)
    }

    /// Simulate several parameters jointly.
    ///
    /// # Errors
    ///
    /// See [`MonteCarloEngine::run_multi`].
    pub fn run_multi(&mut self, parameters: &[TestParameter]) -> SimResult<MultiParameterResult> {
        self.monte_carlo.run_multi(parameters, &mut self.rng)
    }

    /// Evaluate a model with default constants, over `inputs` or the
    /// model's default grid.
    ///
    /// # Errors
    ///
    /// See [`crate::domains::models::ScientificModel::evaluate`].
    pub fn run_model(&mut self, kind: ModelKind, inputs: Option<&[f64]>) -> SimResult<ModelResult> {
        match inputs {
            Some(inputs) => kind.run(inputs, &mut self.rng),
            None => kind.run(&kind.default_inputs(), &mut self.rng),
        }
    }

    /// Model Monte Carlo over the default grid and variation preset.
    ///
    /// `iterations` overrides `config.model_iterations`.
    ///
    /// # Errors
    ///
    /// See [`crate::domains::model_mc::monte_carlo_simulation`].
    pub fn run_model_monte_carlo(
        &mut self,
        kind: ModelKind,
        iterations: Option<usize>,
    ) -> SimResult<ModelMonteCarloResult> {
        self.run_model_monte_carlo_with(
            kind,
            &kind.default_inputs(),
            &kind.default_variations(),
            iterations,
        )
    }

    /// Model Monte Carlo with a caller-supplied grid and variations.
    ///
    /// # Errors
    ///
    /// See [`crate::domains::model_mc::monte_carlo_simulation`].
    pub fn run_model_monte_carlo_with(
        &mut self,
        kind: ModelKind,
        inputs: &[f64],
        variations: &BTreeMap<usize, ParamRange>,
        iterations: Option<usize>,
    ) -> SimResult<ModelMonteCarloResult> {
        let iterations = iterations.unwrap_or(self.config.model_iterations);
        kind.monte_carlo(inputs, variations, iterations, &mut self.rng)
    }

    /// Simulate test results around an external prediction, using
    /// `config.iterations` draws.
    ///
    /// # Errors
    ///
    /// See [`simulate_test_results`].
    pub fn simulate_prediction(
        &mut self,
        base_prediction: f64,
        profile: &VariabilityProfile,
    ) -> SimResult<PredictionSimulation> {
        if !base_prediction.is_finite() {
            return Err(SimError::invalid_parameter(
                "base_prediction",
                format!("must be finite, got {base_prediction}"),
            ));
        }
        simulate_test_results(base_prediction, profile, self.config.iterations, &mut self.rng)
    }

    /// Draw correlated process parameters, `config.iterations` rows.
    ///
    /// # Errors
    ///
    /// See [`simulate_correlated_parameters`].
    pub fn simulate_correlated<S: AsRef<str>>(
        &mut self,
        parameters: &[(S, f64)],
        correlation: &[Vec<f64>],
    ) -> SimResult<CorrelatedSamples> {
        simulate_correlated_parameters(
            parameters,
            correlation,
            self.config.iterations,
            &mut self.rng,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn engine(seed: u64) -> QualificationEngine {
        QualificationEngine::new(SimConfig::builder().seed(seed).iterations(2000).build()).unwrap()
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = SimConfig::builder().iterations(0).build();
        assert!(QualificationEngine::new(config).is_err());
        let config = SimConfig::builder().confidence_level(100.0).build();
        assert!(QualificationEngine::new(config).is_err());
    }

    #[test]
    fn test_engine_reports_seed() {
        assert_eq!(engine(77).seed(), 77);
        let unseeded = QualificationEngine::new(SimConfig::default()).unwrap();
        let replay = QualificationEngine::with_seed(unseeded.seed()).unwrap();
        assert_eq!(unseeded.seed(), replay.seed());
    }

    #[test]
    fn test_engine_reproducible_sequence() {
        let param = TestParameter::normal("ph", 6.5, 0.2).with_acceptance(6.5, 0.3);
        let mut a = engine(5);
        let mut b = engine(5);
        assert_eq!(a.run_single(&param).unwrap(), b.run_single(&param).unwrap());
        assert_eq!(a.run_single(&param).unwrap(), b.run_single(&param).unwrap());
    }

    #[test]
    fn test_engine_uses_config_iterations() {
        let mut e = engine(1);
        let r = e.run_single(&TestParameter::normal("x", 0.0, 1.0)).unwrap();
        assert_eq!(r.iterations, 2000);
        assert!(r.success_probability.is_none());
    }

    #[test]
    fn test_engine_multi() {
        let mut e = engine(9);
        let params = [
            TestParameter::normal("a", 10.0, 1.0).with_acceptance(10.0, 2.0),
            TestParameter::triangular("b", 0.0, 5.0, 10.0),
        ];
        let r = e.run_multi(&params).unwrap();
        assert_eq!(r.individual.len(), 2);
        assert!(r.overall.success_probability.is_some());
    }

    #[test]
    fn test_engine_models() {
        let mut e = engine(3);
        let curve = e.run_model(ModelKind::Texture, None).unwrap();
        assert_eq!(curve.values.len(), 50);
        let custom = e.run_model(ModelKind::Texture, Some(&[0.0, 1.0])).unwrap();
        assert_eq!(custom.values.len(), 2);

        let mc = e.run_model_monte_carlo(ModelKind::Dissociation, Some(40)).unwrap();
        assert_eq!(mc.iterations, 40);
        let mc = e.run_model_monte_carlo(ModelKind::Dissociation, None).unwrap();
        assert_eq!(mc.iterations, 1000);
    }

    #[test]
    fn test_engine_prediction() {
        let mut e = engine(8);
        let sim = e
            .simulate_prediction(50.0, &VariabilityProfile::default())
            .unwrap();
        assert_eq!(sim.samples.len(), 2000);
        assert!(e
            .simulate_prediction(f64::INFINITY, &VariabilityProfile::default())
            .is_err());
    }

    #[test]
    fn test_engine_correlated_parameters() {
        let params = [("temperature", 180.0), ("line_speed", 12.0)];
        let correlation = vec![vec![1.0, -0.3], vec![-0.3, 1.0]];
        let a = engine(8).simulate_correlated(&params, &correlation).unwrap();
        let b = engine(8).simulate_correlated(&params, &correlation).unwrap();
        assert_eq!(a.rows.len(), 2000);
        assert_eq!(a, b);
        assert!(a.rows.iter().all(|row| row.len() == 2));
    }
}
