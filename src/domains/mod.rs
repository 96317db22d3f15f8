//! Domain-specific simulation engines.
//!
//! - Parameters: distributions and acceptance bands of test variables
//! - Statistics: percentiles, histograms, empirical confidence bounds
//! - Monte Carlo: single- and multi-parameter risk simulation
//! - Models: closed-form physico-chemical laws and their Monte Carlo driver
//! - Prediction: uncertainty around an external point prediction

pub mod model_mc;
pub mod models;
pub mod monte_carlo;
pub mod parameter;
pub mod prediction;
pub mod statistics;

pub use model_mc::{
    monte_carlo_simulation, AggregatedModelResult, ConfidenceBand, ModelMonteCarloResult,
    ParamRange, DEFAULT_MODEL_ITERATIONS,
};
pub use models::{
    DissociationModel, MicrobialGrowthModel, ModelKind, ModelResult, ScientificModel,
    ShelfLifeModel, SolubilityModel, TextureModel,
};
pub use monte_carlo::{
    run_monte_carlo_simulation, run_multi_parameter_simulation, MonteCarloEngine,
    MultiParameterResult, SimulationResult,
};
pub use parameter::{
    AcceptanceBand, Distribution, ParameterRecord, QualificationTest, TestParameter,
};
pub use prediction::{
    estimate_formula_variability, estimate_process_variability, prediction_interval,
    probability_of_fail, simulate_correlated_parameters, simulate_test_results,
    CorrelatedSamples, LimitKind, PredictionSimulation, PredictionStats, ProcessVariability,
    VariabilityProfile,
};
pub use statistics::{DescriptiveStats, Histogram, Percentiles};
