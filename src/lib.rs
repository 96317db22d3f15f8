//! # qualisim
//!
//! Monte Carlo risk simulation for industrial product-qualification tests.
//!
//! - Single- and multi-parameter simulation of test variables against
//!   acceptance bands, with empirical confidence bounds, percentiles and
//!   histograms
//! - Five physico-chemical models (Van't Hoff, dissociation, Maxwell,
//!   Arrhenius, Gompertz) and a Monte Carlo driver over their constants
//! - Uncertainty bands around externally predicted test results
//!
//! Every sampling call takes an explicit [`engine::rng::SimRng`], so any run
//! is reproducible from its seed.
//!
//! ## Example
//!
//! ```rust
//! use qualisim::prelude::*;
//!
//! let config = SimConfig::builder().seed(42).iterations(2000).build();
//! let mut engine = QualificationEngine::new(config).unwrap();
//!
//! let moisture = TestParameter::normal("moisture", 3.0, 0.2).with_acceptance(3.0, 0.5);
//! let result = engine.run_single(&moisture).unwrap();
//! assert!(result.success_probability.unwrap() > 95.0);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Formulas are written as published
    clippy::imprecise_flops,
    clippy::missing_const_for_fn,
    clippy::manual_midpoint,
)]

pub mod cli;
pub mod config;
pub mod domains;
pub mod engine;
pub mod error;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{SimConfig, SimConfigBuilder, SimulationRequest};
    pub use crate::domains::model_mc::{monte_carlo_simulation, ModelMonteCarloResult, ParamRange};
    pub use crate::domains::models::{ModelKind, ModelResult, ScientificModel};
    pub use crate::domains::monte_carlo::{
        run_monte_carlo_simulation, run_multi_parameter_simulation, MonteCarloEngine,
        MultiParameterResult, SimulationResult,
    };
    pub use crate::domains::parameter::{
        AcceptanceBand, Distribution, QualificationTest, TestParameter,
    };
    pub use crate::domains::prediction::{LimitKind, ProcessVariability, VariabilityProfile};
    pub use crate::engine::jidoka::JidokaGuard;
    pub use crate::engine::rng::SimRng;
    pub use crate::engine::QualificationEngine;
    pub use crate::error::{SimError, SimResult};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
