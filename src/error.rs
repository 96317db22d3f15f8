//! Error types for qualisim.
//!
//! Every engine entry point returns `Result<T, SimError>`; invalid input is
//! rejected up front instead of leaking `NaN` into a result.

use thiserror::Error;

/// Result type alias for qualisim operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all qualisim operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Invalid Input =====
    /// A test parameter failed validation.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Iteration count must be at least one.
    #[error("Iteration count must be positive, got {0}")]
    InvalidIterations(usize),

    /// Confidence level must lie strictly between 0 and 100.
    #[error("Confidence level must be in (0, 100), got {0}")]
    InvalidConfidenceLevel(f64),

    /// Multi-parameter simulation requires at least one parameter.
    #[error("Parameter list is empty")]
    EmptyParameterList,

    /// Parameter names must be unique within a run.
    #[error("Duplicate parameter name '{0}'")]
    DuplicateParameter(String),

    /// Scientific model received unusable input.
    #[error("Model '{model}': {reason}")]
    InvalidModelInput {
        /// Model name.
        model: String,
        /// What is wrong with the input.
        reason: String,
    },

    // ===== Degenerate Data =====
    /// Statistics requested over an empty sample.
    #[error("Empty sample: {context}")]
    EmptySample {
        /// Which computation received the empty sample.
        context: String,
    },

    // ===== Numerical =====
    /// Numerical instability detected (NaN or Inf).
    #[error("Non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid-parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-model-input error.
    #[must_use]
    pub fn model_input(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidModelInput {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Create an empty-sample error.
    #[must_use]
    pub fn empty_sample(context: impl Into<String>) -> Self {
        Self::EmptySample {
            context: context.into(),
        }
    }

    /// Check if this error was caused by caller input (as opposed to
    /// numerical breakdown or I/O).
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. }
                | Self::InvalidIterations(_)
                | Self::InvalidConfidenceLevel(_)
                | Self::EmptyParameterList
                | Self::DuplicateParameter(_)
                | Self::InvalidModelInput { .. }
        )
    }
}
