//! Jidoka (自働化) - stop on numerical anomalies.
//!
//! Model evaluations and sample buffers pass through these guards before
//! they are aggregated. A single NaN or Inf stops the run with a
//! [`SimError::NonFiniteValue`] naming the offending location, instead of
//! poisoning every downstream statistic.

use crate::error::{SimError, SimResult};

/// Check one value, returning it unchanged when finite.
///
/// # Errors
///
/// Returns [`SimError::NonFiniteValue`] if `value` is NaN or infinite.
pub fn ensure_finite(location: impl FnOnce() -> String, value: f64) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::NonFiniteValue {
            location: location(),
        })
    }
}

/// Guard over a sample buffer or model curve.
#[derive(Debug, Clone, Copy)]
pub struct JidokaGuard<'a> {
    /// Name reported in violations (e.g. `"solubility"`).
    context: &'a str,
}

impl<'a> JidokaGuard<'a> {
    /// Create a guard reporting violations under `context`.
    #[must_use]
    pub const fn new(context: &'a str) -> Self {
        Self { context }
    }

    /// Check a single value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NonFiniteValue`] on NaN or Inf.
    pub fn check_value(&self, index: usize, value: f64) -> SimResult<f64> {
        ensure_finite(|| format!("{}[{index}]", self.context), value)
    }

    /// Check every value of a slice.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NonFiniteValue`] for the first non-finite entry.
    pub fn check_all(&self, values: &[f64]) -> SimResult<()> {
        values
            .iter()
            .enumerate()
            .try_for_each(|(i, &v)| self.check_value(i, v).map(|_| ()))
    }
}
