//! Test parameters under simulation.
//!
//! A [`TestParameter`] is one uncertain manufacturing or process variable.
//! Its sampling rule is fixed at construction as a tagged [`Distribution`],
//! so the simulators never have to guess from which optional bounds happen
//! to be present. Loosely-shaped records coming from files or a request
//! layer ([`ParameterRecord`], [`QualificationTest`]) are converted with
//! validation.

use serde::{Deserialize, Serialize};

use crate::engine::rng::{check_triangular, SimRng};
use crate::error::{SimError, SimResult};

/// Sampling distribution of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    /// Normal draw, clamped post-hoc to whichever bound is present.
    Normal {
        /// Center.
        mean: f64,
        /// Spread.
        std_dev: f64,
        /// Lower clamp.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Upper clamp.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Triangular draw over `[min, max]` peaking at `mode`.
    Triangular {
        /// Lower bound.
        min: f64,
        /// Peak.
        mode: f64,
        /// Upper bound.
        max: f64,
    },
}

impl Distribution {
    /// Unclamped normal distribution.
    #[must_use]
    pub const fn normal(mean: f64, std_dev: f64) -> Self {
        Self::Normal {
            mean,
            std_dev,
            min: None,
            max: None,
        }
    }

    /// Center of the distribution (mean or mode).
    #[must_use]
    pub const fn center(&self) -> f64 {
        match self {
            Self::Normal { mean, .. } => *mean,
            Self::Triangular { mode, .. } => *mode,
        }
    }

    /// Draw one value.
    ///
    /// Assumes the distribution passed [`Distribution::validate`].
    pub fn sample(&self, rng: &mut SimRng) -> f64 {
        match *self {
            Self::Normal {
                mean,
                std_dev,
                min,
                max,
            } => {
                let mut value = rng.gen_normal(mean, std_dev);
                if let Some(lo) = min {
                    value = value.max(lo);
                }
                if let Some(hi) = max {
                    value = value.min(hi);
                }
                value
            }
            Self::Triangular { min, mode, max } => rng.gen_triangular_unchecked(min, mode, max),
        }
    }

    /// Validate the distribution for parameter `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] for non-finite values, a
    /// negative standard deviation, or inconsistent bounds.
    pub fn validate(&self, name: &str) -> SimResult<()> {
        match *self {
            Self::Normal {
                mean,
                std_dev,
                min,
                max,
            } => {
                if !mean.is_finite() {
                    return Err(SimError::invalid_parameter(name, "mean must be finite"));
                }
                if !std_dev.is_finite() || std_dev < 0.0 {
                    return Err(SimError::invalid_parameter(
                        name,
                        format!("standard deviation must be finite and >= 0, got {std_dev}"),
                    ));
                }
                if min.is_some_and(|v| !v.is_finite()) || max.is_some_and(|v| !v.is_finite()) {
                    return Err(SimError::invalid_parameter(name, "bounds must be finite"));
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(SimError::invalid_parameter(
                            name,
                            format!("min {lo} exceeds max {hi}"),
                        ));
                    }
                }
                Ok(())
            }
            Self::Triangular { min, mode, max } => {
                check_triangular(min, mode, max).map_err(|e| match e {
                    SimError::InvalidParameter { reason, .. } => {
                        SimError::invalid_parameter(name, reason)
                    }
                    other => other,
                })
            }
        }
    }
}

/// Acceptance band `[target - tolerance, target + tolerance]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceBand {
    /// Target value.
    pub target: f64,
    /// Half-width of the band.
    pub tolerance: f64,
}

impl AcceptanceBand {
    /// Create a band around `target`.
    #[must_use]
    pub const fn new(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance }
    }

    /// Lower limit.
    #[must_use]
    pub fn lower(&self) -> f64 {
        self.target - self.tolerance
    }

    /// Upper limit.
    #[must_use]
    pub fn upper(&self) -> f64 {
        self.target + self.tolerance
    }

    /// Whether `value` passes (limits inclusive).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower() && value <= self.upper()
    }
}

/// One uncertain variable in a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestParameter {
    /// Label, unique within a run.
    pub name: String,
    /// Sampling rule.
    pub distribution: Distribution,
    /// Pass/fail criterion, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance: Option<AcceptanceBand>,
}

impl TestParameter {
    /// Create a parameter with no acceptance criterion.
    #[must_use]
    pub fn new(name: impl Into<String>, distribution: Distribution) -> Self {
        Self {
            name: name.into(),
            distribution,
            acceptance: None,
        }
    }

    /// Unclamped normal parameter.
    #[must_use]
    pub fn normal(name: impl Into<String>, mean: f64, std_dev: f64) -> Self {
        Self::new(name, Distribution::normal(mean, std_dev))
    }

    /// Triangular parameter.
    #[must_use]
    pub fn triangular(name: impl Into<String>, min: f64, mode: f64, max: f64) -> Self {
        Self::new(name, Distribution::Triangular { min, mode, max })
    }

    /// Attach an acceptance band.
    #[must_use]
    pub const fn with_acceptance(mut self, target: f64, tolerance: f64) -> Self {
        self.acceptance = Some(AcceptanceBand::new(target, tolerance));
        self
    }

    /// Draw one value.
    pub fn sample(&self, rng: &mut SimRng) -> f64 {
        self.distribution.sample(rng)
    }

    /// Whether `value` passes. `None` when no criterion is defined.
    #[must_use]
    pub fn passes(&self, value: f64) -> Option<bool> {
        self.acceptance.map(|band| band.contains(value))
    }

    /// Validate the whole parameter.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] describing the first problem.
    pub fn validate(&self) -> SimResult<()> {
        if self.name.trim().is_empty() {
            return Err(SimError::invalid_parameter("<unnamed>", "name must not be empty"));
        }
        self.distribution.validate(&self.name)?;
        if let Some(band) = self.acceptance {
            if !band.target.is_finite() {
                return Err(SimError::invalid_parameter(&self.name, "target must be finite"));
            }
            if !band.tolerance.is_finite() || band.tolerance < 0.0 {
                return Err(SimError::invalid_parameter(
                    &self.name,
                    format!("tolerance must be finite and >= 0, got {}", band.tolerance),
                ));
            }
        }
        Ok(())
    }
}

/// Loosely-shaped parameter record as found in request files.
///
/// Both `min` and `max` present selects a triangular distribution with
/// mode = `mean`; otherwise the draw is normal, clamped to whichever bound
/// exists. The acceptance band needs both `target_value` and `tolerance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterRecord {
    /// Label.
    pub name: String,
    /// Center.
    pub mean: f64,
    /// Spread for normal sampling.
    #[serde(default, alias = "stdDev")]
    pub std_dev: f64,
    /// Lower bound.
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound.
    #[serde(default)]
    pub max: Option<f64>,
    /// Acceptance target.
    #[serde(default, alias = "targetValue")]
    pub target_value: Option<f64>,
    /// Acceptance half-width.
    #[serde(default)]
    pub tolerance: Option<f64>,
}

impl TryFrom<ParameterRecord> for TestParameter {
    type Error = SimError;

    fn try_from(record: ParameterRecord) -> SimResult<Self> {
        let distribution = match (record.min, record.max) {
            (Some(min), Some(max)) => Distribution::Triangular {
                min,
                mode: record.mean,
                max,
            },
            (min, max) => Distribution::Normal {
                mean: record.mean,
                std_dev: record.std_dev,
                min,
                max,
            },
        };
        let acceptance = match (record.target_value, record.tolerance) {
            (Some(target), Some(tolerance)) => Some(AcceptanceBand::new(target, tolerance)),
            _ => None,
        };
        let parameter = Self {
            name: record.name,
            distribution,
            acceptance,
        };
        parameter.validate()?;
        Ok(parameter)
    }
}

/// A qualification test as the request layer stores it.
///
/// Only the target and tolerance are known, so the spread is derived from
/// a 3-sigma assumption: `std_dev = tolerance / 3`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualificationTest {
    /// Test name.
    pub name: String,
    /// Target value.
    #[serde(default, alias = "targetValue")]
    pub target_value: Option<f64>,
    /// Tolerance around the target.
    #[serde(default)]
    pub tolerance: Option<f64>,
    /// Minimum acceptable reading.
    #[serde(default, alias = "minValue")]
    pub min_value: Option<f64>,
    /// Maximum acceptable reading.
    #[serde(default, alias = "maxValue")]
    pub max_value: Option<f64>,
}

impl QualificationTest {
    /// Derive the simulation parameter for this test.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] if the derived parameter is
    /// inconsistent (e.g. target outside `[min_value, max_value]`).
    pub fn to_parameter(&self) -> SimResult<TestParameter> {
        ParameterRecord {
            name: self.name.clone(),
            mean: self.target_value.unwrap_or(0.0),
            std_dev: self.tolerance.unwrap_or(0.0) / 3.0,
            min: self.min_value,
            max: self.max_value,
            target_value: self.target_value,
            tolerance: self.tolerance,
        }
        .try_into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn record(name: &str) -> ParameterRecord {
        ParameterRecord {
            name: name.to_string(),
            mean: 10.0,
            std_dev: 1.0,
            min: None,
            max: None,
            target_value: None,
            tolerance: None,
        }
    }

    #[test]
    fn test_both_bounds_select_triangular() {
        let p: TestParameter = ParameterRecord {
            min: Some(8.0),
            max: Some(13.0),
            ..record("brix")
        }
        .try_into()
        .unwrap();
        assert_eq!(
            p.distribution,
            Distribution::Triangular {
                min: 8.0,
                mode: 10.0,
                max: 13.0
            }
        );
    }

    #[test]
    fn test_single_bound_stays_normal() {
        let p: TestParameter = ParameterRecord {
            min: Some(9.5),
            ..record("ph")
        }
        .try_into()
        .unwrap();
        assert!(matches!(
            p.distribution,
            Distribution::Normal {
                min: Some(_),
                max: None,
                ..
            }
        ));
    }

    #[test]
    fn test_clamping_applies() {
        let p = TestParameter::new(
            "moisture",
            Distribution::Normal {
                mean: 0.0,
                std_dev: 5.0,
                min: Some(-1.0),
                max: None,
            },
        );
        let mut rng = SimRng::new(1);
        for _ in 0..1000 {
            assert!(p.sample(&mut rng) >= -1.0);
        }
    }

    #[test]
    fn test_acceptance_requires_both_fields() {
        let p: TestParameter = ParameterRecord {
            target_value: Some(10.0),
            ..record("a")
        }
        .try_into()
        .unwrap();
        assert!(p.acceptance.is_none());
        assert_eq!(p.passes(10.0), None);

        let p: TestParameter = ParameterRecord {
            target_value: Some(10.0),
            tolerance: Some(0.5),
            ..record("b")
        }
        .try_into()
        .unwrap();
        assert_eq!(p.passes(10.5), Some(true));
        assert_eq!(p.passes(10.51), Some(false));
    }

    #[test]
    fn test_mean_outside_triangle_rejected() {
        let result: SimResult<TestParameter> = ParameterRecord {
            min: Some(11.0),
            max: Some(20.0),
            ..record("viscosity")
        }
        .try_into();
        match result {
            Err(SimError::InvalidParameter { name, .. }) => assert_eq!(name, "viscosity"),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_std_dev_rejected() {
        let result: SimResult<TestParameter> = ParameterRecord {
            std_dev: -0.1,
            ..record("x")
        }
        .try_into();
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let p = TestParameter::normal("x", 1.0, 0.1).with_acceptance(1.0, -0.2);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(TestParameter::normal("  ", 1.0, 0.1).validate().is_err());
    }

    #[test]
    fn test_record_accepts_camel_case_aliases() {
        let yaml = "name: fat\nmean: 3.5\nstdDev: 0.2\ntargetValue: 3.5\ntolerance: 0.4\n";
        let record: ParameterRecord = serde_yaml::from_str(yaml).unwrap();
        let p = TestParameter::try_from(record).unwrap();
        assert_eq!(p.acceptance, Some(AcceptanceBand::new(3.5, 0.4)));
    }

    #[test]
    fn test_qualification_test_mapping() {
        let test = QualificationTest {
            name: "Viscosity".to_string(),
            target_value: Some(1200.0),
            tolerance: Some(150.0),
            min_value: None,
            max_value: None,
        };
        let p = test.to_parameter().unwrap();
        assert_eq!(p.distribution, Distribution::normal(1200.0, 50.0));
        assert_eq!(p.acceptance, Some(AcceptanceBand::new(1200.0, 150.0)));
    }

    #[test]
    fn test_qualification_test_camel_case_and_unknown_fields() {
        let yaml = "name: pH\ntargetValue: 6.5\ntolerance: 0.3\nminValue: 6.0\nmaxValue: 7.0\n";
        let test: QualificationTest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(test.target_value, Some(6.5));
        assert_eq!(test.min_value, Some(6.0));
        assert_eq!(test.max_value, Some(7.0));

        let typo = "name: pH\ntarget: 6.5\n";
        assert!(serde_yaml::from_str::<QualificationTest>(typo).is_err());
    }

    #[test]
    fn test_qualification_test_without_target() {
        let test = QualificationTest {
            name: "Color".to_string(),
            ..QualificationTest::default()
        };
        let p = test.to_parameter().unwrap();
        assert_eq!(p.distribution.center(), 0.0);
        assert!(p.acceptance.is_none());
    }

    #[test]
    fn test_band_limits() {
        let band = AcceptanceBand::new(5.0, 0.25);
        assert_eq!(band.lower(), 4.75);
        assert_eq!(band.upper(), 5.25);
        assert!(band.contains(4.75));
        assert!(!band.contains(5.3));
    }
}
