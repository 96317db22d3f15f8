//! Descriptive statistics over Monte Carlo samples.
//!
//! Percentiles use linear interpolation between the floor and ceil ranks
//! (the "R-7" rule). Confidence bounds are empirical order statistics of
//! the sorted sample, not a parametric z-interval.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::jidoka::ensure_finite;
use crate::error::{SimError, SimResult};

/// Default number of histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 50;

/// Sort a sample ascending.
#[must_use]
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Population mean and standard deviation (divisor `n`).
///
/// # Errors
///
/// Returns [`SimError::EmptySample`] if `values` is empty.
pub fn mean_std(values: &[f64]) -> SimResult<(f64, f64)> {
    if values.is_empty() {
        return Err(SimError::empty_sample("mean/std"));
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Ok((mean, variance.sqrt()))
}

/// Percentile `p` (0-100) of an ascending-sorted slice.
///
/// The slice must already be sorted; this is not re-checked.
///
/// # Errors
///
/// Returns [`SimError::EmptySample`] if `sorted` is empty.
pub fn calculate_percentile(sorted: &[f64], p: f64) -> SimResult<f64> {
    let last = sorted
        .len()
        .checked_sub(1)
        .ok_or_else(|| SimError::empty_sample("percentile"))?;

    let rank = (p / 100.0).clamp(0.0, 1.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        return Ok(sorted[lower]);
    }
    let weight = rank - lower as f64;
    Ok(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

/// Check that a confidence level lies strictly inside (0, 100).
///
/// # Errors
///
/// Returns [`SimError::InvalidConfidenceLevel`] otherwise.
pub fn validate_confidence_level(level: f64) -> SimResult<()> {
    if level > 0.0 && level < 100.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfidenceLevel(level))
    }
}

/// Empirical confidence interval at `level` percent.
///
/// With `α = (100 - level) / 100`, returns the sorted values at ranks
/// `floor(α/2 · n)` and `floor((1 - α/2) · n)`, the latter clamped to the
/// last index.
///
/// # Errors
///
/// Returns [`SimError::EmptySample`] or
/// [`SimError::InvalidConfidenceLevel`].
pub fn confidence_bounds(sorted: &[f64], level: f64) -> SimResult<(f64, f64)> {
    validate_confidence_level(level)?;
    let last = sorted
        .len()
        .checked_sub(1)
        .ok_or_else(|| SimError::empty_sample("confidence interval"))?;

    let n = sorted.len() as f64;
    let alpha = (100.0 - level) / 100.0;
    let lower_index = ((alpha / 2.0 * n).floor() as usize).min(last);
    let upper_index = (((1.0 - alpha / 2.0) * n).floor() as usize).min(last);

    Ok((sorted[lower_index], sorted[upper_index]))
}

/// Standard percentile set reported with every simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 5th percentile.
    pub p5: f64,
    /// 25th percentile.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 95th percentile.
    pub p95: f64,
}

impl Percentiles {
    /// Compute from an ascending-sorted sample.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptySample`] if `sorted` is empty.
    pub fn from_sorted(sorted: &[f64]) -> SimResult<Self> {
        Ok(Self {
            p5: calculate_percentile(sorted, 5.0)?,
            p25: calculate_percentile(sorted, 25.0)?,
            p50: calculate_percentile(sorted, 50.0)?,
            p75: calculate_percentile(sorted, 75.0)?,
            p95: calculate_percentile(sorted, 95.0)?,
        })
    }
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges, `num_bins + 1` entries.
    pub bins: Vec<f64>,
    /// Counts per bin, `num_bins` entries.
    pub frequencies: Vec<usize>,
}

impl Histogram {
    /// Number of bins.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.frequencies.len()
    }

    /// Total number of observations counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.frequencies.iter().sum()
    }
}

/// Bin `data` into `num_bins` equal-width bins over `[min, max]`.
///
/// The maximum falls in the last bin. A constant sample has zero range; it
/// is reported as a single spike: every observation in bin 0 and all edges
/// equal to the constant.
///
/// # Errors
///
/// Returns [`SimError::EmptySample`] for empty data,
/// [`SimError::Config`] when `num_bins` is zero and
/// [`SimError::NonFiniteValue`] when the sample range overflows `f64`.
pub fn create_histogram(data: &[f64], num_bins: usize) -> SimResult<Histogram> {
    if num_bins == 0 {
        return Err(SimError::config("histogram needs at least one bin"));
    }
    if data.is_empty() {
        return Err(SimError::empty_sample("histogram"));
    }

    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut frequencies = vec![0_usize; num_bins];

    if max <= min {
        warn!(value = min, n = data.len(), "histogram over constant sample");
        frequencies[0] = data.len();
        return Ok(Histogram {
            bins: vec![min; num_bins + 1],
            frequencies,
        });
    }

    let bin_width = ensure_finite(
        || "histogram bin width".to_string(),
        (max - min) / num_bins as f64,
    )?;
    let bins = (0..=num_bins).map(|i| min + i as f64 * bin_width).collect();

    for &value in data {
        let index = (((value - min) / bin_width).floor() as usize).min(num_bins - 1);
        frequencies[index] += 1;
    }

    Ok(Histogram { bins, frequencies })
}

/// Summary statistics of a model curve or set of means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveStats {
    /// Mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Median (average of the two middle values for even length).
    pub median: f64,
}

impl DescriptiveStats {
    /// Compute over `values` in any order.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptySample`] if `values` is empty.
    pub fn from_values(values: &[f64]) -> SimResult<Self> {
        let (mean, std_dev) = mean_std(values)?;
        let sorted = sorted_copy(values);
        let n = sorted.len();
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        Ok(Self {
            mean,
            std_dev,
            min: sorted[0],
            max: sorted[n - 1],
            median,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        // rank = 0.25 * 3 = 0.75
        let p25 = calculate_percentile(&sorted, 25.0).unwrap();
        assert!((p25 - 1.75).abs() < 1e-12);
        assert_eq!(calculate_percentile(&sorted, 0.0).unwrap(), 1.0);
        assert_eq!(calculate_percentile(&sorted, 100.0).unwrap(), 4.0);
    }

    #[test]
    fn test_median_matches_standard_definition() {
        let odd = [1.0, 3.0, 7.0];
        let even = [1.0, 3.0, 7.0, 9.0];
        assert_eq!(calculate_percentile(&odd, 50.0).unwrap(), 3.0);
        assert!((calculate_percentile(&even, 50.0).unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(DescriptiveStats::from_values(&even).unwrap().median, 5.0);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(calculate_percentile(&[42.0], 95.0).unwrap(), 42.0);
    }

    #[test]
    fn test_percentile_empty_is_error() {
        assert!(matches!(
            calculate_percentile(&[], 50.0),
            Err(SimError::EmptySample { .. })
        ));
    }

    #[test]
    fn test_mean_std_population() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
    }

    #[test]
    fn test_confidence_bounds_ranks() {
        let sorted: Vec<f64> = (0..100).map(f64::from).collect();
        // alpha = 0.1 -> ranks floor(5) and floor(95)
        let (lo, hi) = confidence_bounds(&sorted, 90.0).unwrap();
        assert_eq!(lo, 5.0);
        assert_eq!(hi, 95.0);
    }

    #[test]
    fn test_confidence_bounds_small_sample_clamped() {
        let (lo, hi) = confidence_bounds(&[3.0], 95.0).unwrap();
        assert_eq!((lo, hi), (3.0, 3.0));
    }

    #[test]
    fn test_confidence_level_validation() {
        assert!(validate_confidence_level(95.0).is_ok());
        assert!(validate_confidence_level(0.0).is_err());
        assert!(validate_confidence_level(100.0).is_err());
        assert!(validate_confidence_level(f64::NAN).is_err());
        assert!(confidence_bounds(&[1.0, 2.0], 150.0).is_err());
    }

    #[test]
    fn test_histogram_shape() {
        let data: Vec<f64> = (0..1000).map(|i| f64::from(i) / 10.0).collect();
        let h = create_histogram(&data, DEFAULT_HISTOGRAM_BINS).unwrap();
        assert_eq!(h.bins.len(), 51);
        assert_eq!(h.frequencies.len(), 50);
        assert_eq!(h.total(), data.len());
        assert_eq!(h.bins[0], 0.0);
        assert!((h.bins[50] - 99.9).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_max_in_last_bin() {
        let h = create_histogram(&[0.0, 1.0, 2.0, 10.0], 5).unwrap();
        assert_eq!(h.frequencies[4], 1);
        assert_eq!(h.frequencies[0], 2);
    }

    #[test]
    fn test_histogram_constant_sample_is_single_spike() {
        let h = create_histogram(&[5.0, 5.0, 5.0, 5.0], DEFAULT_HISTOGRAM_BINS).unwrap();
        assert_eq!(h.frequencies[0], 4);
        assert_eq!(h.total(), 4);
        assert!(h.frequencies[1..].iter().all(|&f| f == 0));
        assert!(h.bins.iter().all(|&b| b == 5.0));
    }

    #[test]
    fn test_histogram_rejects_empty_and_zero_bins() {
        assert!(matches!(
            create_histogram(&[], 10),
            Err(SimError::EmptySample { .. })
        ));
        assert!(create_histogram(&[1.0], 0).is_err());
    }

    #[test]
    fn test_histogram_overflowing_range_is_error() {
        let err = create_histogram(&[-1.5e308, 0.0, 1.5e308], 5).unwrap_err();
        assert!(matches!(err, SimError::NonFiniteValue { .. }), "{err:?}");
        let ok = create_histogram(&[-5.0e307, 0.0, 5.0e307], 5).unwrap();
        assert!(ok.bins.iter().all(|b| b.is_finite()));
        assert_eq!(ok.total(), 3);
    }

    #[test]
    fn test_descriptive_stats() {
        let stats = DescriptiveStats::from_values(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.mean, 2.0);
        assert!(DescriptiveStats::from_values(&[]).is_err());
    }

    #[test]
    fn test_percentiles_ordered() {
        let sorted: Vec<f64> = (1..=200).map(f64::from).collect();
        let p = Percentiles::from_sorted(&sorted).unwrap();
        assert!(p.p5 <= p.p25 && p.p25 <= p.p50 && p.p50 <= p.p75 && p.p75 <= p.p95);
    }
}
