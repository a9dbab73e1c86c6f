//! Batch statistics and the log-space decay fit.
//!
//! Provides the aggregate measures used by the validator plus tolerance
//! comparison for stochastic quantities.

#![allow(clippy::cast_precision_loss)]

use crate::types::ValidateError;

/// Arithmetic mean; 0.0 for an empty slice.
#[must_use]
pub fn mean(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().sum::<f64>() / sample.len() as f64
}

/// Population variance; 0.0 for an empty slice.
#[must_use]
pub fn variance(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let m = mean(sample);
    sample.iter().map(|x| (x - m).powi(2)).sum::<f64>() / sample.len() as f64
}

/// Population standard deviation.
#[must_use]
pub fn std_dev(sample: &[f64]) -> f64 {
    variance(sample).sqrt()
}

/// Root-mean-square; 0.0 for an empty slice.
#[must_use]
pub fn rms(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    (sample.iter().map(|x| x * x).sum::<f64>() / sample.len() as f64).sqrt()
}

/// Pearson correlation coefficient of two equal-length slices.
///
/// Returns 0.0 when either slice is degenerate (empty, mismatched length, or
/// zero variance).
#[must_use]
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        cov / denom
    }
}

/// Checks if actual value is within relative tolerance of expected value.
#[inline]
#[must_use]
pub fn within_tolerance(actual: f64, expected: f64, tolerance: f64) -> bool {
    if expected.abs() < f64::EPSILON {
        actual.abs() <= tolerance
    } else {
        let relative_diff = (actual - expected).abs() / expected.abs();
        relative_diff <= tolerance
    }
}

/// Binomial standard error of a probability estimate from `n_shots` trials.
#[inline]
#[must_use]
pub fn binomial_std_err(q: f64, n_shots: usize) -> f64 {
    if n_shots == 0 {
        return 0.0;
    }
    ((q * (1.0 - q)).max(0.0) / n_shots as f64).sqrt()
}

/// A fitted exponential decay `variance ~ exp(intercept - rate * depth)`.
#[derive(Debug, Clone, Copy)]
pub struct DecayFit {
    /// Decay rate per unit depth (positive for decaying data).
    pub rate: f64,
    /// Log-variance extrapolated to depth 0.
    pub intercept: f64,
}

impl DecayFit {
    /// Fitted variance at a given depth.
    #[must_use]
    pub fn predict(&self, depth: f64) -> f64 {
        self.rate.mul_add(-depth, self.intercept).exp()
    }
}

/// Fits `ln(variance) = intercept - rate * depth` by ordinary least squares.
///
/// Depths are centered before fitting to keep the normal equations well
/// conditioned. Variances at or below zero have no logarithm and are rejected
/// up front rather than silently skewing the fit.
pub fn fit_log_decay(depths: &[f64], variances: &[f64]) -> Result<DecayFit, ValidateError> {
    if depths.len() != variances.len() || depths.len() < 2 {
        return Err(ValidateError::DegenerateFit { got: depths.len() });
    }
    for (&d, &v) in depths.iter().zip(variances) {
        if v <= 0.0 {
            return Err(ValidateError::NonPositiveVariance {
                depth: d,
                variance: v,
            });
        }
    }

    let log_var: Vec<f64> = variances.iter().map(|v| v.ln()).collect();
    let x_mean = mean(depths);
    let y_mean = mean(&log_var);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&x, &y) in depths.iter().zip(&log_var) {
        let dx = x - x_mean;
        sxx += dx * dx;
        sxy += dx * (y - y_mean);
    }

    if sxx < f64::EPSILON {
        return Err(ValidateError::DegenerateFit { got: depths.len() });
    }

    let slope = sxy / sxx;
    Ok(DecayFit {
        rate: -slope,
        intercept: slope.mul_add(-x_mean, y_mean),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&xs) - 5.0).abs() < 1e-12);
        assert!((std_dev(&xs) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rms_of_residuals() {
        assert!((rms(&[3.0, 4.0]) - 12.5f64.sqrt()).abs() < 1e-12);
        assert!(rms(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn pearson_perfect_linear() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_degenerate_is_zero() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).abs() < f64::EPSILON);
        assert!(pearson(&[], &[]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_within_tolerance_pass() {
        assert!(within_tolerance(100.5, 100.0, 0.01));
    }

    #[test]
    fn test_within_tolerance_fail() {
        assert!(!within_tolerance(102.0, 100.0, 0.01));
    }

    #[test]
    fn binomial_err_peaks_at_half() {
        let err = binomial_std_err(0.5, 52);
        assert!((err - (0.25f64 / 52.0).sqrt()).abs() < 1e-12);
        assert!(binomial_std_err(0.1, 52) < err);
        assert!(binomial_std_err(0.0, 52).abs() < f64::EPSILON);
    }

    #[test]
    fn decay_fit_recovers_exact_rate() {
        // variance = 0.25 * 0.9^depth, so the rate is exactly -ln(0.9).
        let depths = [1.0, 2.0, 4.0, 8.0, 16.0];
        let variances: Vec<f64> = depths.iter().map(|d| 0.25 * 0.9f64.powf(*d)).collect();
        let fit = fit_log_decay(&depths, &variances).unwrap();
        assert!((fit.rate + 0.9f64.ln()).abs() < 1e-9);
        assert!((fit.predict(0.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn decay_fit_noisy_table() {
        // Noisy variances decaying across depth: the fit must still report a
        // positive, finite decay rate.
        let depths = [1.0, 2.0, 4.0, 8.0, 16.0];
        let variances = [0.25, 0.225, 0.2025, 0.164, 0.133];
        let fit = fit_log_decay(&depths, &variances).unwrap();
        assert!(fit.rate > 0.0);
        assert!(fit.rate.is_finite());
        assert!(fit.predict(16.0) < fit.predict(1.0));
    }

    #[test]
    fn decay_fit_rejects_non_positive_variance() {
        let err = fit_log_decay(&[1.0, 2.0], &[0.25, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            ValidateError::NonPositiveVariance { .. }
        ));
    }

    #[test]
    fn decay_fit_rejects_single_point() {
        assert!(matches!(
            fit_log_decay(&[1.0], &[0.25]).unwrap_err(),
            ValidateError::DegenerateFit { got: 1 }
        ));
    }

    #[test]
    fn decay_fit_rejects_identical_depths() {
        assert!(matches!(
            fit_log_decay(&[2.0, 2.0], &[0.25, 0.2]).unwrap_err(),
            ValidateError::DegenerateFit { got: 2 }
        ));
    }
}
