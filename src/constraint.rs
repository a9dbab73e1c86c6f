//! The semicircle reference function and the batch validator.
//!
//! The closed form under test is C(q) = sqrt(q(1-q)); normalization forces
//! every (q, C) pair onto the circle (q - 1/2)^2 + C^2 = 1/4.

use crate::stats;
use crate::types::{SamplePoint, Thresholds, ValidateError, ValidationResult};

/// The operating point where C(q) and the efficiency q(1-q) peak.
pub const APEX_Q: f64 = 0.5;

/// Reference correlation C(q) = sqrt(q(1-q)).
///
/// Noise can push q(1-q) slightly negative near the endpoints; that is
/// clamped to zero before the square root.
#[inline]
#[must_use]
pub fn correlation(q: f64) -> f64 {
    (q * (1.0 - q)).max(0.0).sqrt()
}

/// Information transfer efficiency q(1-q) = C(q)^2.
#[inline]
#[must_use]
pub fn efficiency(q: f64) -> f64 {
    q * (1.0 - q)
}

/// Circle-form residual (q - 1/2)^2 + c^2 - 1/4; zero on the constraint.
#[inline]
#[must_use]
pub fn circle_residual(q: f64, c: f64) -> f64 {
    (q - APEX_Q).powi(2) + c * c - 0.25
}

/// Analytic derivative dC/dq = (1 - 2q) / (2 C(q)).
///
/// The formula is singular at q in {0, 1}; the derivative is defined as 0
/// there so that no NaN or infinity reaches the aggregate statistics.
#[must_use]
pub fn derivative(q: f64) -> f64 {
    let c = correlation(q);
    if c > 0.0 {
        (1.0 - 2.0 * q) / (2.0 * c)
    } else {
        0.0
    }
}

/// First-order error propagation: sigma_C = |dC/dq| * sigma_q.
#[inline]
#[must_use]
pub fn propagate_err(q: f64, sigma_q: f64) -> f64 {
    derivative(q).abs() * sigma_q
}

/// Validates a batch against an arbitrary reference function.
///
/// The residual per point is `value - reference(q)`. The batch passes when
/// the RMS residual and the largest absolute residual are both under their
/// thresholds.
pub fn validate<F>(
    samples: &[SamplePoint],
    reference: F,
    thresholds: &Thresholds,
) -> Result<ValidationResult, ValidateError>
where
    F: Fn(f64) -> f64,
{
    check_batch(samples)?;
    let residuals: Vec<f64> = samples.iter().map(|s| s.value - reference(s.q)).collect();
    Ok(aggregate(samples, &residuals, thresholds))
}

/// Validates a batch against the circle form of the constraint.
///
/// The residual per point is `(q - 1/2)^2 + value^2 - 1/4`.
pub fn validate_circle(
    samples: &[SamplePoint],
    thresholds: &Thresholds,
) -> Result<ValidationResult, ValidateError> {
    check_batch(samples)?;
    let residuals: Vec<f64> = samples
        .iter()
        .map(|s| circle_residual(s.q, s.value))
        .collect();
    Ok(aggregate(samples, &residuals, thresholds))
}

fn check_batch(samples: &[SamplePoint]) -> Result<(), ValidateError> {
    if samples.is_empty() {
        return Err(ValidateError::EmptyInput);
    }
    if let Some(bad) = samples.iter().find(|s| !(0.0..=1.0).contains(&s.q)) {
        return Err(ValidateError::OutOfDomain { q: bad.q });
    }
    Ok(())
}

fn aggregate(samples: &[SamplePoint], residuals: &[f64], thresholds: &Thresholds) -> ValidationResult {
    let rms_error = stats::rms(residuals);
    let max_error = residuals.iter().fold(0.0f64, |acc, r| acc.max(r.abs()));
    let mean_error = stats::mean(residuals);

    let radii: Vec<f64> = samples
        .iter()
        .map(|s| ((s.q - APEX_Q).powi(2) + s.value * s.value).sqrt())
        .collect();

    ValidationResult {
        rms_error,
        max_error,
        mean_error,
        mean_radius: stats::mean(&radii),
        radius_std: stats::std_dev(&radii),
        pass: rms_error < thresholds.rms_max && max_error < thresholds.abs_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_symmetric_about_apex() {
        for q in [0.05, 0.2, 0.35, 0.49] {
            assert!((correlation(q) - correlation(1.0 - q)).abs() < 1e-12);
        }
    }

    #[test]
    fn points_lie_on_circle() {
        let mut q = 0.01;
        while q < 1.0 {
            assert!(circle_residual(q, correlation(q)).abs() <= 1e-9);
            q += 0.01;
        }
    }

    #[test]
    fn derivative_stationary_at_apex() {
        assert!(derivative(APEX_Q).abs() < f64::EPSILON);
    }

    #[test]
    fn derivative_antisymmetric() {
        for q in [0.1, 0.25, 0.4, 0.45] {
            assert!((derivative(q) + derivative(1.0 - q)).abs() < 1e-12);
        }
    }

    #[test]
    fn endpoints_clamp_to_zero() {
        assert!(correlation(0.0).abs() < f64::EPSILON);
        assert!(correlation(1.0).abs() < f64::EPSILON);
        assert!(derivative(0.0).abs() < f64::EPSILON);
        assert!(derivative(1.0).abs() < f64::EPSILON);
        assert!(propagate_err(1.0, 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn apex_sample_validates_exactly() {
        let samples = [SamplePoint::new(0.5, 0.5)];
        let result = validate(&samples, correlation, &Thresholds::default()).unwrap();
        assert!(result.rms_error.abs() < f64::EPSILON);
        assert!(result.pass);
        assert!((result.mean_radius - 0.5).abs() < 1e-12);
    }

    #[test]
    fn endpoint_samples_produce_no_nan() {
        let samples = [SamplePoint::new(0.0, 0.0), SamplePoint::new(1.0, 0.0)];
        let result = validate(&samples, correlation, &Thresholds::default()).unwrap();
        assert!(result.rms_error.is_finite());
        assert!(result.mean_radius.is_finite());
        assert!(result.pass);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = validate(&[], correlation, &Thresholds::default()).unwrap_err();
        assert!(matches!(err, ValidateError::EmptyInput));
    }

    #[test]
    fn out_of_domain_is_rejected() {
        let samples = [SamplePoint::new(1.2, 0.1)];
        let err = validate_circle(&samples, &Thresholds::default()).unwrap_err();
        assert!(matches!(err, ValidateError::OutOfDomain { .. }));
    }

    #[test]
    fn off_circle_batch_fails() {
        let samples = [SamplePoint::new(0.5, 0.6)];
        let result = validate_circle(&samples, &Thresholds::default()).unwrap();
        assert!(!result.pass);
        assert!(result.max_error > 0.1);
    }

    #[test]
    fn propagated_error_scales_with_slope() {
        // The curve is steeper at q = 0.1 than at q = 0.4.
        let sigma_q = 0.02;
        assert!(propagate_err(0.1, sigma_q) > propagate_err(0.4, sigma_q));
        assert!(propagate_err(0.5, sigma_q).abs() < f64::EPSILON);
    }
}
