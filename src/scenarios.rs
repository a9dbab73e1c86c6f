//! Built-in check suites over the hardware table and seeded simulations.
//!
//! Three checks mirror the measurement campaign: the semicircle constraint
//! itself, the optimal operating point at q = 1/2, and barren plateau
//! geometry (gradient variance and depth decay).

use std::f64::consts::PI;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::constraint;
use crate::simulate;
use crate::stats;
use crate::types::{CheckResult, SamplePoint, Thresholds, ValidateError};

/// Shots per hardware measurement point.
pub const N_SHOTS: usize = 52;

/// One measured point from the IonQ Forte-1 run.
#[derive(Debug, Clone, Copy)]
pub struct HardwareRow {
    pub q_theory: f64,
    pub zeros: u32,
    pub ones: u32,
    pub q_measured: f64,
    pub c_measured: f64,
}

/// IonQ Forte-1 measurement table, 52 shots per point.
pub const FORTE_1: [HardwareRow; 15] = [
    HardwareRow { q_theory: 0.050, zeros: 48, ones: 4, q_measured: 0.077, c_measured: 0.266 },
    HardwareRow { q_theory: 0.100, zeros: 50, ones: 2, q_measured: 0.038, c_measured: 0.192 },
    HardwareRow { q_theory: 0.150, zeros: 41, ones: 11, q_measured: 0.212, c_measured: 0.408 },
    HardwareRow { q_theory: 0.200, zeros: 41, ones: 11, q_measured: 0.212, c_measured: 0.408 },
    HardwareRow { q_theory: 0.250, zeros: 36, ones: 16, q_measured: 0.308, c_measured: 0.461 },
    HardwareRow { q_theory: 0.300, zeros: 35, ones: 17, q_measured: 0.327, c_measured: 0.469 },
    HardwareRow { q_theory: 0.350, zeros: 35, ones: 17, q_measured: 0.327, c_measured: 0.469 },
    HardwareRow { q_theory: 0.400, zeros: 25, ones: 27, q_measured: 0.519, c_measured: 0.500 },
    HardwareRow { q_theory: 0.450, zeros: 26, ones: 26, q_measured: 0.500, c_measured: 0.500 },
    HardwareRow { q_theory: 0.500, zeros: 28, ones: 24, q_measured: 0.462, c_measured: 0.499 },
    HardwareRow { q_theory: 0.550, zeros: 22, ones: 30, q_measured: 0.577, c_measured: 0.494 },
    HardwareRow { q_theory: 0.600, zeros: 17, ones: 35, q_measured: 0.673, c_measured: 0.469 },
    HardwareRow { q_theory: 0.650, zeros: 10, ones: 42, q_measured: 0.808, c_measured: 0.394 },
    HardwareRow { q_theory: 0.700, zeros: 17, ones: 35, q_measured: 0.673, c_measured: 0.469 },
    HardwareRow { q_theory: 0.750, zeros: 8, ones: 44, q_measured: 0.846, c_measured: 0.361 },
];

/// Hardware (q, C) pairs as validator input.
#[must_use]
pub fn hardware_samples() -> Vec<SamplePoint> {
    FORTE_1
        .iter()
        .map(|row| SamplePoint::new(row.q_measured, row.c_measured))
        .collect()
}

/// Checks the Forte-1 table against the circle form of the constraint.
///
/// The measured correlations come from 3-decimal count ratios, so residuals
/// sit near 1e-4; the default thresholds cover that comfortably.
#[must_use]
pub fn hardware_semicircle() -> CheckResult {
    const NAME: &str = "semicircle constraint (IonQ Forte-1)";
    guard(NAME, check_hardware(NAME))
}

/// Validates the constraint over a uniform sweep, random state preparation,
/// and the endpoint edge cases.
pub fn semicircle_constraint(rng: &mut impl Rng) -> CheckResult {
    const NAME: &str = "semicircle constraint (simulation)";
    guard(NAME, check_constraint(NAME, rng))
}

/// Verifies that q = 1/2 maximizes C, maximizes the efficiency, and is a
/// stationary point, and that noisy descent converges there.
pub fn optimal_operating_point(rng: &mut impl Rng) -> CheckResult {
    const NAME: &str = "optimal operating point";
    guard(NAME, check_operating_point(NAME, rng))
}

/// Checks that gradient variance tracks q(1-q) and decays exponentially with
/// depth at the fitted rate.
pub fn barren_plateau(rng: &mut impl Rng) -> CheckResult {
    const NAME: &str = "barren plateau geometry";
    guard(NAME, check_barren_plateau(NAME, rng))
}

fn guard(name: &str, outcome: Result<CheckResult, ValidateError>) -> CheckResult {
    outcome.unwrap_or_else(|e| CheckResult::Error {
        name: name.to_string(),
        error: e.to_string(),
    })
}

fn check_hardware(name: &str) -> Result<CheckResult, ValidateError> {
    let samples = hardware_samples();
    let result = constraint::validate_circle(&samples, &Thresholds::default())?;

    let c_errs: Vec<f64> = samples
        .iter()
        .map(|s| constraint::propagate_err(s.q, stats::binomial_std_err(s.q, N_SHOTS)))
        .collect();
    let mean_c_err = stats::mean(&c_errs);

    if !result.pass {
        return Ok(CheckResult::Fail {
            name: name.to_string(),
            reason: format!(
                "off the circle: rms={:.2e}, max={:.2e}",
                result.rms_error, result.max_error
            ),
        });
    }
    if (result.mean_radius - 0.5).abs() >= 1e-3 {
        return Ok(CheckResult::Fail {
            name: name.to_string(),
            reason: format!("mean radius {:.6} departs from 0.5", result.mean_radius),
        });
    }

    Ok(CheckResult::Pass {
        name: name.to_string(),
        details: format!(
            "rms={:.2e} max={:.2e} radius={:.4} mean sigma_C={:.4}",
            result.rms_error, result.max_error, result.mean_radius, mean_c_err
        ),
    })
}

fn check_constraint(name: &str, rng: &mut impl Rng) -> Result<CheckResult, ValidateError> {
    let thresholds = Thresholds::default();

    // Uniform q sweep with preparation noise.
    let uniform: Vec<SamplePoint> = linspace(0.01, 0.99, 50)
        .into_iter()
        .map(|q| noisy_state(q, 0.005, rng))
        .collect();
    let uniform_result = constraint::validate_circle(&uniform, &thresholds)?;

    // Random state preparation: q = sin^2(theta/2) for uniform theta.
    let random: Vec<SamplePoint> = (0..100)
        .map(|_| {
            let theta = rng.gen_range(0.0..PI);
            noisy_state((theta / 2.0).sin().powi(2), 0.005, rng)
        })
        .collect();
    let random_result = constraint::validate_circle(&random, &thresholds)?;

    // Endpoint neighbourhood, noiseless.
    let edges: Vec<SamplePoint> = [0.001, 0.5, 0.999]
        .iter()
        .map(|&q| SamplePoint::new(q, constraint::correlation(q)))
        .collect();
    let edge_result = constraint::validate_circle(&edges, &Thresholds::deterministic())?;

    let mut failures = Vec::new();
    if !uniform_result.pass {
        failures.push(format!("uniform sweep rms={:.2e}", uniform_result.rms_error));
    }
    if !random_result.pass {
        failures.push(format!(
            "random states rms={:.2e} max={:.2e}",
            random_result.rms_error, random_result.max_error
        ));
    }
    if !edge_result.pass {
        failures.push(format!("edge cases max={:.2e}", edge_result.max_error));
    }
    if (uniform_result.mean_radius - 0.5).abs() >= 1e-3 {
        failures.push(format!("mean radius {:.6}", uniform_result.mean_radius));
    }

    if failures.is_empty() {
        Ok(CheckResult::Pass {
            name: name.to_string(),
            details: format!(
                "uniform rms={:.2e}, random rms={:.2e}, radius={:.6}",
                uniform_result.rms_error, random_result.rms_error, uniform_result.mean_radius
            ),
        })
    } else {
        Ok(CheckResult::Fail {
            name: name.to_string(),
            reason: failures.join("; "),
        })
    }
}

fn check_operating_point(name: &str, rng: &mut impl Rng) -> Result<CheckResult, ValidateError> {
    // C maximum over a noisy grid.
    let grid: Vec<SamplePoint> = linspace(0.1, 0.9, 17)
        .into_iter()
        .map(|q| noisy_state(q, 0.01, rng))
        .collect();
    let peak = grid
        .iter()
        .max_by(|a, b| {
            a.value
                .partial_cmp(&b.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or(ValidateError::EmptyInput)?;

    // Efficiency maximum on the reference grid.
    let eff_grid = [0.1, 0.25, 0.5, 0.75, 0.9];
    let best_eff_q = eff_grid
        .iter()
        .copied()
        .max_by(|a, b| {
            constraint::efficiency(*a)
                .partial_cmp(&constraint::efficiency(*b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or(ValidateError::EmptyInput)?;

    let deriv_at_apex = constraint::derivative(constraint::APEX_Q);

    // Noisy descent from five starting points.
    let runs: Vec<simulate::Convergence> = [0.1, 0.3, 0.5, 0.7, 0.9]
        .iter()
        .map(|&q0| simulate::converge(q0, rng))
        .collect();
    let worst_iterations = runs.iter().map(|r| r.iterations).max().unwrap_or(0);

    let mut failures = Vec::new();
    if (peak.q - 0.5).abs() >= 0.1 {
        failures.push(format!("C peak at q={:.3}", peak.q));
    }
    if (peak.value - 0.5).abs() >= 0.05 {
        failures.push(format!("C max {:.4} off 0.5", peak.value));
    }
    if (best_eff_q - 0.5).abs() >= 0.01 {
        failures.push(format!("efficiency peak at q={best_eff_q:.2}"));
    }
    if deriv_at_apex.abs() >= 0.1 {
        failures.push(format!("dC/dq at apex = {deriv_at_apex:.4}"));
    }

    if failures.is_empty() {
        Ok(CheckResult::Pass {
            name: name.to_string(),
            details: format!(
                "C max {:.4} at q={:.3}, dC/dq(1/2)={:.1e}, descent <= {} iters",
                peak.value, peak.q, deriv_at_apex, worst_iterations
            ),
        })
    } else {
        Ok(CheckResult::Fail {
            name: name.to_string(),
            reason: failures.join("; "),
        })
    }
}

fn check_barren_plateau(name: &str, rng: &mut impl Rng) -> Result<CheckResult, ValidateError> {
    let q_values = [0.05, 0.1, 0.2, 0.3, 0.5, 0.7, 0.8, 0.9, 0.95];
    let scan = simulate::gradient_variance_scan(&q_values, 100, rng)?;

    let theory: Vec<f64> = scan.iter().map(|s| s.theory_variance).collect();
    let measured: Vec<f64> = scan.iter().map(|s| s.measured_variance).collect();
    let r = stats::pearson(&theory, &measured);
    let barren_count = scan.iter().filter(|s| s.is_barren()).count();

    // Depth decay: exclude clamped-to-zero points before the log fit.
    let depth_samples = simulate::depth_scan(&[1, 2, 4, 8, 16], rng);
    let (depths, variances): (Vec<f64>, Vec<f64>) = depth_samples
        .iter()
        .filter(|s| s.variance > 0.0)
        .map(|s| (s.depth, s.variance))
        .unzip();
    let fit = stats::fit_log_decay(&depths, &variances)?;
    let expected_rate = -0.9f64.ln();

    let training = simulate::training_comparison(&[0.1, 0.5, 0.9], rng);
    let best = training
        .iter()
        .min_by(|a, b| {
            a.final_loss
                .partial_cmp(&b.final_loss)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or(ValidateError::EmptyInput)?;

    let mut failures = Vec::new();
    if r <= 0.95 {
        failures.push(format!("variance correlation r={r:.4}"));
    }
    if (fit.rate - expected_rate).abs() >= 0.08 {
        failures.push(format!(
            "depth decay rate {:.4} vs expected {expected_rate:.4}",
            fit.rate
        ));
    }
    if (best.q - 0.5).abs() >= 0.1 {
        failures.push(format!("best training at q={:.2}", best.q));
    }

    if failures.is_empty() {
        Ok(CheckResult::Pass {
            name: name.to_string(),
            details: format!(
                "r={r:.4}, decay rate {:.3} (theory {expected_rate:.3}), {barren_count} barren points",
                fit.rate
            ),
        })
    } else {
        Ok(CheckResult::Fail {
            name: name.to_string(),
            reason: failures.join("; "),
        })
    }
}

/// Prepares a state targeting q with gaussian preparation noise, then derives
/// C from the measured probability.
fn noisy_state(q: f64, noise_sd: f64, rng: &mut impl Rng) -> SamplePoint {
    let noise = rng.sample::<f64, _>(StandardNormal) * noise_sd;
    let q_meas = (q + noise).clamp(0.001, 0.999);
    SamplePoint::new(q_meas, constraint::correlation(q_meas))
}

#[allow(clippy::cast_precision_loss)]
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| (i as f64).mul_add(step, start)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn forte_table_passes_circle_check() {
        let result = hardware_semicircle();
        assert!(result.is_pass(), "{result:?}");
    }

    #[test]
    fn forte_residuals_are_rounding_sized() {
        let result =
            constraint::validate_circle(&hardware_samples(), &Thresholds::default()).unwrap();
        assert!(result.max_error < 1e-3);
        assert!((result.mean_radius - 0.5).abs() < 1e-3);
    }

    #[test]
    fn forte_counts_are_consistent() {
        for row in &FORTE_1 {
            assert_eq!(row.zeros + row.ones, 52);
        }
    }

    #[test]
    fn simulated_constraint_check_passes() {
        let mut rng = seeded_rng();
        let result = semicircle_constraint(&mut rng);
        assert!(result.is_pass(), "{result:?}");
    }

    #[test]
    fn operating_point_check_passes() {
        let mut rng = seeded_rng();
        let result = optimal_operating_point(&mut rng);
        assert!(result.is_pass(), "{result:?}");
    }

    #[test]
    fn barren_plateau_check_passes() {
        let mut rng = seeded_rng();
        let result = barren_plateau(&mut rng);
        assert!(result.is_pass(), "{result:?}");
    }

    #[test]
    fn linspace_hits_both_ends() {
        let xs = linspace(0.01, 0.99, 50);
        assert_eq!(xs.len(), 50);
        assert!((xs[0] - 0.01).abs() < 1e-12);
        assert!((xs[49] - 0.99).abs() < 1e-12);
    }
}
