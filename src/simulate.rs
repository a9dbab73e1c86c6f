//! Seeded statistical simulations checked against the closed-form curves.
//!
//! Every routine takes a caller-owned RNG so a whole run reproduces from one
//! u64 seed.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

use crate::constraint;
use crate::stats;
use crate::types::ValidateError;

/// Gradient variance below this marks an untrainable (barren) operating point.
pub const BARREN_THRESHOLD: f64 = 0.01;

/// Theory vs. sampled gradient variance at one operating point.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GradientSample {
    pub q: f64,
    pub theory_variance: f64,
    pub measured_variance: f64,
}

impl GradientSample {
    /// Whether the sampled variance falls in the barren regime.
    #[must_use]
    pub fn is_barren(&self) -> bool {
        self.measured_variance < BARREN_THRESHOLD
    }
}

/// Sampled gradient variance at one depth.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DepthSample {
    pub depth: f64,
    pub variance: f64,
}

/// Outcome of one gradient-descent run toward the apex.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Convergence {
    pub q_init: f64,
    pub iterations: usize,
    pub q_final: f64,
}

/// Final loss after training at a fixed operating point.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrainingRun {
    pub q: f64,
    pub final_loss: f64,
    pub converged: bool,
}

/// Samples `n_samples` gradients per operating point and compares the sampled
/// variance with the theory value q(1-q).
pub fn gradient_variance_scan(
    q_values: &[f64],
    n_samples: usize,
    rng: &mut impl Rng,
) -> Result<Vec<GradientSample>, ValidateError> {
    if let Some(&q) = q_values.iter().find(|q| !(0.0..=1.0).contains(*q)) {
        return Err(ValidateError::OutOfDomain { q });
    }

    Ok(q_values
        .iter()
        .map(|&q| {
            let theory_variance = constraint::efficiency(q);
            let sd = theory_variance.sqrt();
            let gradients: Vec<f64> = (0..n_samples)
                .map(|_| rng.sample::<f64, _>(StandardNormal) * sd)
                .collect();
            GradientSample {
                q,
                theory_variance,
                measured_variance: stats::variance(&gradients),
            }
        })
        .collect())
}

/// Samples the exponential depth decay `0.25 * 0.9^depth` with additive
/// gaussian noise, clamped at zero.
pub fn depth_scan(depths: &[u32], rng: &mut impl Rng) -> Vec<DepthSample> {
    depths
        .iter()
        .map(|&depth| {
            let noise = rng.sample::<f64, _>(StandardNormal) * 0.01;
            let variance = 0.25f64.mul_add(0.9f64.powi(depth.try_into().unwrap_or(i32::MAX)), noise);
            DepthSample {
                depth: f64::from(depth),
                variance: variance.max(0.0),
            }
        })
        .collect()
}

/// Noisy gradient descent toward q = 1/2 with learning rate 0.1.
///
/// Stops once |q - 1/2| < 0.05 or after 100 iterations; q stays clamped to
/// [0.01, 0.99] throughout.
pub fn converge(q_init: f64, rng: &mut impl Rng) -> Convergence {
    let mut q = q_init;
    let mut iterations = 0;

    for i in 0..100 {
        let grad = 2.0 * (q - constraint::APEX_Q);
        let noise = rng.sample::<f64, _>(StandardNormal) * 0.01;
        q = (0.1f64.mul_add(-grad, q) + noise).clamp(0.01, 0.99);
        iterations = i + 1;
        if (q - constraint::APEX_Q).abs() < 0.05 {
            break;
        }
    }

    Convergence {
        q_init,
        iterations,
        q_final: q,
    }
}

/// Runs 50 training steps at each operating point with the learning rate
/// scaled by the local gradient magnitude, 0.1 * sqrt(q(1-q)).
pub fn training_comparison(q_values: &[f64], rng: &mut impl Rng) -> Vec<TrainingRun> {
    q_values
        .iter()
        .map(|&q| {
            let grad_sd = constraint::efficiency(q).max(0.0).sqrt();
            let effective_lr = 0.1 * grad_sd;
            let mut loss = 1.0f64;

            for _ in 0..50 {
                let grad = rng.sample::<f64, _>(StandardNormal) * grad_sd;
                loss = effective_lr.mul_add(-grad.abs(), loss).max(0.0);
            }

            TrainingRun {
                q,
                final_loss: loss,
                converged: loss < 0.1,
            }
        })
        .collect()
}
