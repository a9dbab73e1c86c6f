//! Common types for semicircle-validate.
//!
//! Defines sample points, pass thresholds, validation records, and the
//! extraction of samples from results JSON.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single observed (q, value) pair.
///
/// `q` is the probability-like independent variable in [0, 1]; `value` is the
/// dependent quantity measured or simulated at that q. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub q: f64,
    pub value: f64,
}

impl SamplePoint {
    #[must_use]
    pub const fn new(q: f64, value: f64) -> Self {
        Self { q, value }
    }
}

/// Pass criteria for a validation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Maximum allowed RMS residual.
    pub rms_max: f64,
    /// Maximum allowed absolute residual at any single point.
    pub abs_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rms_max: 1e-3,
            abs_max: 1e-2,
        }
    }
}

impl Thresholds {
    /// Thresholds for noiseless, analytically-derived batches (stricter).
    #[must_use]
    pub const fn deterministic() -> Self {
        Self {
            rms_max: 1e-9,
            abs_max: 1e-9,
        }
    }
}

/// Aggregate statistics for a validated batch.
///
/// Derived once from a batch of [`SamplePoint`] and a reference function;
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Root-mean-square of residuals.
    pub rms_error: f64,
    /// Largest absolute residual.
    pub max_error: f64,
    /// Mean (signed) residual.
    pub mean_error: f64,
    /// Mean radius of points mapped to (q - 1/2, value); 1/2 on the circle.
    pub mean_radius: f64,
    /// Standard deviation of the radii.
    pub radius_std: f64,
    /// Whether both threshold criteria held.
    pub pass: bool,
}

/// Errors from the validation core.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// An empty batch has no defined statistics; callers must not silently
    /// receive NaN aggregates.
    #[error("empty sample batch: aggregate statistics are undefined")]
    EmptyInput,
    /// The reference function is only defined on [0, 1].
    #[error("probability out of domain: q = {q} is outside [0, 1]")]
    OutOfDomain { q: f64 },
    /// Log-space fitting is undefined for variances at or below zero.
    #[error("non-positive variance {variance} at depth {depth}: log undefined")]
    NonPositiveVariance { depth: f64, variance: f64 },
    /// A line fit needs at least two distinct abscissae.
    #[error("decay fit needs at least two points with distinct depths, got {got}")]
    DegenerateFit { got: usize },
}

/// Result of running one named check.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CheckResult {
    /// Check passed.
    Pass { name: String, details: String },
    /// Check ran but a criterion failed.
    Fail { name: String, reason: String },
    /// Check could not be evaluated.
    Error { name: String, error: String },
}

impl CheckResult {
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }

    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Pass { name, .. } | Self::Fail { name, .. } | Self::Error { name, .. } => name,
        }
    }
}

/// Extracts (q, value) pairs from a results JSON document of the shape
/// `{"results": {"<test_id>": {"<list_field>": [{<x_field>, <y_field>, ...}]}}}`.
///
/// The validator is agnostic to where the document came from; only the numeric
/// pairs are pulled out.
pub fn extract_samples(
    json: &serde_json::Value,
    test_id: &str,
    list_field: &str,
    x_field: &str,
    y_field: &str,
) -> Result<Vec<SamplePoint>> {
    let entries = json
        .get("results")
        .ok_or_else(|| anyhow!("missing 'results' object"))?
        .get(test_id)
        .ok_or_else(|| anyhow!("missing test id '{test_id}' under 'results'"))?
        .get(list_field)
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("missing list '{list_field}' in test '{test_id}'"))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let q = entry
                .get(x_field)
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| anyhow!("entry {i}: missing numeric '{x_field}'"))?;
            let value = entry
                .get(y_field)
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| anyhow!("entry {i}: missing numeric '{y_field}'"))?;
            Ok(SamplePoint::new(q, value))
        })
        .collect()
}

/// Parses a results JSON string and extracts sample pairs from it.
pub fn extract_samples_str(
    content: &str,
    test_id: &str,
    list_field: &str,
    x_field: &str,
    y_field: &str,
) -> Result<Vec<SamplePoint>> {
    let json: serde_json::Value =
        serde_json::from_str(content).context("failed to parse results JSON")?;
    extract_samples(&json, test_id, list_field, x_field, y_field)
}
