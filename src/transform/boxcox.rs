//! Box-Cox power transformation for variance stabilization.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// A fitted Box-Cox transform.
///
/// Holds the single lambda estimated for the run; the same value drives both
/// `transform` and `inverse`, so the round-trip law
/// `inverse(transform(x)) == x` holds for all positive x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxCoxTransform {
    lambda: f64,
}

impl BoxCoxTransform {
    /// Estimate lambda from the series by maximizing the profile
    /// log-likelihood over a grid on [-2, 2], then refining around the best
    /// coarse value.
    ///
    /// Fails with [`PipelineError::Transform`] when the series is empty or
    /// contains non-positive values.
    pub fn estimate(series: &[f64]) -> Result<Self> {
        if series.is_empty() {
            return Err(PipelineError::Transform("empty series".to_string()));
        }
        if series.iter().any(|&x| x <= 0.0) {
            return Err(PipelineError::Transform(
                "series contains non-positive values".to_string(),
            ));
        }

        let mut best_lambda = 1.0;
        let mut best_llf = f64::NEG_INFINITY;

        for i in -200..=200 {
            let lambda = i as f64 / 100.0;
            let llf = log_likelihood(series, lambda);
            if llf > best_llf {
                best_llf = llf;
                best_lambda = lambda;
            }
        }

        let lo = (best_lambda - 0.1).max(-2.0);
        let hi = (best_lambda + 0.1).min(2.0);
        for i in 0..=100 {
            let lambda = lo + (hi - lo) * i as f64 / 100.0;
            let llf = log_likelihood(series, lambda);
            if llf > best_llf {
                best_llf = llf;
                best_lambda = lambda;
            }
        }

        if best_llf == f64::NEG_INFINITY {
            return Err(PipelineError::Transform(
                "lambda likelihood degenerate".to_string(),
            ));
        }

        Ok(Self {
            lambda: best_lambda,
        })
    }

    /// Create a transform with a fixed lambda.
    pub fn with_lambda(lambda: f64) -> Self {
        Self { lambda }
    }

    /// The estimated lambda.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Whether lambda is close enough to zero to report the transform as a
    /// log transform.
    pub fn is_effectively_log(&self, tolerance: f64) -> bool {
        self.lambda.abs() < tolerance
    }

    /// Forward transform: `(x^λ - 1) / λ`, or `ln(x)` at λ ≈ 0.
    ///
    /// Non-positive inputs map to NaN rather than panicking.
    pub fn transform(&self, series: &[f64]) -> Vec<f64> {
        series
            .iter()
            .map(|&x| {
                if x <= 0.0 {
                    f64::NAN
                } else if self.lambda.abs() < 1e-10 {
                    x.ln()
                } else {
                    (x.powf(self.lambda) - 1.0) / self.lambda
                }
            })
            .collect()
    }

    /// Inverse transform: `(λy + 1)^(1/λ)`, or `exp(y)` at λ ≈ 0.
    pub fn inverse(&self, transformed: &[f64]) -> Vec<f64> {
        transformed
            .iter()
            .map(|&y| self.inverse_value(y))
            .collect()
    }

    /// Inverse transform of a single value.
    pub fn inverse_value(&self, y: f64) -> f64 {
        if self.lambda.abs() < 1e-10 {
            y.exp()
        } else {
            let base = self.lambda * y + 1.0;
            if base <= 0.0 {
                f64::NAN
            } else {
                base.powf(1.0 / self.lambda)
            }
        }
    }
}

/// Profile log-likelihood of the transformed data being Gaussian, up to
/// constants: `-n/2 ln(σ²) + (λ-1) Σ ln(x)`.
fn log_likelihood(series: &[f64], lambda: f64) -> f64 {
    let n = series.len();
    if n < 2 {
        return f64::NEG_INFINITY;
    }

    let transformed = BoxCoxTransform::with_lambda(lambda).transform(series);
    if transformed.iter().any(|x| !x.is_finite()) {
        return f64::NEG_INFINITY;
    }

    let mean = transformed.iter().sum::<f64>() / n as f64;
    let variance = transformed.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    if variance <= 0.0 {
        return f64::NEG_INFINITY;
    }

    let log_sum: f64 = series.iter().map(|x| x.ln()).sum();
    -0.5 * n as f64 * variance.ln() + (lambda - 1.0) * log_sum
}
