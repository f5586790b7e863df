//! Holt's linear trend method (double exponential smoothing).

use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{minimize, SimplexOptions};
use crate::utils::stats::quantile_normal;

/// Holt's linear trend forecaster in the classical component form:
///
/// - level: `l_t = α y_t + (1-α)(l_{t-1} + b_{t-1})`
/// - trend: `b_t = β (l_t - l_{t-1}) + (1-β) b_{t-1}`
/// - forecast: `ŷ_{t+h} = l_t + h b_t`
///
/// Smoothing parameters are estimated by SSE minimization.
#[derive(Debug, Clone, Default)]
pub struct HoltLinear {
    alpha: f64,
    beta: f64,
    level: f64,
    trend: f64,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
}

impl HoltLinear {
    /// Create an unfitted model with optimized parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the recursion; returns SSE and, when requested, innovations and
    /// the final (level, trend) pair.
    fn run(values: &[f64], alpha: f64, beta: f64, collect: bool) -> (f64, Vec<f64>, f64, f64) {
        let mut level = values[0];
        let mut trend = values[1] - values[0];

        let mut sse = 0.0;
        let mut innovations = if collect {
            let mut v = Vec::with_capacity(values.len());
            v.push(f64::NAN); // no prediction for the first point
            v
        } else {
            Vec::new()
        };

        for &y in &values[1..] {
            let prediction = level + trend;
            let error = y - prediction;
            sse += error * error;
            if collect {
                innovations.push(error);
            }

            let previous_level = level;
            level = alpha * y + (1.0 - alpha) * (level + trend);
            trend = beta * (level - previous_level) + (1.0 - beta) * trend;
        }

        (sse, innovations, level, trend)
    }
}

impl Forecaster for HoltLinear {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        let values = series.values();
        if values.len() < 4 {
            return Err(PipelineError::InsufficientData {
                needed: 4,
                got: values.len(),
            });
        }

        let result = minimize(
            |point| Self::run(values, point[0], point[1], false).0,
            &[0.3, 0.1],
            Some(&[(1e-4, 0.9999), (1e-4, 0.9999)]),
            SimplexOptions::default(),
        );

        if !result.value.is_finite() {
            return Err(PipelineError::Computation(
                "Holt smoothing did not converge".to_string(),
            ));
        }

        let (alpha, beta) = (result.point[0], result.point[1]);
        let (sse, innovations, level, trend) = Self::run(values, alpha, beta, true);

        self.alpha = alpha;
        self.beta = beta;
        self.level = level;
        self.trend = trend;
        self.residual_variance = Some(sse / (values.len() - 1) as f64);
        self.residuals = Some(innovations);
        Ok(())
    }

    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        if self.residuals.is_none() {
            return Err(PipelineError::FitRequired);
        }
        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }

        let variance = self.residual_variance.unwrap_or(0.0);
        let z = quantile_normal((1.0 + level) / 2.0);

        let mut point = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);

        let mut weight_sq_sum = 0.0;
        for h in 1..=horizon {
            let mean = self.level + h as f64 * self.trend;
            let se = (variance * (1.0 + weight_sq_sum)).sqrt();
            point.push(mean);
            lower.push(mean - z * se);
            upper.push(mean + z * se);

            let weight = self.alpha * (1.0 + self.beta * h as f64);
            weight_sq_sum += weight * weight;
        }

        ForecastResult::new(point, lower, upper)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn params(&self) -> Vec<(String, f64)> {
        vec![
            ("alpha".to_string(), self.alpha),
            ("beta".to_string(), self.beta),
        ]
    }

    fn name(&self) -> String {
        "Holt".to_string()
    }
}
