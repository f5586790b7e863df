//! Additive Holt-Winters (triple exponential smoothing).

use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{minimize, SimplexOptions};
use crate::utils::stats::quantile_normal;

/// Additive Holt-Winters forecaster:
///
/// - level: `l_t = α (y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
/// - trend: `b_t = β (l_t - l_{t-1}) + (1-β) b_{t-1}`
/// - seasonal: `s_t = γ (y_t - l_t) + (1-γ) s_{t-m}`
/// - forecast: `ŷ_{t+h} = l_t + h b_t + s_{t+h-m}`
#[derive(Debug, Clone)]
pub struct HoltWinters {
    period: usize,
    alpha: f64,
    beta: f64,
    gamma: f64,
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    n: usize,
}

impl HoltWinters {
    /// Create an unfitted additive model for the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
            level: 0.0,
            trend: 0.0,
            seasonals: Vec::new(),
            residuals: None,
            residual_variance: None,
            n: 0,
        }
    }

    /// The configured seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    fn initial_states(values: &[f64], m: usize) -> (f64, f64, Vec<f64>) {
        let first_cycle_mean = values[..m].iter().sum::<f64>() / m as f64;
        let trend = if values.len() >= 2 * m {
            let second_cycle_mean = values[m..2 * m].iter().sum::<f64>() / m as f64;
            (second_cycle_mean - first_cycle_mean) / m as f64
        } else {
            0.0
        };
        let seasonals: Vec<f64> = values[..m].iter().map(|&y| y - first_cycle_mean).collect();
        (first_cycle_mean, trend, seasonals)
    }

    fn run(
        values: &[f64],
        m: usize,
        alpha: f64,
        beta: f64,
        gamma: f64,
        collect: bool,
    ) -> (f64, Vec<f64>, f64, f64, Vec<f64>) {
        let (mut level, mut trend, mut seasonals) = Self::initial_states(values, m);

        let mut sse = 0.0;
        let mut innovations = if collect {
            // The first cycle seeds the states; no predictions there.
            vec![f64::NAN; m]
        } else {
            Vec::new()
        };

        for (t, &y) in values.iter().enumerate().skip(m) {
            let seasonal = seasonals[t % m];
            let prediction = level + trend + seasonal;
            let error = y - prediction;
            sse += error * error;
            if collect {
                innovations.push(error);
            }

            let previous_level = level;
            level = alpha * (y - seasonal) + (1.0 - alpha) * (level + trend);
            trend = beta * (level - previous_level) + (1.0 - beta) * trend;
            seasonals[t % m] = gamma * (y - level) + (1.0 - gamma) * seasonal;
        }

        (sse, innovations, level, trend, seasonals)
    }
}

impl Forecaster for HoltWinters {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        if self.period < 2 {
            return Err(PipelineError::InvalidParameter(
                "Holt-Winters needs a period of at least 2".to_string(),
            ));
        }
        let values = series.values();
        let needed = 2 * self.period;
        if values.len() < needed {
            return Err(PipelineError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let m = self.period;
        let result = minimize(
            |point| Self::run(values, m, point[0], point[1], point[2], false).0,
            &[0.3, 0.1, 0.1],
            Some(&[(1e-4, 0.9999), (1e-4, 0.9999), (1e-4, 0.9999)]),
            SimplexOptions::default(),
        );

        if !result.value.is_finite() {
            return Err(PipelineError::Computation(
                "Holt-Winters smoothing did not converge".to_string(),
            ));
        }

        let (alpha, beta, gamma) = (result.point[0], result.point[1], result.point[2]);
        let (sse, innovations, level, trend, seasonals) =
            Self::run(values, m, alpha, beta, gamma, true);

        self.alpha = alpha;
        self.beta = beta;
        self.gamma = gamma;
        self.level = level;
        self.trend = trend;
        self.seasonals = seasonals;
        self.n = values.len();
        self.residual_variance = Some(sse / (values.len() - m) as f64);
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

        let m = self.period;
        let variance = self.residual_variance.unwrap_or(0.0);
        let z = quantile_normal((1.0 + level) / 2.0);

        let mut point = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);

        let mut weight_sq_sum = 0.0;
        for h in 1..=horizon {
            let seasonal = self.seasonals[(self.n + h - 1) % m];
            let mean = self.level + h as f64 * self.trend + seasonal;
            let se = (variance * (1.0 + weight_sq_sum)).sqrt();
            point.push(mean);
            lower.push(mean - z * se);
            upper.push(mean + z * se);

            let mut weight = self.alpha * (1.0 + self.beta * h as f64);
            if h % m == 0 {
                weight += self.gamma;
            }
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
            ("gamma".to_string(), self.gamma),
        ]
    }

    fn name(&self) -> String {
        "HoltWinters".to_string()
    }
}
