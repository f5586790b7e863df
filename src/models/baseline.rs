//! Benchmark forecasters: naive, drift, and historical mean.

use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, Result};
use crate::models::Forecaster;
use crate::utils::stats::quantile_normal;

/// Naive forecaster: repeat the last observed value.
#[derive(Debug, Clone, Default)]
pub struct Naive {
    last_value: Option<f64>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
}

impl Naive {
    /// Create an unfitted model.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Forecaster for Naive {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(PipelineError::EmptyData);
        }

        self.last_value = values.last().copied();

        // One-step naive residuals are the first differences.
        let residuals: Vec<f64> = std::iter::once(f64::NAN)
            .chain(values.windows(2).map(|w| w[1] - w[0]))
            .collect();

        let valid: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
        if !valid.is_empty() {
            self.residual_variance =
                Some(valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64);
        }
        self.residuals = Some(residuals);
        Ok(())
    }

    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        let last = self.last_value.ok_or(PipelineError::FitRequired)?;
        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }

        let sigma = self.residual_variance.unwrap_or(0.0).sqrt();
        let z = quantile_normal((1.0 + level) / 2.0);

        let point = vec![last; horizon];
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            // Random-walk interval widens with sqrt(h).
            let se = sigma * (h as f64).sqrt();
            lower.push(last - z * se);
            upper.push(last + z * se);
        }

        ForecastResult::new(point, lower, upper)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn params(&self) -> Vec<(String, f64)> {
        self.last_value
            .map(|v| vec![("last_value".to_string(), v)])
            .unwrap_or_default()
    }

    fn name(&self) -> String {
        "Naive".to_string()
    }
}

/// Drift forecaster: extrapolate the line through the first and last
/// observation.
#[derive(Debug, Clone, Default)]
pub struct Drift {
    last_value: Option<f64>,
    drift: Option<f64>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
}

impl Drift {
    /// Create an unfitted model.
    pub fn new() -> Self {
        Self::default()
    }

    /// The estimated per-step drift.
    pub fn drift(&self) -> Option<f64> {
        self.drift
    }
}

impl Forecaster for Drift {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        let values = series.values();
        if values.len() < 2 {
            return Err(PipelineError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }

        let n = values.len();
        let drift = (values[n - 1] - values[0]) / (n - 1) as f64;
        self.drift = Some(drift);
        self.last_value = values.last().copied();

        let residuals: Vec<f64> = std::iter::once(f64::NAN)
            .chain(values.windows(2).map(|w| w[1] - w[0] - drift))
            .collect();

        let valid: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
        if !valid.is_empty() {
            self.residual_variance =
                Some(valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64);
        }
        self.residuals = Some(residuals);
        Ok(())
    }

    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        let last = self.last_value.ok_or(PipelineError::FitRequired)?;
        let drift = self.drift.ok_or(PipelineError::FitRequired)?;
        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }

        let sigma = self.residual_variance.unwrap_or(0.0).sqrt();
        let z = quantile_normal((1.0 + level) / 2.0);

        let mut point = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            let mean = last + h as f64 * drift;
            let se = sigma * (h as f64).sqrt();
            point.push(mean);
            lower.push(mean - z * se);
            upper.push(mean + z * se);
        }

        ForecastResult::new(point, lower, upper)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn params(&self) -> Vec<(String, f64)> {
        self.drift
            .map(|d| vec![("drift".to_string(), d)])
            .unwrap_or_default()
    }

    fn name(&self) -> String {
        "Drift".to_string()
    }
}

/// Historical mean forecaster: repeat the training mean.
#[derive(Debug, Clone, Default)]
pub struct HistoricalMean {
    mean: Option<f64>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    n: usize,
}

impl HistoricalMean {
    /// Create an unfitted model.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Forecaster for HistoricalMean {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(PipelineError::EmptyData);
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        self.mean = Some(mean);
        self.n = values.len();

        let residuals: Vec<f64> = values.iter().map(|&y| y - mean).collect();
        self.residual_variance =
            Some(residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        let mean = self.mean.ok_or(PipelineError::FitRequired)?;
        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }

        let variance = self.residual_variance.unwrap_or(0.0);
        // Mean-forecast standard error includes the estimation uncertainty.
        let se = (variance * (1.0 + 1.0 / self.n as f64)).sqrt();
        let z = quantile_normal((1.0 + level) / 2.0);

        let point = vec![mean; horizon];
        let lower = vec![mean - z * se; horizon];
        let upper = vec![mean + z * se; horizon];

        ForecastResult::new(point, lower, upper)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn params(&self) -> Vec<(String, f64)> {
        self.mean
            .map(|m| vec![("mean".to_string(), m)])
            .unwrap_or_default()
    }

    fn name(&self) -> String {
        "Mean".to_string()
    }
}
