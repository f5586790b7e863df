//! Seasonal-decomposition hybrid: STL plus ETS on the deseasonalized series.

use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, Result};
use crate::models::exponential::AutoEts;
use crate::models::Forecaster;
use crate::seasonality::StlDecomposer;

/// STL + ETS hybrid forecaster.
///
/// Decomposes the training series at a fixed period, forecasts the
/// deseasonalized series (trend + remainder) with [`AutoEts`], and re-adds
/// the seasonal cycle projected forward by naive repetition.
#[derive(Debug, Clone)]
pub struct StlEts {
    period: usize,
    seasonal: Option<Vec<f64>>,
    inner: Option<AutoEts>,
    n: usize,
}

impl StlEts {
    /// Create an unfitted hybrid for the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            seasonal: None,
            inner: None,
            n: 0,
        }
    }

    /// The configured seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Forecaster for StlEts {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        let values = series.values();
        let decomposition = StlDecomposer::new(self.period)
            .decompose(values)
            .ok_or(PipelineError::InsufficientData {
                needed: 2 * self.period,
                got: values.len(),
            })?;

        let deseasonalized: Vec<f64> = values
            .iter()
            .zip(decomposition.seasonal.iter())
            .map(|(y, s)| y - s)
            .collect();
        let deseasonalized_series = series.with_values(deseasonalized)?;

        let mut inner = AutoEts::new();
        inner.fit(&deseasonalized_series)?;

        self.seasonal = Some(decomposition.seasonal);
        self.inner = Some(inner);
        self.n = values.len();
        Ok(())
    }

    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        let seasonal = self.seasonal.as_ref().ok_or(PipelineError::FitRequired)?;
        let inner = self.inner.as_ref().ok_or(PipelineError::FitRequired)?;
        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }

        let base = inner.forecast(horizon, level)?;

        // Project the seasonal component by repeating the last full cycle.
        let cycle = &seasonal[self.n - self.period..];
        let mut point = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for h in 0..horizon {
            let s = cycle[h % self.period];
            point.push(base.point()[h] + s);
            lower.push(base.lower()[h] + s);
            upper.push(base.upper()[h] + s);
        }

        ForecastResult::new(point, lower, upper)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.inner.as_ref().and_then(|m| m.residuals())
    }

    fn params(&self) -> Vec<(String, f64)> {
        self.inner.as_ref().map_or_else(Vec::new, |m| m.params())
    }

    fn name(&self) -> String {
        "STL-ETS".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_series(values: Vec<f64>) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect();
        PriceSeries::new(dates, values).unwrap()
    }

    #[test]
    fn hybrid_recombines_trend_and_season() {
        let period = 12;
        let values: Vec<f64> = (0..120)
            .map(|i| {
                20.0 + 0.3 * i as f64
                    + 6.0 * (2.0 * std::f64::consts::PI * i as f64 / period as f64).sin()
            })
            .collect();
        let series = make_series(values);

        let mut model = StlEts::new(period);
        model.fit(&series).unwrap();

        let forecast = model.forecast(period, 0.95).unwrap();
        assert_eq!(forecast.horizon(), period);
        for (i, &p) in forecast.point().iter().enumerate() {
            let t = (120 + i) as f64;
            let expected =
                20.0 + 0.3 * t + 6.0 * (2.0 * std::f64::consts::PI * t / period as f64).sin();
            assert!(
                (p - expected).abs() < 5.0,
                "step {i}: {p} vs expected {expected}"
            );
        }
    }

    #[test]
    fn forecast_is_not_flat_for_seasonal_data() {
        let period = 12;
        let values: Vec<f64> = (0..96)
            .map(|i| 50.0 + 10.0 * (2.0 * std::f64::consts::PI * i as f64 / period as f64).sin())
            .collect();
        let series = make_series(values);

        let mut model = StlEts::new(period);
        model.fit(&series).unwrap();

        let forecast = model.forecast(period, 0.95).unwrap();
        let min = forecast.point().iter().cloned().fold(f64::INFINITY, f64::min);
        let max = forecast
            .point()
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(max - min > 5.0, "seasonal swing {:.2} too small", max - min);
    }

    #[test]
    fn short_series_cannot_fit() {
        let series = make_series((0..20).map(|i| i as f64).collect());
        let mut model = StlEts::new(12);
        assert!(matches!(
            model.fit(&series),
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn forecast_requires_fit() {
        let model = StlEts::new(12);
        assert!(matches!(
            model.forecast(6, 0.95),
            Err(PipelineError::FitRequired)
        ));
    }
}
