//! Additive-error ETS state-space models.

use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{minimize, SimplexOptions};
use crate::utils::stats::quantile_normal;
use serde::{Deserialize, Serialize};

/// Trend component of an ETS specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrendComponent {
    /// No trend.
    #[default]
    None,
    /// Additive trend.
    Additive,
    /// Additive damped trend.
    AdditiveDamped,
}

/// Seasonal component of an ETS specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeasonalComponent {
    /// No seasonality.
    #[default]
    None,
    /// Additive seasonality.
    Additive,
}

/// ETS specification with additive errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EtsSpec {
    /// Trend component.
    pub trend: TrendComponent,
    /// Seasonal component.
    pub seasonal: SeasonalComponent,
}

impl EtsSpec {
    /// ETS(A,N,N): simple exponential smoothing.
    pub fn ann() -> Self {
        Self {
            trend: TrendComponent::None,
            seasonal: SeasonalComponent::None,
        }
    }

    /// ETS(A,A,N): Holt's linear method in state-space form.
    pub fn aan() -> Self {
        Self {
            trend: TrendComponent::Additive,
            seasonal: SeasonalComponent::None,
        }
    }

    /// ETS(A,Ad,N): damped trend.
    pub fn aadn() -> Self {
        Self {
            trend: TrendComponent::AdditiveDamped,
            seasonal: SeasonalComponent::None,
        }
    }

    /// ETS(A,A,A): additive Holt-Winters in state-space form.
    pub fn aaa() -> Self {
        Self {
            trend: TrendComponent::Additive,
            seasonal: SeasonalComponent::Additive,
        }
    }

    /// Short display name like `ETS(A,A,N)`.
    pub fn short_name(&self) -> String {
        let t = match self.trend {
            TrendComponent::None => "N",
            TrendComponent::Additive => "A",
            TrendComponent::AdditiveDamped => "Ad",
        };
        let s = match self.seasonal {
            SeasonalComponent::None => "N",
            SeasonalComponent::Additive => "A",
        };
        format!("ETS(A,{t},{s})")
    }

    fn has_trend(&self) -> bool {
        !matches!(self.trend, TrendComponent::None)
    }

    fn is_damped(&self) -> bool {
        matches!(self.trend, TrendComponent::AdditiveDamped)
    }

    fn has_seasonal(&self) -> bool {
        !matches!(self.seasonal, SeasonalComponent::None)
    }

    fn smoothing_param_count(&self) -> usize {
        1 + usize::from(self.has_trend())
            + usize::from(self.is_damped())
            + usize::from(self.has_seasonal())
    }
}

/// ETS model in the error-correction form.
///
/// Smoothing parameters are estimated by SSE minimization; initial states
/// come from simple moment heuristics on the first observations.
#[derive(Debug, Clone)]
pub struct Ets {
    spec: EtsSpec,
    period: usize,
    alpha: f64,
    beta: f64,
    gamma: f64,
    phi: f64,
    level: f64,
    trend_state: f64,
    seasonals: Vec<f64>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aicc: Option<f64>,
    n: usize,
}

impl Ets {
    /// Create an unfitted model. `period` is only read for seasonal specs.
    pub fn new(spec: EtsSpec, period: usize) -> Self {
        Self {
            spec,
            period,
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
            phi: 1.0,
            level: 0.0,
            trend_state: 0.0,
            seasonals: Vec::new(),
            residuals: None,
            residual_variance: None,
            aicc: None,
            n: 0,
        }
    }

    /// The specification.
    pub fn spec(&self) -> EtsSpec {
        self.spec
    }

    /// Corrected AIC of the fit.
    pub fn aicc(&self) -> Option<f64> {
        self.aicc
    }

    fn initial_states(&self, values: &[f64]) -> (f64, f64, Vec<f64>) {
        let m = self.period;
        if self.spec.has_seasonal() {
            // Level: mean of the first cycle. Trend: averaged cycle-on-cycle
            // change. Seasonals: first-cycle deviations from its mean.
            let first_cycle = &values[..m];
            let level = first_cycle.iter().sum::<f64>() / m as f64;
            let second_cycle_mean = if values.len() >= 2 * m {
                values[m..2 * m].iter().sum::<f64>() / m as f64
            } else {
                level
            };
            let trend = (second_cycle_mean - level) / m as f64;
            let seasonals: Vec<f64> = first_cycle.iter().map(|&y| y - level).collect();
            (level, trend, seasonals)
        } else {
            let level = values[0];
            let trend = if values.len() > 1 {
                values[1] - values[0]
            } else {
                0.0
            };
            (level, trend, Vec::new())
        }
    }

    /// Run the error-correction recursion, returning the SSE and, when
    /// requested, the innovation sequence and final states.
    fn run(
        &self,
        values: &[f64],
        alpha: f64,
        beta: f64,
        gamma: f64,
        phi: f64,
        collect: bool,
    ) -> (f64, Vec<f64>, f64, f64, Vec<f64>) {
        let (mut level, mut trend, mut seasonals) = self.initial_states(values);
        if !self.spec.has_trend() {
            trend = 0.0;
        }
        // Back the level off by one trend step so the first one-step
        // prediction lands on the first observation.
        level -= phi * trend;
        let m = self.period.max(1);

        let mut sse = 0.0;
        let mut innovations = if collect {
            Vec::with_capacity(values.len())
        } else {
            Vec::new()
        };

        for (t, &y) in values.iter().enumerate() {
            let damped_trend = phi * trend;
            let seasonal = if self.spec.has_seasonal() {
                seasonals[t % m]
            } else {
                0.0
            };
            let prediction = level + damped_trend + seasonal;
            let error = y - prediction;

            level += damped_trend + alpha * error;
            if self.spec.has_trend() {
                trend = damped_trend + beta * error;
            }
            if self.spec.has_seasonal() {
                seasonals[t % m] += gamma * error;
            }

            sse += error * error;
            if collect {
                innovations.push(error);
            }
        }

        (sse, innovations, level, trend, seasonals)
    }

    fn pack_initial(&self) -> (Vec<f64>, Vec<(f64, f64)>) {
        let mut initial = vec![0.3];
        let mut bounds = vec![(1e-4, 0.9999)];
        if self.spec.has_trend() {
            initial.push(0.1);
            bounds.push((1e-4, 0.9999));
        }
        if self.spec.has_seasonal() {
            initial.push(0.1);
            bounds.push((1e-4, 0.9999));
        }
        if self.spec.is_damped() {
            initial.push(0.95);
            bounds.push((0.8, 0.999));
        }
        (initial, bounds)
    }

    fn unpack(&self, point: &[f64]) -> (f64, f64, f64, f64) {
        let mut iter = point.iter().copied();
        let alpha = iter.next().unwrap_or(0.3);
        let beta = if self.spec.has_trend() {
            iter.next().unwrap_or(0.1)
        } else {
            0.0
        };
        let gamma = if self.spec.has_seasonal() {
            iter.next().unwrap_or(0.1)
        } else {
            0.0
        };
        let phi = if self.spec.is_damped() {
            iter.next().unwrap_or(0.95)
        } else {
            1.0
        };
        (alpha, beta, gamma, phi)
    }

    /// Damped horizon weight: `phi + phi^2 + ... + phi^h`.
    fn trend_weight(&self, h: usize) -> f64 {
        if !self.spec.has_trend() {
            return 0.0;
        }
        if !self.spec.is_damped() {
            return h as f64;
        }
        let mut sum = 0.0;
        let mut power = 1.0;
        for _ in 0..h {
            power *= self.phi;
            sum += power;
        }
        sum
    }
}

impl Forecaster for Ets {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        let values = series.values();
        let needed = if self.spec.has_seasonal() {
            if self.period < 2 {
                return Err(PipelineError::InvalidParameter(
                    "seasonal ETS needs a period of at least 2".to_string(),
                ));
            }
            2 * self.period
        } else {
            4
        };
        if values.len() < needed {
            return Err(PipelineError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let (initial, bounds) = self.pack_initial();
        let result = minimize(
            |point| {
                let (alpha, beta, gamma, phi) = self.unpack(point);
                self.run(values, alpha, beta, gamma, phi, false).0
            },
            &initial,
            Some(&bounds),
            SimplexOptions {
                max_iterations: 500,
                tolerance: 1e-10,
                ..Default::default()
            },
        );

        if !result.value.is_finite() {
            return Err(PipelineError::Computation(
                "ETS likelihood did not converge".to_string(),
            ));
        }

        let (alpha, beta, gamma, phi) = self.unpack(&result.point);
        let (sse, innovations, level, trend, seasonals) =
            self.run(values, alpha, beta, gamma, phi, true);

        self.alpha = alpha;
        self.beta = beta;
        self.gamma = gamma;
        self.phi = phi;
        self.level = level;
        self.trend_state = trend;
        self.seasonals = seasonals;
        self.n = values.len();

        let n = values.len() as f64;
        let variance = sse / n;
        self.residual_variance = Some(variance);
        self.residuals = Some(innovations);

        // AICc with k = smoothing parameters + initial states.
        let states = 1
            + usize::from(self.spec.has_trend())
            + if self.spec.has_seasonal() {
                self.period
            } else {
                0
            };
        let k = (self.spec.smoothing_param_count() + states) as f64;
        if variance > 0.0 && n - k - 1.0 > 0.0 {
            let ll = -0.5 * n * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());
            let aic = -2.0 * ll + 2.0 * k;
            self.aicc = Some(aic + 2.0 * k * (k + 1.0) / (n - k - 1.0));
        }

        Ok(())
    }

    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        if self.residuals.is_none() {
            return Err(PipelineError::FitRequired);
        }
        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }

        let m = self.period.max(1);
        let variance = self.residual_variance.unwrap_or(0.0);
        let z = quantile_normal((1.0 + level) / 2.0);

        let mut point = Vec::with_capacity(horizon);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);

        // Forecast-error variance accumulates the squared response weights
        // of intervening steps.
        let mut weight_sq_sum = 0.0;
        for h in 1..=horizon {
            let seasonal = if self.spec.has_seasonal() {
                self.seasonals[(self.n + h - 1) % m]
            } else {
                0.0
            };
            let mean = self.level + self.trend_weight(h) * self.trend_state + seasonal;

            let se = (variance * (1.0 + weight_sq_sum)).sqrt();
            point.push(mean);
            lower.push(mean - z * se);
            upper.push(mean + z * se);

            let mut weight = self.alpha + self.beta * self.trend_weight(h);
            if self.spec.has_seasonal() && h % m == 0 {
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
        let mut params = vec![("alpha".to_string(), self.alpha)];
        if self.spec.has_trend() {
            params.push(("beta".to_string(), self.beta));
        }
        if self.spec.has_seasonal() {
            params.push(("gamma".to_string(), self.gamma));
        }
        if self.spec.is_damped() {
            params.push(("phi".to_string(), self.phi));
        }
        params
    }

    fn name(&self) -> String {
        self.spec.short_name()
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
    fn spec_names() {
        assert_eq!(EtsSpec::ann().short_name(), "ETS(A,N,N)");
        assert_eq!(EtsSpec::aan().short_name(), "ETS(A,A,N)");
        assert_eq!(EtsSpec::aadn().short_name(), "ETS(A,Ad,N)");
        assert_eq!(EtsSpec::aaa().short_name(), "ETS(A,A,A)");
    }

    #[test]
    fn ann_forecast_is_flat() {
        let values: Vec<f64> = (0..60).map(|i| 20.0 + (i as f64 * 0.8).sin()).collect();
        let series = make_series(values);

        let mut model = Ets::new(EtsSpec::ann(), 1);
        model.fit(&series).unwrap();

        let forecast = model.forecast(5, 0.95).unwrap();
        let first = forecast.point()[0];
        for &p in forecast.point() {
            assert!((p - first).abs() < 1e-10, "ANN forecast should be constant");
        }
    }

    #[test]
    fn aan_follows_a_linear_trend() {
        let values: Vec<f64> = (0..80).map(|i| 5.0 + 1.5 * i as f64).collect();
        let series = make_series(values.clone());

        let mut model = Ets::new(EtsSpec::aan(), 1);
        model.fit(&series).unwrap();

        let forecast = model.forecast(4, 0.95).unwrap();
        let last = *values.last().unwrap();
        for (h, &p) in forecast.point().iter().enumerate() {
            let expected = last + 1.5 * (h + 1) as f64;
            assert!(
                (p - expected).abs() < 1.0,
                "step {h}: {p} vs expected {expected}"
            );
        }
    }

    #[test]
    fn damped_trend_grows_slower_than_linear() {
        let values: Vec<f64> = (0..80).map(|i| 5.0 + 1.5 * i as f64).collect();
        let series = make_series(values);

        let mut linear = Ets::new(EtsSpec::aan(), 1);
        linear.fit(&series).unwrap();
        let mut damped = Ets::new(EtsSpec::aadn(), 1);
        damped.fit(&series).unwrap();

        let h = 20;
        let linear_f = linear.forecast(h, 0.95).unwrap();
        let damped_f = damped.forecast(h, 0.95).unwrap();
        assert!(damped_f.point()[h - 1] <= linear_f.point()[h - 1] + 1e-6);
    }

    #[test]
    fn seasonal_spec_tracks_the_cycle() {
        let period = 12;
        let values: Vec<f64> = (0..120)
            .map(|i| {
                50.0 + 10.0 * (2.0 * std::f64::consts::PI * i as f64 / period as f64).sin()
            })
            .collect();
        let series = make_series(values.clone());

        let mut model = Ets::new(EtsSpec::aaa(), period);
        model.fit(&series).unwrap();

        let forecast = model.forecast(period, 0.95).unwrap();
        for (i, &p) in forecast.point().iter().enumerate() {
            let expected = values[values.len() - period + i];
            assert!(
                (p - expected).abs() < 3.0,
                "step {i}: {p} vs expected {expected}"
            );
        }
    }

    #[test]
    fn intervals_widen_with_horizon() {
        let values: Vec<f64> = (0..60)
            .map(|i| 10.0 + 0.3 * i as f64 + (i as f64 * 0.9).sin())
            .collect();
        let series = make_series(values);

        let mut model = Ets::new(EtsSpec::aan(), 1);
        model.fit(&series).unwrap();

        let forecast = model.forecast(6, 0.95).unwrap();
        for i in 1..6 {
            let prev = forecast.upper()[i - 1] - forecast.lower()[i - 1];
            let curr = forecast.upper()[i] - forecast.lower()[i];
            assert!(curr >= prev);
        }
    }

    #[test]
    fn aicc_is_available_after_fit() {
        let values: Vec<f64> = (0..50).map(|i| 10.0 + (i as f64 * 0.4).sin()).collect();
        let series = make_series(values);

        let mut model = Ets::new(EtsSpec::ann(), 1);
        model.fit(&series).unwrap();
        assert!(model.aicc().is_some());
    }

    #[test]
    fn seasonal_fit_needs_two_cycles() {
        let series = make_series((0..20).map(|i| i as f64).collect());
        let mut model = Ets::new(EtsSpec::aaa(), 12);
        assert!(matches!(
            model.fit(&series),
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn forecast_requires_fit() {
        let model = Ets::new(EtsSpec::ann(), 1);
        assert!(matches!(
            model.forecast(3, 0.95),
            Err(PipelineError::FitRequired)
        ));
    }
}
