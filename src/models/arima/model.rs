//! ARIMA estimation by conditional sum of squares.

use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, Result};
use crate::models::arima::diff::{
    difference, integrate, integrate_seasonal, seasonal_difference,
};
use crate::models::Forecaster;
use crate::utils::optimization::{minimize, SimplexOptions};
use crate::utils::stats::quantile_normal;
use serde::{Deserialize, Serialize};

/// Non-seasonal ARIMA order (p, d, q).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
}

impl ArimaOrder {
    /// Create an order triple.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

/// Seasonal ARIMA order (P, D, Q) at a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    /// Seasonal autoregressive order.
    pub p: usize,
    /// Seasonal differencing order.
    pub d: usize,
    /// Seasonal moving-average order.
    pub q: usize,
    /// Seasonal period in observations.
    pub period: usize,
}

impl SeasonalOrder {
    /// Create a seasonal order.
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// Whether any seasonal component is active.
    pub fn is_active(&self) -> bool {
        self.period > 1 && (self.p > 0 || self.d > 0 || self.q > 0)
    }
}

/// ARIMA model, optionally with a seasonal component.
///
/// Estimation is conditional least squares: the (d, D)-differenced series is
/// regressed on its own lags and lagged innovations, with the coefficient
/// vector found by bounded Nelder-Mead.
#[derive(Debug, Clone)]
pub struct Arima {
    order: ArimaOrder,
    seasonal: Option<SeasonalOrder>,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
    original: Option<Vec<f64>>,
    regular_diffed: Option<Vec<f64>>,
    working: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    residual_variance: Option<f64>,
    aic: Option<f64>,
}

impl Arima {
    /// Create a non-seasonal ARIMA(p, d, q).
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_orders(ArimaOrder::new(p, d, q), None)
    }

    /// Create an ARIMA with explicit regular and seasonal orders.
    pub fn with_orders(order: ArimaOrder, seasonal: Option<SeasonalOrder>) -> Self {
        Self {
            order,
            seasonal: seasonal.filter(SeasonalOrder::is_active),
            intercept: 0.0,
            ar: vec![],
            ma: vec![],
            seasonal_ar: vec![],
            seasonal_ma: vec![],
            original: None,
            regular_diffed: None,
            working: None,
            residuals: None,
            residual_variance: None,
            aic: None,
        }
    }

    /// The regular order.
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// The seasonal order, if any.
    pub fn seasonal_order(&self) -> Option<SeasonalOrder> {
        self.seasonal
    }

    /// Akaike information criterion of the fit.
    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    fn coefficient_count(&self) -> usize {
        let seasonal = self.seasonal.map_or(0, |s| s.p + s.q);
        self.order.p + self.order.q + seasonal + 1
    }

    fn burn_in(&self) -> usize {
        let regular = self.order.p.max(self.order.q);
        let seasonal = self
            .seasonal
            .map_or(0, |s| s.p.max(s.q) * s.period);
        regular.max(seasonal)
    }

    fn min_observations(&self) -> usize {
        let seasonal_diff = self.seasonal.map_or(0, |s| s.d * s.period);
        self.order.d + seasonal_diff + self.burn_in() + 5
    }

    /// One-step prediction of `working[t]` given coefficients and the
    /// innovation history.
    #[allow(clippy::too_many_arguments)]
    fn predict_one(
        working: &[f64],
        innovations: &[f64],
        t: usize,
        intercept: f64,
        ar: &[f64],
        ma: &[f64],
        seasonal_ar: &[f64],
        seasonal_ma: &[f64],
        period: usize,
    ) -> f64 {
        let mut pred = intercept;
        for (i, &coef) in ar.iter().enumerate() {
            pred += coef * (working[t - 1 - i] - intercept);
        }
        for (i, &coef) in seasonal_ar.iter().enumerate() {
            pred += coef * (working[t - (i + 1) * period] - intercept);
        }
        for (i, &coef) in ma.iter().enumerate() {
            pred += coef * innovations[t - 1 - i];
        }
        for (i, &coef) in seasonal_ma.iter().enumerate() {
            pred += coef * innovations[t - (i + 1) * period];
        }
        pred
    }

    /// Conditional sum of squares for a candidate coefficient vector.
    fn css(&self, working: &[f64], point: &[f64]) -> f64 {
        let (intercept, ar, ma, sar, sma) = self.unpack(point);
        let period = self.seasonal.map_or(1, |s| s.period);
        let start = self.burn_in();
        let n = working.len();

        let mut innovations = vec![0.0; n];
        let mut css = 0.0;
        for t in start..n {
            let pred = Self::predict_one(
                working,
                &innovations,
                t,
                intercept,
                ar,
                ma,
                sar,
                sma,
                period,
            );
            let error = working[t] - pred;
            innovations[t] = error;
            css += error * error;
        }
        if css.is_finite() {
            css
        } else {
            f64::MAX
        }
    }

    fn unpack<'a>(&self, point: &'a [f64]) -> (f64, &'a [f64], &'a [f64], &'a [f64], &'a [f64]) {
        let p = self.order.p;
        let q = self.order.q;
        let (sp, sq) = self.seasonal.map_or((0, 0), |s| (s.p, s.q));
        let intercept = point[0];
        let ar = &point[1..1 + p];
        let ma = &point[1 + p..1 + p + q];
        let sar = &point[1 + p + q..1 + p + q + sp];
        let sma = &point[1 + p + q + sp..1 + p + q + sp + sq];
        (intercept, ar, ma, sar, sma)
    }

    fn estimate(&mut self, working: &[f64]) -> Result<()> {
        let mean = working.iter().sum::<f64>() / working.len() as f64;
        let p = self.order.p;
        let q = self.order.q;
        let (sp, sq) = self.seasonal.map_or((0, 0), |s| (s.p, s.q));

        if p + q + sp + sq == 0 {
            self.intercept = mean;
            return Ok(());
        }

        let mut initial = vec![0.0; self.coefficient_count()];
        initial[0] = mean;
        for (i, slot) in initial[1..].iter_mut().enumerate() {
            *slot = 0.1 / (i + 1) as f64;
        }

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(p + q + sp + sq));

        let options = SimplexOptions {
            max_iterations: 1000,
            tolerance: 1e-8,
            ..Default::default()
        };
        let result = minimize(|point| self.css(working, point), &initial, Some(&bounds), options);

        if !result.value.is_finite() || result.value == f64::MAX {
            return Err(PipelineError::Computation(
                "conditional sum of squares did not converge".to_string(),
            ));
        }

        let (intercept, ar, ma, sar, sma) = self.unpack(&result.point);
        self.intercept = intercept;
        self.ar = ar.to_vec();
        self.ma = ma.to_vec();
        self.seasonal_ar = sar.to_vec();
        self.seasonal_ma = sma.to_vec();
        Ok(())
    }

    fn compute_residuals(&mut self, working: &[f64]) {
        let period = self.seasonal.map_or(1, |s| s.period);
        let start = self.burn_in();
        let n = working.len();

        let mut innovations = vec![0.0; n];
        let mut residuals = vec![f64::NAN; n];
        for t in start..n {
            let pred = Self::predict_one(
                working,
                &innovations,
                t,
                self.intercept,
                &self.ar,
                &self.ma,
                &self.seasonal_ar,
                &self.seasonal_ma,
                period,
            );
            let error = working[t] - pred;
            innovations[t] = error;
            residuals[t] = error;
        }

        let valid: Vec<f64> = residuals[start..].to_vec();
        if !valid.is_empty() {
            let variance = valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64;
            self.residual_variance = Some(variance);

            let n_eff = valid.len() as f64;
            let k = self.coefficient_count() as f64;
            if variance > 0.0 {
                let ll =
                    -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());
                self.aic = Some(-2.0 * ll + 2.0 * k);
            }
        }
        self.residuals = Some(residuals);
    }
}

impl Forecaster for Arima {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        let values = series.values();
        let needed = self.min_observations();
        if values.len() < needed {
            return Err(PipelineError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        self.original = Some(values.to_vec());

        let regular = difference(values, self.order.d);
        let working = match self.seasonal {
            Some(s) if s.d > 0 => seasonal_difference(&regular, s.d, s.period),
            _ => regular.clone(),
        };
        if working.len() <= self.burn_in() + 2 {
            return Err(PipelineError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        self.regular_diffed = Some(regular);

        self.estimate(&working)?;
        self.compute_residuals(&working);
        self.working = Some(working);
        Ok(())
    }

    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        let original = self.original.as_ref().ok_or(PipelineError::FitRequired)?;
        let regular = self
            .regular_diffed
            .as_ref()
            .ok_or(PipelineError::FitRequired)?;
        let working = self.working.as_ref().ok_or(PipelineError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(PipelineError::FitRequired)?;

        if horizon == 0 {
            return Ok(ForecastResult::empty());
        }

        let period = self.seasonal.map_or(1, |s| s.period);

        // Recursive forecast on the working (fully differenced) scale;
        // future innovations are zero.
        let mut extended = working.clone();
        let mut innovations: Vec<f64> =
            residuals.iter().map(|r| if r.is_finite() { *r } else { 0.0 }).collect();
        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for (i, &coef) in self.ar.iter().enumerate() {
                if t > i {
                    pred += coef * (extended[t - 1 - i] - self.intercept);
                }
            }
            for (i, &coef) in self.seasonal_ar.iter().enumerate() {
                let lag = (i + 1) * period;
                if t >= lag {
                    pred += coef * (extended[t - lag] - self.intercept);
                }
            }
            for (i, &coef) in self.ma.iter().enumerate() {
                if t > i {
                    pred += coef * innovations[t - 1 - i];
                }
            }
            for (i, &coef) in self.seasonal_ma.iter().enumerate() {
                let lag = (i + 1) * period;
                if t >= lag {
                    pred += coef * innovations[t - lag];
                }
            }
            extended.push(pred);
            innovations.push(0.0);
        }
        let forecast_working: Vec<f64> = extended[working.len()..].to_vec();

        // Integrate back: seasonal first, then regular differencing.
        let forecast_regular = match self.seasonal {
            Some(s) if s.d > 0 => integrate_seasonal(&forecast_working, regular, s.d, s.period),
            _ => forecast_working,
        };
        let point = integrate(&forecast_regular, original, self.order.d);

        // Interval width grows with the horizon on the differenced scale.
        let variance = self.residual_variance.unwrap_or(0.0);
        let z = quantile_normal((1.0 + level) / 2.0);
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, &p) in point.iter().enumerate() {
            let se = (variance * (h + 1) as f64).sqrt();
            lower.push(p - z * se);
            upper.push(p + z * se);
        }

        ForecastResult::new(point, lower, upper)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn params(&self) -> Vec<(String, f64)> {
        let mut params = vec![("intercept".to_string(), self.intercept)];
        for (i, &c) in self.ar.iter().enumerate() {
            params.push((format!("ar{}", i + 1), c));
        }
        for (i, &c) in self.ma.iter().enumerate() {
            params.push((format!("ma{}", i + 1), c));
        }
        for (i, &c) in self.seasonal_ar.iter().enumerate() {
            params.push((format!("sar{}", i + 1), c));
        }
        for (i, &c) in self.seasonal_ma.iter().enumerate() {
            params.push((format!("sma{}", i + 1), c));
        }
        params
    }

    fn name(&self) -> String {
        let ArimaOrder { p, d, q } = self.order;
        match self.seasonal {
            Some(s) => format!(
                "ARIMA({p},{d},{q})({},{},{})[{}]",
                s.p, s.d, s.q, s.period
            ),
            None => format!("ARIMA({p},{d},{q})"),
        }
    }
}
