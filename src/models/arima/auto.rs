//! Automatic ARIMA order selection by information criterion.

use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, Result};
use crate::models::arima::diff::suggest_differencing;
use crate::models::arima::model::{Arima, ArimaOrder, SeasonalOrder};
use crate::models::Forecaster;

/// Search space for [`AutoArima`].
#[derive(Debug, Clone)]
pub struct AutoArimaOptions {
    /// Maximum AR order.
    pub max_p: usize,
    /// Maximum differencing order.
    pub max_d: usize,
    /// Maximum MA order.
    pub max_q: usize,
    /// Seasonal period; 0 disables the seasonal component.
    pub seasonal_period: usize,
}

impl Default for AutoArimaOptions {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 2,
            max_q: 3,
            seasonal_period: 0,
        }
    }
}

/// Stepwise ARIMA order search minimizing AIC.
///
/// The differencing order is seeded by the variance-ratio heuristic and its
/// neighbors; a fixed stepwise set of (p, q) pairs is fitted at each d, and
/// when a seasonal period is configured, a small grid of seasonal (P, Q)
/// pairs is crossed with the non-seasonal candidates.
#[derive(Debug, Clone)]
pub struct AutoArima {
    options: AutoArimaOptions,
    selected: Option<Arima>,
    scores: Vec<(String, f64)>,
}

impl AutoArima {
    /// Non-seasonal automatic search.
    pub fn new() -> Self {
        Self::with_options(AutoArimaOptions::default())
    }

    /// Automatic search with the seasonal component enabled.
    pub fn seasonal(period: usize) -> Self {
        Self::with_options(AutoArimaOptions {
            seasonal_period: period,
            ..Default::default()
        })
    }

    /// Search with custom bounds.
    pub fn with_options(options: AutoArimaOptions) -> Self {
        Self {
            options,
            selected: None,
            scores: Vec::new(),
        }
    }

    /// The selected non-seasonal order, once fitted.
    pub fn selected_order(&self) -> Option<ArimaOrder> {
        self.selected.as_ref().map(|m| m.order())
    }

    /// The selected seasonal order, if the chosen model has one.
    pub fn selected_seasonal_order(&self) -> Option<SeasonalOrder> {
        self.selected.as_ref().and_then(|m| m.seasonal_order())
    }

    /// AIC scores of every candidate that fitted, sorted ascending.
    pub fn candidate_scores(&self) -> &[(String, f64)] {
        &self.scores
    }

    fn candidate_orders(&self, d: usize, seasonal_d: usize) -> Vec<(ArimaOrder, Option<SeasonalOrder>)> {
        let s = self.options.seasonal_period;
        let mut candidates = Vec::new();

        let nonseasonal = [
            (0, 0),
            (1, 0),
            (0, 1),
            (1, 1),
            (2, 0),
            (0, 2),
            (2, 1),
            (1, 2),
            (2, 2),
        ];
        for &(p, q) in &nonseasonal {
            if p <= self.options.max_p && q <= self.options.max_q {
                candidates.push((ArimaOrder::new(p, d, q), None));
            }
        }

        if s > 1 {
            let seasonal_pairs = [(0, 1), (1, 0), (1, 1)];
            let nonseasonal_small = [(0, 0), (1, 0), (0, 1), (1, 1)];
            for &(p, q) in &nonseasonal_small {
                for &(sp, sq) in &seasonal_pairs {
                    candidates.push((
                        ArimaOrder::new(p, d, q),
                        Some(SeasonalOrder::new(sp, seasonal_d, sq, s)),
                    ));
                }
            }
        }

        candidates
    }
}

/// Suggest one round of seasonal differencing when it shrinks the variance
/// markedly.
fn suggest_seasonal_differencing(values: &[f64], period: usize) -> usize {
    if period < 2 || values.len() < 2 * period {
        return 0;
    }

    let seasonal_diffs: Vec<f64> = (period..values.len())
        .map(|i| values[i] - values[i - period])
        .collect();

    let var = |v: &[f64]| -> f64 {
        let mean = v.iter().sum::<f64>() / v.len() as f64;
        v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / v.len() as f64
    };

    if var(&seasonal_diffs) < 0.7 * var(values) {
        1
    } else {
        0
    }
}

impl Default for AutoArima {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoArima {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        let values = series.values();
        let s = self.options.seasonal_period;
        let min_required = if s > 1 { 3 * s } else { 10 };
        if values.len() < min_required {
            return Err(PipelineError::InsufficientData {
                needed: min_required,
                got: values.len(),
            });
        }

        // Differencing orders to try: the heuristic suggestion and its
        // neighbors, capped by the configured maximum.
        let suggested = suggest_differencing(values).min(self.options.max_d);
        let mut d_range = vec![suggested];
        if suggested > 0 {
            d_range.push(suggested - 1);
        }
        if suggested < self.options.max_d {
            d_range.push(suggested + 1);
        }
        d_range.sort_unstable();
        d_range.dedup();

        let seasonal_d = if s > 1 {
            suggest_seasonal_differencing(values, s)
        } else {
            0
        };

        self.scores.clear();
        let mut best: Option<(Arima, f64)> = None;

        for &d in &d_range {
            for (order, seasonal) in self.candidate_orders(d, seasonal_d) {
                let mut candidate = Arima::with_orders(order, seasonal);
                if candidate.fit(series).is_err() {
                    continue;
                }
                let Some(score) = candidate.aic() else {
                    continue;
                };
                if !score.is_finite() {
                    continue;
                }
                self.scores.push((candidate.name(), score));
                if best.as_ref().is_none_or(|(_, b)| score < *b) {
                    best = Some((candidate, score));
                }
            }
        }

        self.scores
            .sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((model, _)) => {
                self.selected = Some(model);
                Ok(())
            }
            None => Err(PipelineError::Computation(
                "no ARIMA candidate could be fitted".to_string(),
            )),
        }
    }

    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        self.selected
            .as_ref()
            .ok_or(PipelineError::FitRequired)?
            .forecast(horizon, level)
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref().and_then(|m| m.residuals())
    }

    fn params(&self) -> Vec<(String, f64)> {
        self.selected.as_ref().map_or_else(Vec::new, |m| m.params())
    }

    fn name(&self) -> String {
        match &self.selected {
            Some(model) => model.name(),
            None => "AutoARIMA".to_string(),
        }
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
    fn selects_a_model_and_forecasts() {
        let values: Vec<f64> = (0..100).map(|i| 10.0 + (i as f64 * 0.2).sin()).collect();
        let series = make_series(values);

        let mut model = AutoArima::new();
        model.fit(&series).unwrap();

        assert!(model.selected_order().is_some());
        assert!(!model.candidate_scores().is_empty());
        assert_eq!(model.forecast(5, 0.95).unwrap().horizon(), 5);
    }

    #[test]
    fn ar_process_selects_an_ar_component() {
        let mut values = vec![10.0];
        for i in 1..150 {
            values.push(0.8 * values[i - 1] + 2.0 + (i as f64 * 0.05).sin());
        }
        let series = make_series(values);

        let mut model = AutoArima::new();
        model.fit(&series).unwrap();

        let order = model.selected_order().unwrap();
        assert!(order.p >= 1 || order.d >= 1);
    }

    #[test]
    fn candidate_scores_are_sorted() {
        let values: Vec<f64> = (0..100).map(|i| 10.0 + (i as f64 * 0.3).sin()).collect();
        let series = make_series(values);

        let mut model = AutoArima::new();
        model.fit(&series).unwrap();

        let scores = model.candidate_scores();
        for pair in scores.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn seasonal_search_considers_seasonal_candidates() {
        let period = 12;
        let values: Vec<f64> = (0..144)
            .map(|i| {
                50.0 + 0.2 * i as f64
                    + 10.0 * (2.0 * std::f64::consts::PI * i as f64 / period as f64).sin()
            })
            .collect();
        let series = make_series(values);

        let mut model = AutoArima::seasonal(period);
        model.fit(&series).unwrap();

        assert!(model
            .candidate_scores()
            .iter()
            .any(|(name, _)| name.contains("[12]")));
        assert_eq!(model.forecast(12, 0.95).unwrap().horizon(), 12);
    }

    #[test]
    fn insufficient_data_is_rejected() {
        let series = make_series(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut model = AutoArima::new();
        assert!(matches!(
            model.fit(&series),
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn forecast_requires_fit() {
        let model = AutoArima::new();
        assert!(matches!(
            model.forecast(5, 0.95),
            Err(PipelineError::FitRequired)
        ));
    }
}
