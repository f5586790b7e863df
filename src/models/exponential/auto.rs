//! Automatic ETS specification selection by AICc.

use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, Result};
use crate::models::exponential::ets::{Ets, EtsSpec};
use crate::models::Forecaster;

/// Fit the additive ETS candidates and keep the one with the lowest AICc.
///
/// Candidates: ETS(A,N,N), ETS(A,A,N), ETS(A,Ad,N), plus ETS(A,A,A) when a
/// seasonal period is configured and at least two full cycles are available.
#[derive(Debug, Clone)]
pub struct AutoEts {
    period: usize,
    selected: Option<Ets>,
    scores: Vec<(EtsSpec, f64)>,
}

impl AutoEts {
    /// Non-seasonal selection.
    pub fn new() -> Self {
        Self {
            period: 1,
            selected: None,
            scores: Vec::new(),
        }
    }

    /// Selection including the seasonal candidate at the given period.
    pub fn seasonal(period: usize) -> Self {
        Self {
            period,
            selected: None,
            scores: Vec::new(),
        }
    }

    /// The winning specification, once fitted.
    pub fn selected_spec(&self) -> Option<EtsSpec> {
        self.selected.as_ref().map(|m| m.spec())
    }

    /// AICc per candidate that fitted, sorted ascending.
    pub fn candidate_scores(&self) -> &[(EtsSpec, f64)] {
        &self.scores
    }
}

impl Default for AutoEts {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoEts {
    fn fit(&mut self, series: &PriceSeries) -> Result<()> {
        let mut candidates = vec![EtsSpec::ann(), EtsSpec::aan(), EtsSpec::aadn()];
        if self.period > 1 && series.len() >= 2 * self.period {
            candidates.push(EtsSpec::aaa());
        }

        self.scores.clear();
        let mut best: Option<(Ets, f64)> = None;

        for spec in candidates {
            let mut candidate = Ets::new(spec, self.period);
            if candidate.fit(series).is_err() {
                continue;
            }
            let Some(score) = candidate.aicc() else {
                continue;
            };
            if !score.is_finite() {
                continue;
            }
            self.scores.push((spec, score));
            if best.as_ref().is_none_or(|(_, b)| score < *b) {
                best = Some((candidate, score));
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
                "no ETS candidate could be fitted".to_string(),
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
            None => "AutoETS".to_string(),
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
    fn selects_a_spec_and_forecasts() {
        let values: Vec<f64> = (0..60)
            .map(|i| 10.0 + 0.4 * i as f64 + (i as f64 * 0.8).sin())
            .collect();
        let series = make_series(values);

        let mut model = AutoEts::new();
        model.fit(&series).unwrap();

        assert!(model.selected_spec().is_some());
        assert!(model.candidate_scores().len() >= 2);
        assert_eq!(model.forecast(6, 0.95).unwrap().horizon(), 6);
    }

    #[test]
    fn trending_data_prefers_a_trend_component() {
        let values: Vec<f64> = (0..100)
            .map(|i| 2.0 * i as f64 + (i as f64 * 0.5).sin())
            .collect();
        let series = make_series(values);

        let mut model = AutoEts::new();
        model.fit(&series).unwrap();

        let spec = model.selected_spec().unwrap();
        assert_ne!(
            spec,
            EtsSpec::ann(),
            "expected a trend spec, got {}",
            spec.short_name()
        );
    }

    #[test]
    fn seasonal_candidate_joins_with_enough_cycles() {
        let period = 12;
        let values: Vec<f64> = (0..120)
            .map(|i| {
                50.0 + 10.0 * (2.0 * std::f64::consts::PI * i as f64 / period as f64).sin()
            })
            .collect();
        let series = make_series(values);

        let mut model = AutoEts::seasonal(period);
        model.fit(&series).unwrap();

        assert!(model
            .candidate_scores()
            .iter()
            .any(|(spec, _)| *spec == EtsSpec::aaa()));
        // A strongly seasonal series should pick the seasonal spec.
        assert_eq!(model.selected_spec(), Some(EtsSpec::aaa()));
    }

    #[test]
    fn scores_are_sorted_ascending() {
        let values: Vec<f64> = (0..60).map(|i| 10.0 + (i as f64 * 0.7).sin()).collect();
        let series = make_series(values);

        let mut model = AutoEts::new();
        model.fit(&series).unwrap();

        for pair in model.candidate_scores().windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn forecast_requires_fit() {
        let model = AutoEts::new();
        assert!(matches!(
            model.forecast(5, 0.95),
            Err(PipelineError::FitRequired)
        ));
    }
}
