//! Rolling-origin (expanding window) cross-validation.

use crate::core::PriceSeries;
use crate::error::{PipelineError, Result};
use crate::models::Forecaster;
use serde::{Deserialize, Serialize};

/// Options for expanding-window one-step-ahead cross-validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvOptions {
    /// Size of the first training window.
    pub initial_window: usize,
    /// Origins to skip between folds.
    pub step: usize,
}

impl Default for CvOptions {
    fn default() -> Self {
        Self {
            initial_window: 30,
            step: 1,
        }
    }
}

impl CvOptions {
    /// Expanding-window CV starting from `initial_window` observations.
    pub fn expanding(initial_window: usize) -> Self {
        Self {
            initial_window,
            step: 1,
        }
    }

    /// Set the origin step between folds.
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step.max(1);
        self
    }
}

/// Fold-averaged accuracy from a cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvSummary {
    /// Number of one-step folds evaluated.
    pub n_folds: usize,
    /// Mean absolute one-step error across folds.
    pub mae: f64,
    /// Root mean squared one-step error across folds.
    pub rmse: f64,
}

/// Run expanding-window one-step-ahead cross-validation.
///
/// For each origin `t` from `initial_window` to the end of the series, a
/// fresh model from `factory` is fit on `series[..t]` and its one-step
/// forecast is scored against `series[t]`. Fold errors are averaged into a
/// [`CvSummary`].
pub fn rolling_origin<M, F>(series: &PriceSeries, options: &CvOptions, factory: F) -> Result<CvSummary>
where
    M: Forecaster,
    F: Fn() -> M,
{
    let n = series.len();
    if options.initial_window == 0 || options.initial_window >= n {
        return Err(PipelineError::InsufficientData {
            needed: options.initial_window + 1,
            got: n,
        });
    }

    let mut abs_errors = Vec::new();
    let mut sq_errors = Vec::new();

    let mut origin = options.initial_window;
    while origin < n {
        let train = series.slice(0, origin)?;
        let mut model = factory();
        model.fit(&train)?;

        let forecast = model.forecast(1, 0.95)?;
        let predicted = forecast.point()[0];
        let actual = series.values()[origin];

        abs_errors.push((actual - predicted).abs());
        sq_errors.push((actual - predicted).powi(2));

        origin += options.step.max(1);
    }

    let folds = abs_errors.len();
    if folds == 0 {
        return Err(PipelineError::InsufficientData {
            needed: options.initial_window + 1,
            got: n,
        });
    }

    Ok(CvSummary {
        n_folds: folds,
        mae: abs_errors.iter().sum::<f64>() / folds as f64,
        rmse: (sq_errors.iter().sum::<f64>() / folds as f64).sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::baseline::Naive;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_series(values: Vec<f64>) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect();
        PriceSeries::new(dates, values).unwrap()
    }

    #[test]
    fn naive_cv_on_constant_steps_has_constant_error() {
        // Each one-step naive forecast on a unit-slope line is off by 1.
        let series = make_series((0..20).map(|i| i as f64).collect());
        let summary =
            rolling_origin(&series, &CvOptions::expanding(10), Naive::new).unwrap();

        assert_eq!(summary.n_folds, 10);
        assert_relative_eq!(summary.mae, 1.0, epsilon = 1e-10);
        assert_relative_eq!(summary.rmse, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn step_reduces_the_fold_count() {
        let series = make_series((0..20).map(|i| i as f64).collect());
        let options = CvOptions::expanding(10).with_step(5);
        let summary = rolling_origin(&series, &options, Naive::new).unwrap();
        assert_eq!(summary.n_folds, 2);
    }

    #[test]
    fn requires_room_for_at_least_one_fold() {
        let series = make_series(vec![1.0, 2.0, 3.0]);
        let result = rolling_origin(&series, &CvOptions::expanding(5), Naive::new);
        assert!(matches!(
            result,
            Err(PipelineError::InsufficientData { .. })
        ));
    }
}
