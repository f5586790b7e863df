//! Accuracy metrics for forecast evaluation.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// The fixed metric set every forecast is scored with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error.
    pub mae: f64,
    /// Root Mean Squared Error.
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None when the actuals contain zeros).
    pub mape: Option<f64>,
    /// Mean Absolute Scaled Error, scaled by the one-step naive error of the
    /// training window (None when that scale is zero or unavailable).
    pub mase: Option<f64>,
    /// Theil's U: rmse(error) / (rms(forecast) + rms(actual)).
    pub theils_u: f64,
}

/// Score a forecast against the held-out window.
///
/// `train` supplies the in-sample naive error scale for MASE; the actual and
/// forecast slices must be the same non-zero length. The computation is a
/// pure function of its inputs.
pub fn eval_metrics(actual: &[f64], forecast: &[f64], train: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || forecast.is_empty() {
        return Err(PipelineError::EmptyData);
    }
    if actual.len() != forecast.len() {
        return Err(PipelineError::InvalidParameter(format!(
            "actual and forecast differ in length: {} vs {}",
            actual.len(),
            forecast.len()
        )));
    }

    let n = actual.len() as f64;

    let mae = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).abs())
        .sum::<f64>()
        / n;

    let mse = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).powi(2))
        .sum::<f64>()
        / n;
    let rmse = mse.sqrt();

    let mape = if actual.contains(&0.0) {
        None
    } else {
        let sum: f64 = actual
            .iter()
            .zip(forecast.iter())
            .map(|(a, f)| ((a - f) / a).abs())
            .sum();
        Some(100.0 * sum / n)
    };

    let mase = naive_error_scale(train).map(|scale| mae / scale);

    let rms_forecast = (forecast.iter().map(|f| f * f).sum::<f64>() / n).sqrt();
    let rms_actual = (actual.iter().map(|a| a * a).sum::<f64>() / n).sqrt();
    let denom = rms_forecast + rms_actual;
    let theils_u = if denom == 0.0 { 0.0 } else { rmse / denom };

    Ok(AccuracyMetrics {
        mae,
        rmse,
        mape,
        mase,
        theils_u,
    })
}

/// Mean absolute one-step naive error of the training window.
fn naive_error_scale(train: &[f64]) -> Option<f64> {
    if train.len() < 2 {
        return None;
    }
    let scale = train
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .sum::<f64>()
        / (train.len() - 1) as f64;
    if scale == 0.0 {
        None
    } else {
        Some(scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_forecast_scores_zero_everywhere() {
        let actual = vec![1.0, 2.0, 3.0, 4.0];
        let train = vec![0.5, 1.0, 0.8, 1.2];

        let metrics = eval_metrics(&actual, &actual, &train).unwrap();

        assert_relative_eq!(metrics.mae, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.rmse, 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.mape.unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.mase.unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.theils_u, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn known_error_values() {
        let actual = vec![1.0, 2.0, 3.0, 4.0];
        let forecast = vec![1.5, 2.5, 2.5, 4.5];
        let train = vec![0.0, 1.0, 2.0, 3.0]; // naive scale = 1

        let metrics = eval_metrics(&actual, &forecast, &train).unwrap();

        assert_relative_eq!(metrics.mae, 0.5, epsilon = 1e-12);
        assert_relative_eq!(metrics.rmse, 0.5, epsilon = 1e-12);
        assert_relative_eq!(metrics.mase.unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn mase_is_one_at_the_naive_error_scale() {
        // Training window with constant step 2 -> naive scale 2;
        // a forecast off by exactly 2 everywhere scores MASE = 1.
        let train: Vec<f64> = (0..10).map(|i| 2.0 * i as f64).collect();
        let actual = vec![20.0, 22.0, 24.0];
        let forecast = vec![22.0, 24.0, 26.0];

        let metrics = eval_metrics(&actual, &forecast, &train).unwrap();
        assert_relative_eq!(metrics.mase.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn mape_is_missing_when_actuals_contain_zero() {
        let actual = vec![0.0, 1.0, 2.0];
        let forecast = vec![0.1, 1.1, 2.1];
        let train = vec![1.0, 2.0, 3.0];

        let metrics = eval_metrics(&actual, &forecast, &train).unwrap();
        assert!(metrics.mape.is_none());
        assert!(metrics.mae.is_finite());
    }

    #[test]
    fn mase_is_missing_for_constant_training_window() {
        let actual = vec![1.0, 2.0];
        let forecast = vec![1.5, 2.5];
        let train = vec![3.0, 3.0, 3.0];

        let metrics = eval_metrics(&actual, &forecast, &train).unwrap();
        assert!(metrics.mase.is_none());
    }

    #[test]
    fn eval_metrics_is_deterministic() {
        let actual = vec![10.0, 11.0, 12.5, 13.0];
        let forecast = vec![10.2, 10.9, 12.1, 13.4];
        let train: Vec<f64> = (0..30).map(|i| 10.0 + (i as f64 * 0.7).sin()).collect();

        let first = eval_metrics(&actual, &forecast, &train).unwrap();
        let second = eval_metrics(&actual, &forecast, &train).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let result = eval_metrics(&[1.0, 2.0], &[1.0], &[1.0, 2.0]);
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));

        let result = eval_metrics(&[], &[], &[1.0, 2.0]);
        assert!(matches!(result, Err(PipelineError::EmptyData)));
    }
}
