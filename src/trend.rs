//! Linear trend characterization against a synthetic time index.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// OLS line fit of the series against its integer index.
///
/// Descriptive only: slope significance and fit quality are reported in the
/// snapshot and never gate a downstream stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Slope per observation step.
    pub slope: f64,
    /// Intercept at index 0.
    pub intercept: f64,
    /// Standard error of the slope.
    pub stderr: f64,
    /// Two-sided p-value for the slope (normal approximation).
    pub p_value: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
}

/// Fit `y = slope * t + intercept` with t = 0, 1, 2, ...
pub fn linear_trend(series: &[f64]) -> TrendSummary {
    let n = series.len();
    if n < 3 {
        return TrendSummary {
            slope: f64::NAN,
            intercept: f64::NAN,
            stderr: f64::NAN,
            p_value: f64::NAN,
            r_squared: f64::NAN,
        };
    }

    let nf = n as f64;
    let mean_t = (nf - 1.0) / 2.0;
    let mean_y = series.iter().sum::<f64>() / nf;

    let mut ss_tt = 0.0;
    let mut ss_ty = 0.0;
    for (i, &y) in series.iter().enumerate() {
        let t = i as f64 - mean_t;
        ss_tt += t * t;
        ss_ty += t * (y - mean_y);
    }

    if ss_tt == 0.0 {
        return TrendSummary {
            slope: 0.0,
            intercept: mean_y,
            stderr: f64::NAN,
            p_value: 1.0,
            r_squared: 0.0,
        };
    }

    let slope = ss_ty / ss_tt;
    let intercept = mean_y - slope * mean_t;

    let ss_yy: f64 = series.iter().map(|&y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = series
        .iter()
        .enumerate()
        .map(|(i, &y)| (y - intercept - slope * i as f64).powi(2))
        .sum();

    let r_squared = if ss_yy.abs() < 1e-12 {
        1.0
    } else {
        1.0 - ss_res / ss_yy
    };

    let mse = ss_res / (nf - 2.0);
    let stderr = (mse / ss_tt).sqrt();

    let p_value = if stderr > 1e-12 {
        let t_stat = (slope / stderr).abs();
        let normal = Normal::new(0.0, 1.0).expect("unit normal");
        2.0 * (1.0 - normal.cdf(t_stat))
    } else if slope.abs() > 1e-12 {
        0.0
    } else {
        1.0
    };

    TrendSummary {
        slope,
        intercept,
        stderr,
        p_value,
        r_squared,
    }
}
