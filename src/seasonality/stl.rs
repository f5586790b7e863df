//! Additive seasonal-trend decomposition with LOESS smoothing.

use serde::{Deserialize, Serialize};

/// Additive decomposition: `y = trend + seasonal + remainder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Long-run trend component.
    pub trend: Vec<f64>,
    /// Repeating seasonal component.
    pub seasonal: Vec<f64>,
    /// Residual after removing trend and seasonal.
    pub remainder: Vec<f64>,
}

impl Decomposition {
    /// Seasonal strength in [0, 1]; near 1 means strong seasonality.
    pub fn seasonal_strength(&self) -> f64 {
        component_strength(&self.seasonal, &self.remainder)
    }

    /// Trend strength in [0, 1]; near 1 means strong trend.
    pub fn trend_strength(&self) -> f64 {
        component_strength(&self.trend, &self.remainder)
    }
}

fn component_strength(component: &[f64], remainder: &[f64]) -> f64 {
    let var_rem = variance(remainder);
    let combined: Vec<f64> = component
        .iter()
        .zip(remainder.iter())
        .map(|(c, r)| c + r)
        .collect();
    let var_combined = variance(&combined);
    if var_combined < 1e-10 {
        return 0.0;
    }
    (1.0 - var_rem / var_combined).max(0.0)
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean: f64 = values.iter().sum::<f64>() / n as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// STL decomposer for a single fixed seasonal period.
#[derive(Debug, Clone)]
pub struct StlDecomposer {
    period: usize,
    seasonal_smoothness: usize,
    trend_smoothness: usize,
    low_pass_smoothness: usize,
    inner_iterations: usize,
}

impl StlDecomposer {
    /// Create a decomposer with default smoothing spans for the period,
    /// following Cleveland et al. (1990).
    pub fn new(period: usize) -> Self {
        let ns = period | 1;
        let nt = (1.5 * period as f64 / (1.0 - 1.5 / ns as f64)).ceil() as usize;
        let nt = nt | 1;
        let nl = period | 1;

        Self {
            period,
            seasonal_smoothness: ns,
            trend_smoothness: nt,
            low_pass_smoothness: nl,
            inner_iterations: 2,
        }
    }

    /// The configured seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose the series; returns `None` when the series is shorter than
    /// two full periods.
    pub fn decompose(&self, series: &[f64]) -> Option<Decomposition> {
        let n = series.len();
        if self.period < 2 || n < 2 * self.period {
            return None;
        }

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];

        for _ in 0..self.inner_iterations {
            // Detrend, then smooth each cycle-subseries to estimate seasonality.
            let detrended: Vec<f64> = series.iter().zip(trend.iter()).map(|(y, t)| y - t).collect();
            let cycle = self.smooth_cycle_subseries(&detrended);

            // Remove the low-frequency leakage from the seasonal estimate.
            let low_pass = self.low_pass_filter(&cycle);
            for i in 0..n {
                seasonal[i] = cycle[i] - low_pass[i];
            }

            // Smooth the deseasonalized series into the trend.
            let deseasonalized: Vec<f64> = series
                .iter()
                .zip(seasonal.iter())
                .map(|(y, s)| y - s)
                .collect();
            trend = loess_smooth(&deseasonalized, self.trend_smoothness);
        }

        let remainder: Vec<f64> = series
            .iter()
            .zip(seasonal.iter())
            .zip(trend.iter())
            .map(|((y, s), t)| y - s - t)
            .collect();

        Some(Decomposition {
            trend,
            seasonal,
            remainder,
        })
    }

    /// Smooth each position-in-cycle subseries independently.
    fn smooth_cycle_subseries(&self, detrended: &[f64]) -> Vec<f64> {
        let n = detrended.len();
        let mut result = vec![0.0; n];

        for cycle_pos in 0..self.period {
            let indices: Vec<usize> = (cycle_pos..n).step_by(self.period).collect();
            let subseries: Vec<f64> = indices.iter().map(|&i| detrended[i]).collect();
            let smoothed = loess_smooth(&subseries, self.seasonal_smoothness);
            for (&idx, &value) in indices.iter().zip(smoothed.iter()) {
                result[idx] = value;
            }
        }

        result
    }

    /// Three stacked moving averages followed by a LOESS pass.
    fn low_pass_filter(&self, series: &[f64]) -> Vec<f64> {
        let ma1 = moving_average(series, self.period);
        let ma2 = moving_average(&ma1, self.period);
        let ma3 = moving_average(&ma2, 3);
        loess_smooth(&ma3, self.low_pass_smoothness)
    }
}

/// Centered moving average with edge shrinking.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let half = window / 2;
    let mut result = vec![0.0; n];

    for i in 0..n {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(n);
        let sum: f64 = series[start..end].iter().sum();
        result[i] = sum / (end - start) as f64;
    }

    result
}

/// Tricube-weighted local averaging (LOESS degree 0).
fn loess_smooth(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    let half_span = span / 2;
    let mut result = vec![0.0; n];

    for i in 0..n {
        let start = i.saturating_sub(half_span);
        let end = (i + half_span + 1).min(n);

        let mut sum_weights = 0.0;
        let mut sum_values = 0.0;
        for j in start..end {
            let u = (i as f64 - j as f64).abs() / (half_span as f64 + 1.0);
            let weight = if u < 1.0 {
                (1.0 - u.powi(3)).powi(3)
            } else {
                0.0
            };
            sum_weights += weight;
            sum_values += weight * values[j];
        }

        result[i] = if sum_weights > 0.0 {
            sum_values / sum_weights
        } else {
            values[i]
        };
    }

    result
}
