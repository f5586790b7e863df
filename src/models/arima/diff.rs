//! Differencing and integration utilities for ARIMA models.

/// Apply first differencing `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing `d` times at the given period.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Undo `d` rounds of first differencing on a forecast, anchoring each level
/// on the last value of the correspondingly differenced original series.
pub fn integrate(forecast: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || forecast.is_empty() {
        return forecast.to_vec();
    }

    let mut result = forecast.to_vec();
    for level in (0..d).rev() {
        let anchor = *difference(original, level).last().unwrap_or(&0.0);
        let mut cumsum = anchor;
        result = result
            .iter()
            .map(|&diff| {
                cumsum += diff;
                cumsum
            })
            .collect();
    }
    result
}

/// Undo `d` rounds of seasonal differencing on a forecast, reading the
/// seasonal anchors from the history at each level.
pub fn integrate_seasonal(forecast: &[f64], history: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 || forecast.is_empty() {
        return forecast.to_vec();
    }

    let mut result = forecast.to_vec();
    for level in (0..d).rev() {
        let mut extended = seasonal_difference(history, level, period);
        let mut integrated = Vec::with_capacity(result.len());
        for &value in &result {
            let t = extended.len();
            let anchor = if t >= period {
                extended[t - period]
            } else {
                0.0
            };
            let y = value + anchor;
            integrated.push(y);
            extended.push(y);
        }
        result = integrated;
    }
    result
}

/// Suggest a differencing order (0..=2) by the variance-ratio heuristic:
/// difference while it keeps shrinking the variance.
pub fn suggest_differencing(series: &[f64]) -> usize {
    if series.len() < 3 {
        return 0;
    }

    let var_0 = variance(series);
    let diff_1 = difference(series, 1);
    if diff_1.len() < 2 {
        return 0;
    }
    let var_1 = variance(&diff_1);

    if var_0 > 0.0 && var_1 / var_0 < 0.9 {
        let diff_2 = difference(&diff_1, 1);
        if diff_2.len() >= 2 {
            let var_2 = variance(&diff_2);
            if var_2 / var_1 < 0.9 && var_2 < var_0 {
                return 2;
            }
        }
        return 1;
    }

    0
}

fn variance(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (series.len() - 1) as f64
}
