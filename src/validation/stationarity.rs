//! Unit-root tests and the differencing policy.
//!
//! ADF tests the null of a unit root; KPSS tests the null of stationarity.
//! The two opposite nulls are combined: a series counts as stationary only
//! when ADF rejects its null and KPSS fails to reject its own.

use serde::{Deserialize, Serialize};

/// Outcome of a single unit-root test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRootTest {
    /// Test statistic.
    pub statistic: f64,
    /// Approximate p-value.
    pub p_value: f64,
    /// Lags used by the test.
    pub lags: usize,
    /// Verdict at the 5% level, interpreted per test's null.
    pub is_stationary: bool,
    /// Critical value at the 5% level.
    pub cv_5pct: f64,
}

impl UnitRootTest {
    fn undefined() -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            is_stationary: false,
            cv_5pct: f64::NAN,
        }
    }
}

/// Augmented Dickey-Fuller test (null: the series has a unit root).
///
/// A test statistic below the critical value rejects the null, i.e. supports
/// stationarity.
pub fn adf_test(series: &[f64], max_lags: Option<usize>) -> UnitRootTest {
    let n = series.len();
    if n < 4 {
        return UnitRootTest::undefined();
    }

    let max_lags = max_lags.unwrap_or_else(|| ((n - 1) as f64).powf(1.0 / 3.0).floor() as usize);
    let max_lags = max_lags.min(n / 2 - 1).max(1);

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let level = &series[..n - 1];

    let best_lag = select_lag_by_aic(&diff, level, max_lags);
    let (beta, se) = dickey_fuller_regression(&diff, level, best_lag);

    if se == 0.0 || !se.is_finite() {
        return UnitRootTest {
            lags: best_lag,
            ..UnitRootTest::undefined()
        };
    }

    let t_stat = beta / se;
    // MacKinnon critical value, constant-only regression.
    let cv_5pct = -2.86;
    UnitRootTest {
        statistic: t_stat,
        p_value: adf_p_value(t_stat),
        lags: best_lag,
        is_stationary: t_stat < cv_5pct,
        cv_5pct,
    }
}

/// KPSS test (null: the series is level-stationary).
///
/// A test statistic below the critical value fails to reject the null, i.e.
/// supports stationarity.
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> UnitRootTest {
    let n = series.len();
    if n < 4 {
        return UnitRootTest::undefined();
    }

    let lags = lags.unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize);
    let lags = lags.min(n / 2).max(1);

    let mean = series.iter().sum::<f64>() / n as f64;
    let residuals: Vec<f64> = series.iter().map(|&x| x - mean).collect();

    let mut running = 0.0;
    let mut cumsum_sq = 0.0;
    for &r in &residuals {
        running += r;
        cumsum_sq += running * running;
    }
    let numerator = cumsum_sq / (n * n) as f64;

    // Bartlett-kernel HAC variance of the residuals.
    let mut variance = residuals.iter().map(|&r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocovar: f64 = residuals
            .iter()
            .skip(j)
            .zip(residuals.iter())
            .map(|(&a, &b)| a * b)
            .sum::<f64>()
            / n as f64;
        variance += 2.0 * weight * autocovar;
    }

    if variance <= 0.0 {
        return UnitRootTest {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags,
            is_stationary: true,
            cv_5pct: 0.463,
        };
    }

    let stat = numerator / variance;
    let cv_5pct = 0.463;
    UnitRootTest {
        statistic: stat,
        p_value: kpss_p_value(stat),
        lags,
        is_stationary: stat < cv_5pct,
        cv_5pct,
    }
}

/// Pick the augmentation lag for the ADF regression by AIC over a simple
/// level-on-difference regression.
fn select_lag_by_aic(diff: &[f64], level: &[f64], max_lags: usize) -> usize {
    let mut best_lag = 1;
    let mut best_aic = f64::INFINITY;

    for lag in 1..=max_lags {
        let n = diff.len();
        if n <= lag + 2 {
            continue;
        }
        let effective_n = (n - lag) as f64;
        let (_, _, rss) = regress(&diff[lag..], &level[lag..n]);
        if rss <= 0.0 || !rss.is_finite() {
            continue;
        }
        let k = (lag + 2) as f64;
        let aic = effective_n * (rss / effective_n).ln() + 2.0 * k;
        if aic < best_aic {
            best_aic = aic;
            best_lag = lag;
        }
    }

    best_lag
}

/// Coefficient and standard error of the level term in the Dickey-Fuller
/// regression `Δy_t = α + β·y_{t-1} + ε_t`, skipping the first `lag` rows.
fn dickey_fuller_regression(diff: &[f64], level: &[f64], lag: usize) -> (f64, f64) {
    let n = diff.len();
    if n <= lag + 2 || level.len() < n {
        return (f64::NAN, f64::NAN);
    }

    let y = &diff[lag..];
    let x = &level[lag..n];
    let effective_n = y.len() as f64;

    let (beta, _, rss) = regress(y, x);
    if !beta.is_finite() {
        return (f64::NAN, f64::NAN);
    }

    let sigma_sq = rss / (effective_n - 2.0);
    if sigma_sq <= 0.0 {
        return (f64::NAN, f64::NAN);
    }

    let x_mean = x.iter().sum::<f64>() / effective_n;
    let xx: f64 = x.iter().map(|&v| (v - x_mean).powi(2)).sum();
    if xx == 0.0 {
        return (f64::NAN, f64::NAN);
    }

    (beta, (sigma_sq / xx).sqrt())
}

/// Simple regression of y on x with intercept: returns (slope, intercept, rss).
fn regress(y: &[f64], x: &[f64]) -> (f64, f64, f64) {
    let n = y.len() as f64;
    if y.len() != x.len() || y.len() < 3 {
        return (f64::NAN, f64::NAN, f64::INFINITY);
    }

    let y_mean = y.iter().sum::<f64>() / n;
    let x_mean = x.iter().sum::<f64>() / n;

    let mut xx = 0.0;
    let mut xy = 0.0;
    for (yi, xi) in y.iter().zip(x.iter()) {
        xx += (xi - x_mean) * (xi - x_mean);
        xy += (xi - x_mean) * (yi - y_mean);
    }
    if xx == 0.0 {
        return (f64::NAN, f64::NAN, f64::INFINITY);
    }

    let slope = xy / xx;
    let intercept = y_mean - slope * x_mean;

    let rss: f64 = y
        .iter()
        .zip(x.iter())
        .map(|(yi, xi)| (yi - intercept - slope * xi).powi(2))
        .sum();

    (slope, intercept, rss)
}

/// Piecewise p-value interpolation over the MacKinnon tau table.
fn adf_p_value(t_stat: f64) -> f64 {
    if t_stat.is_nan() {
        return f64::NAN;
    }
    if t_stat < -4.0 {
        0.001
    } else if t_stat < -3.43 {
        0.01
    } else if t_stat < -2.86 {
        0.05
    } else if t_stat < -2.57 {
        0.10
    } else if t_stat < -1.94 {
        0.20
    } else if t_stat < -1.62 {
        0.30
    } else if t_stat < -1.28 {
        0.40
    } else if t_stat < -0.84 {
        0.50
    } else if t_stat < 0.0 {
        0.70
    } else {
        0.90 + 0.05 * (1.0 - (-t_stat).exp())
    }
}

/// Piecewise p-value interpolation over the KPSS critical-value table.
fn kpss_p_value(stat: f64) -> f64 {
    if stat.is_nan() {
        return f64::NAN;
    }
    if stat < 0.347 {
        0.10 + 0.90 * (1.0 - stat / 0.347)
    } else if stat < 0.463 {
        0.05 + 0.05 * (0.463 - stat) / (0.463 - 0.347)
    } else if stat < 0.739 {
        0.01 + 0.04 * (0.739 - stat) / (0.739 - 0.463)
    } else {
        0.01 * (1.0 - (stat - 0.739).min(1.0))
    }
}

/// One round of the differencing loop: the differencing order applied and
/// both test outcomes at that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferencingRound {
    /// Differencing order of the tested series.
    pub order: usize,
    /// ADF outcome at this order.
    pub adf: UnitRootTest,
    /// KPSS outcome at this order.
    pub kpss: UnitRootTest,
}

impl DifferencingRound {
    /// Both tests agree the series at this order is stationary.
    pub fn agree_stationary(&self) -> bool {
        self.adf.is_stationary && self.kpss.is_stationary
    }
}

/// The full differencing history of the stationarity stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationarityAssessment {
    /// One entry per tested differencing order, in order.
    pub rounds: Vec<DifferencingRound>,
    /// Differencing order the stage settled on.
    pub selected_order: usize,
    /// Whether both tests agreed at `selected_order`; false means the
    /// maximum order was exhausted.
    pub stationary: bool,
}

/// Difference until both tests agree on stationarity or `max_order` is
/// reached.
///
/// The returned assessment is never silently inconsistent: either the final
/// round agrees stationary, or `stationary` is false and the caller must
/// raise the max-differencing warning.
pub fn assess_stationarity(series: &[f64], max_order: usize) -> StationarityAssessment {
    let mut current = series.to_vec();
    let mut rounds = Vec::new();

    for order in 0..=max_order {
        let round = DifferencingRound {
            order,
            adf: adf_test(&current, None),
            kpss: kpss_test(&current, None),
        };
        let agree = round.agree_stationary();
        rounds.push(round);

        if agree {
            return StationarityAssessment {
                rounds,
                selected_order: order,
                stationary: true,
            };
        }
        if order < max_order {
            current = current.windows(2).map(|w| w[1] - w[0]).collect();
        }
    }

    StationarityAssessment {
        rounds,
        selected_order: max_order,
        stationary: false,
    }
}
