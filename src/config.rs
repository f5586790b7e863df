//! Pipeline configuration.

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_log_lambda_tolerance() -> f64 {
    0.15
}

/// Configuration for one pipeline run.
///
/// The five recognized options of the pipeline (ticker, date range, horizon,
/// seasonal period) plus the Box-Cox log-equivalence threshold and the
/// cross-validation toggle. Defaults reproduce the reference run: AAPL daily
/// adjusted closes 2015-2024, a 12-step holdout, and 252 trading days per
/// seasonal cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ticker symbol of the series to fetch.
    pub ticker: String,
    /// First date of the range (inclusive).
    pub start_date: NaiveDate,
    /// Last date of the range (inclusive).
    pub end_date: NaiveDate,
    /// Holdout length and forecast horizon.
    pub horizon: usize,
    /// Seasonal period in observations (trading days per year).
    pub seasonal_period: usize,
    /// |lambda| below this is reported as equivalent to a log transform.
    #[serde(default = "default_log_lambda_tolerance")]
    pub log_lambda_tolerance: f64,
    /// Run rolling-origin cross-validation for the cheap model families.
    #[serde(default)]
    pub cross_validate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            horizon: 12,
            seasonal_period: 252,
            log_lambda_tolerance: default_log_lambda_tolerance(),
            cross_validate: false,
        }
    }
}

impl PipelineConfig {
    /// Set the ticker symbol.
    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = ticker.into();
        self
    }

    /// Set the date range.
    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Set the holdout length / forecast horizon.
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the seasonal period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Enable rolling-origin cross-validation.
    pub fn with_cross_validation(mut self) -> Self {
        self.cross_validate = true;
        self
    }

    /// Validate the configuration before a run.
    pub fn validate(&self) -> Result<()> {
        if self.ticker.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "ticker must not be empty".to_string(),
            ));
        }
        if self.start_date >= self.end_date {
            return Err(PipelineError::InvalidParameter(
                "start_date must precede end_date".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(PipelineError::InvalidParameter(
                "horizon must be positive".to_string(),
            ));
        }
        if self.seasonal_period < 2 {
            return Err(PipelineError::InvalidParameter(
                "seasonal_period must be at least 2".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.log_lambda_tolerance) {
            return Err(PipelineError::InvalidParameter(
                "log_lambda_tolerance must be in [0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}
