//! Date-indexed price series and the train/test split.

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A univariate daily series: one value per strictly increasing date.
///
/// Derived series (log, power-transformed, differenced) keep the original
/// date index minus any leading points lost to differencing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PriceSeries {
    /// Create a series, validating index and length agreement.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "dates and values differ in length: {} vs {}",
                dates.len(),
                values.len()
            )));
        }
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(PipelineError::InvalidParameter(
                    "dates must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self { dates, values })
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observation values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Last observed value.
    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// True when every value is strictly positive.
    pub fn all_positive(&self) -> bool {
        !self.is_empty() && self.values.iter().all(|&v| v > 0.0)
    }

    /// Extract `[start, end)` as a new series.
    pub fn slice(&self, start: usize, end: usize) -> Result<PriceSeries> {
        if start > end || end > self.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "invalid slice [{start}, {end}) of series with {} points",
                self.len()
            )));
        }
        Ok(Self {
            dates: self.dates[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Apply a value transform, keeping the date index.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> PriceSeries {
        Self {
            dates: self.dates.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Replace the values, keeping the date index.
    pub fn with_values(&self, values: Vec<f64>) -> Result<PriceSeries> {
        Self::new(self.dates.clone(), values)
    }

    /// First differences applied `d` times; the index drops its first `d`
    /// dates accordingly.
    pub fn differenced(&self, d: usize) -> PriceSeries {
        let mut values = self.values.clone();
        for _ in 0..d {
            if values.len() <= 1 {
                values.clear();
                break;
            }
            values = values.windows(2).map(|w| w[1] - w[0]).collect();
        }
        let dates = self.dates[self.len() - values.len()..].to_vec();
        Self { dates, values }
    }

    /// Natural-log series. Fails if any value is non-positive.
    pub fn log(&self) -> Result<PriceSeries> {
        if !self.all_positive() {
            return Err(PipelineError::Transform(
                "log transform requires strictly positive values".to_string(),
            ));
        }
        Ok(self.map_values(f64::ln))
    }

    /// Reserve the final `holdout` observations as a test window.
    pub fn split_holdout(&self, holdout: usize) -> Result<TrainTestSplit> {
        if holdout == 0 {
            return Err(PipelineError::InvalidParameter(
                "holdout must be positive".to_string(),
            ));
        }
        if self.len() <= holdout {
            return Err(PipelineError::InsufficientData {
                needed: holdout + 1,
                got: self.len(),
            });
        }
        let cut = self.len() - holdout;
        Ok(TrainTestSplit {
            train: self.slice(0, cut)?,
            test: self.slice(cut, self.len())?,
        })
    }
}

/// Contiguous, non-overlapping partition of a series into a training prefix
/// and a fixed-length test suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainTestSplit {
    /// Training prefix; all model fitting uses only this window.
    pub train: PriceSeries,
    /// Held-out test suffix of length `horizon`.
    pub test: PriceSeries,
}

impl TrainTestSplit {
    /// Length of the held-out window.
    pub fn horizon(&self) -> usize {
        self.test.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_dates(n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect()
    }

    #[test]
    fn series_constructs_and_exposes_values() {
        let series = PriceSeries::new(make_dates(4), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(series.len(), 4);
        assert!(!series.is_empty());
        assert_eq!(series.values(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(series.last_value(), Some(4.0));
        assert!(series.all_positive());
    }

    #[test]
    fn series_rejects_length_mismatch() {
        let result = PriceSeries::new(make_dates(3), vec![1.0, 2.0]);
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));
    }

    #[test]
    fn series_rejects_non_increasing_dates() {
        let mut dates = make_dates(3);
        dates[2] = dates[1]; // duplicate
        let result = PriceSeries::new(dates, vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));

        let mut dates = make_dates(3);
        dates.swap(1, 2); // goes backward
        let result = PriceSeries::new(dates, vec![1.0, 2.0, 3.0]);
        assert!(result.is_err());
    }

    #[test]
    fn differencing_drops_leading_dates() {
        let series = PriceSeries::new(make_dates(5), vec![1.0, 3.0, 6.0, 10.0, 15.0]).unwrap();

        let d1 = series.differenced(1);
        assert_eq!(d1.values(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(d1.dates(), &series.dates()[1..]);

        let d2 = series.differenced(2);
        assert_eq!(d2.values(), &[1.0, 1.0, 1.0]);
        assert_eq!(d2.dates(), &series.dates()[2..]);
    }

    #[test]
    fn log_requires_positive_values() {
        let series = PriceSeries::new(make_dates(3), vec![1.0, std::f64::consts::E, 1.0]).unwrap();
        let logged = series.log().unwrap();
        assert_relative_eq!(logged.values()[1], 1.0, epsilon = 1e-12);

        let series = PriceSeries::new(make_dates(3), vec![1.0, -2.0, 3.0]).unwrap();
        assert!(matches!(series.log(), Err(PipelineError::Transform(_))));
    }

    #[test]
    fn split_holdout_partitions_exactly() {
        let n = 40;
        let series = PriceSeries::new(make_dates(n), (0..n).map(|i| i as f64).collect()).unwrap();

        let split = series.split_holdout(12).unwrap();
        assert_eq!(split.train.len() + split.test.len(), n);
        assert_eq!(split.horizon(), 12);
        assert_eq!(split.train.values().last(), Some(&27.0));
        assert_eq!(split.test.values().first(), Some(&28.0));
    }

    #[test]
    fn split_holdout_needs_more_than_holdout_points() {
        let series = PriceSeries::new(make_dates(5), vec![1.0; 5]).unwrap();
        assert!(matches!(
            series.split_holdout(5),
            Err(PipelineError::InsufficientData { .. })
        ));
        assert!(series.split_holdout(4).is_ok());
    }

    #[test]
    fn slice_validates_bounds() {
        let series = PriceSeries::new(make_dates(5), vec![1.0; 5]).unwrap();
        assert!(series.slice(1, 4).is_ok());
        assert!(series.slice(4, 1).is_err());
        assert!(series.slice(0, 6).is_err());
    }
}
