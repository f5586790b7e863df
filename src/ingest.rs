//! Data ingestion: fetch a daily adjusted-close series for one ticker.

use crate::config::PipelineConfig;
use crate::core::PriceSeries;
use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// A provider of daily adjusted-close price series.
///
/// Contract: the returned series is ordered, covers only the configured date
/// range, and its values are dividend/split-adjusted closes. Any failure to
/// deliver a usable series is a [`PipelineError::DataFetch`], which aborts
/// the run.
pub trait DataSource {
    /// Fetch the series described by the configuration.
    fn fetch(&self, config: &PipelineConfig) -> Result<PriceSeries>;
}

/// CSV-backed data source.
///
/// Reads a provider export with a header row, a date column and an adjusted
/// close column. Column names are matched case-insensitively ("date",
/// "adj_close", "adj close", "adjusted close", falling back to "close"), the
/// layout the usual daily-bar exports use.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    /// Create a source reading from `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for CsvSource {
    fn fetch(&self, config: &PipelineConfig) -> Result<PriceSeries> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            PipelineError::DataFetch(format!("cannot open {}: {e}", self.path.display()))
        })?;

        let headers = reader
            .headers()
            .map_err(|e| PipelineError::DataFetch(format!("unreadable header: {e}")))?
            .clone();

        let date_col = find_column(&headers, &["date", "timestamp", "time"]).ok_or_else(|| {
            PipelineError::DataFetch("no date column found in input".to_string())
        })?;
        let price_col = find_column(
            &headers,
            &["adj_close", "adj close", "adjusted close", "adjclose", "close"],
        )
        .ok_or_else(|| {
            PipelineError::DataFetch("no adjusted close column found in input".to_string())
        })?;

        let mut dates = Vec::new();
        let mut values = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| PipelineError::DataFetch(format!("bad csv record: {e}")))?;
            let date_field = record.get(date_col).unwrap_or_default();
            let date = parse_date(date_field).ok_or_else(|| {
                PipelineError::DataFetch(format!("unparseable date '{date_field}'"))
            })?;
            if date < config.start_date || date > config.end_date {
                continue;
            }
            let price_field = record.get(price_col).unwrap_or_default();
            let value: f64 = price_field.parse().map_err(|_| {
                PipelineError::DataFetch(format!("unparseable price '{price_field}' on {date}"))
            })?;
            dates.push(date);
            values.push(value);
        }

        if dates.is_empty() {
            return Err(PipelineError::DataFetch(format!(
                "no rows for {} in {}..{}",
                config.ticker, config.start_date, config.end_date
            )));
        }

        PriceSeries::new(dates, values)
            .map_err(|e| PipelineError::DataFetch(format!("malformed series: {e}")))
    }
}

/// In-memory data source, for tests and pre-loaded series.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    series: PriceSeries,
}

impl InMemorySource {
    /// Wrap an already-built series.
    pub fn new(series: PriceSeries) -> Self {
        Self { series }
    }
}

impl DataSource for InMemorySource {
    fn fetch(&self, config: &PipelineConfig) -> Result<PriceSeries> {
        let in_range: Vec<(NaiveDate, f64)> = self
            .series
            .dates()
            .iter()
            .zip(self.series.values().iter())
            .filter(|(d, _)| **d >= config.start_date && **d <= config.end_date)
            .map(|(d, v)| (*d, *v))
            .collect();

        if in_range.is_empty() {
            return Err(PipelineError::DataFetch(format!(
                "no observations in {}..{}",
                config.start_date, config.end_date
            )));
        }

        let (dates, values) = in_range.into_iter().unzip();
        PriceSeries::new(dates, values)
            .map_err(|e| PipelineError::DataFetch(format!("malformed series: {e}")))
    }
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    for candidate in candidates {
        for (i, header) in headers.iter().enumerate() {
            if header.trim().to_lowercase() == *candidate {
                return Some(i);
            }
        }
    }
    None
}

fn parse_date(field: &str) -> Option<NaiveDate> {
    let field = field.trim();
    NaiveDate::parse_from_str(field, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(field, "%m/%d/%Y"))
        .ok()
}
