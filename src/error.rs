//! Error and warning types for the forecasting pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur during a pipeline run.
///
/// Only `DataFetch` (and I/O failures around the snapshot) abort a whole run;
/// everything else is caught at the stage that produced it and either
/// propagated to the caller of that stage or downgraded to a
/// [`PipelineWarning`] on the run report.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The data source could not deliver a usable series.
    #[error("data fetch failed: {0}")]
    DataFetch(String),

    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Power-transform estimation failed (non-positive values).
    #[error("power transform failed: {0}")]
    Transform(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before forecasting")]
    FitRequired,

    /// Numerical failure during estimation or forecasting.
    #[error("computation error: {0}")]
    Computation(String),

    /// Filesystem error while reading input or writing the snapshot.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error.
    #[error("snapshot serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Malformed CSV input.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Non-fatal conditions recorded on the run report.
///
/// Warnings never abort the run; they explain why a model, transform, or
/// diagnostic is missing from the final tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineWarning {
    /// The differencing limit was reached without both unit-root tests
    /// agreeing on stationarity.
    NonStationaryAfterMaxDiff { order: usize },
    /// A model failed to fit or forecast and was excluded from the bank.
    ModelDropped { model: String, reason: String },
    /// The power transform could not be estimated; the transform-dependent
    /// model family is unavailable.
    TransformUnavailable { reason: String },
    /// A residual test could not be computed for a model.
    DiagnosticUnavailable { model: String, test: String },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonStationaryAfterMaxDiff { order } => write!(
                f,
                "series still non-stationary after {order} rounds of differencing"
            ),
            Self::ModelDropped { model, reason } => {
                write!(f, "model {model} dropped: {reason}")
            }
            Self::TransformUnavailable { reason } => {
                write!(f, "power transform unavailable: {reason}")
            }
            Self::DiagnosticUnavailable { model, test } => {
                write!(f, "{test} not computable for {model}")
            }
        }
    }
}
