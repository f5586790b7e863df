//! # boxjenkins
//!
//! Box-Jenkins forecasting pipeline for a daily equity price series.
//!
//! The pipeline stabilizes variance with a Box-Cox transform, assesses
//! stationarity with paired ADF/KPSS tests, characterizes trend and
//! seasonality, fits a bank of ARIMA/ETS/benchmark models on a training
//! prefix, runs residual diagnostics, forecasts the held-out window, ranks
//! models by accuracy, and serializes every artifact into one snapshot.
//!
//! ```no_run
//! use boxjenkins::config::PipelineConfig;
//! use boxjenkins::ingest::CsvSource;
//! use boxjenkins::pipeline::Pipeline;
//!
//! # fn main() -> boxjenkins::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let report = pipeline.run(&CsvSource::new("aapl.csv"))?;
//! for row in &report.accuracy {
//!     println!("{:>2}. {:<22} rmse={:.3}", row.rank, row.model, row.metrics.rmse);
//! }
//! report.save("snapshot.json")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod seasonality;
pub mod snapshot;
pub mod transform;
pub mod trend;
pub mod utils;
pub mod validation;

pub use error::{PipelineError, PipelineWarning, Result};

pub mod prelude {
    //! Common imports for running the pipeline.
    pub use crate::config::PipelineConfig;
    pub use crate::core::{ForecastResult, PriceSeries};
    pub use crate::error::{PipelineError, PipelineWarning, Result};
    pub use crate::ingest::{CsvSource, DataSource, InMemorySource};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{Pipeline, PipelineReport};
    pub use crate::utils::{eval_metrics, AccuracyMetrics};
}
