//! Core data structures of the pipeline.

mod forecast;
mod series;

pub use forecast::ForecastResult;
pub use series::{PriceSeries, TrainTestSplit};
