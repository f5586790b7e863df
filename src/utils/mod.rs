//! Shared numeric utilities.

pub mod cross_validation;
pub mod metrics;
pub mod optimization;
pub mod stats;

pub use cross_validation::{rolling_origin, CvOptions, CvSummary};
pub use metrics::{eval_metrics, AccuracyMetrics};
pub use optimization::{minimize, SimplexOptions, SimplexResult};
pub use stats::quantile_normal;
