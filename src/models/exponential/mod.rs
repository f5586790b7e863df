//! Exponential smoothing model family.

mod auto;
mod ets;
mod holt;
mod holt_winters;

pub use auto::AutoEts;
pub use ets::{Ets, EtsSpec, SeasonalComponent, TrendComponent};
pub use holt::HoltLinear;
pub use holt_winters::HoltWinters;
