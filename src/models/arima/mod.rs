//! ARIMA model family.

mod auto;
pub mod diff;
mod model;

pub use auto::{AutoArima, AutoArimaOptions};
pub use model::{Arima, ArimaOrder, SeasonalOrder};
