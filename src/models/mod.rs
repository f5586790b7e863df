//! The model estimation bank: the forecaster interface, the tagged model
//! specifications, and the enumerated bank the pipeline fits.

pub mod arima;
pub mod baseline;
mod boxcox_arima;
pub mod exponential;
mod stl_ets;

pub use boxcox_arima::BoxCoxArima;
pub use stl_ets::StlEts;

use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, Result};
use crate::transform::BoxCoxTransform;
use self::arima::{Arima, AutoArima};
use self::baseline::{Drift, HistoricalMean, Naive};
use self::exponential::{AutoEts, Ets, EtsSpec, HoltLinear, HoltWinters};
use serde::{Deserialize, Serialize};

/// Common interface for every model in the bank.
///
/// A forecaster is bound to exactly one training series by `fit` and is not
/// refitted afterwards; `forecast` always reports on the price scale.
pub trait Forecaster {
    /// Fit the model to a training series.
    fn fit(&mut self, series: &PriceSeries) -> Result<()>;

    /// H-step-ahead point forecast with intervals at the given level.
    fn forecast(&self, horizon: usize, level: f64) -> Result<ForecastResult>;

    /// In-sample residuals, once fitted. Leading entries may be NaN where
    /// the model has no one-step prediction.
    fn residuals(&self) -> Option<&[f64]>;

    /// Estimated parameters as labeled values, for the snapshot.
    fn params(&self) -> Vec<(String, f64)>;

    /// Display name, e.g. `ARIMA(1,1,2)`.
    fn name(&self) -> String;

    /// Number of fitted parameters, for diagnostic degrees of freedom.
    fn num_params(&self) -> usize {
        self.params().len()
    }
}

/// Boxed forecaster trait object.
pub type BoxedForecaster = Box<dyn Forecaster>;

/// ARIMA-family specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArimaModelSpec {
    /// Automatic stepwise order selection.
    Auto,
    /// Automatic selection with the seasonal component enabled.
    SeasonalAuto,
    /// A fixed (p, d, q) order.
    Fixed { p: usize, d: usize, q: usize },
    /// A fixed order fitted on the Box-Cox-transformed series.
    BoxCox { p: usize, d: usize, q: usize },
}

/// Exponential-smoothing-family specification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EtsModelSpec {
    /// Automatic AICc selection.
    Auto,
    /// A fixed constrained specification.
    Fixed(EtsSpec),
    /// STL decomposition with ETS on the deseasonalized series.
    SeasonalDecomposition,
}

/// Benchmark-family specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenchmarkSpec {
    /// Last observed value.
    Naive,
    /// Line through the first and last observation.
    Drift,
    /// Holt's linear trend.
    HoltLinear,
    /// Additive Holt-Winters.
    HoltWinters,
    /// Historical mean.
    HistoricalMean,
}

/// Tagged model specification, one per bank entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModelSpec {
    /// ARIMA family.
    Arima(ArimaModelSpec),
    /// Exponential smoothing family.
    Ets(EtsModelSpec),
    /// Benchmark family.
    Benchmark(BenchmarkSpec),
}

/// Everything a specification needs to instantiate its forecaster.
#[derive(Debug, Clone)]
pub struct BankContext {
    /// Seasonal period for the seasonal specifications.
    pub seasonal_period: usize,
    /// The run's fitted power transform, when available.
    pub boxcox: Option<BoxCoxTransform>,
}

impl ModelSpec {
    /// Stable identifier used in the accuracy table and the snapshot.
    pub fn id(&self) -> String {
        match self {
            Self::Arima(ArimaModelSpec::Auto) => "AutoARIMA".to_string(),
            Self::Arima(ArimaModelSpec::SeasonalAuto) => "SeasonalAutoARIMA".to_string(),
            Self::Arima(ArimaModelSpec::Fixed { p, d, q }) => format!("ARIMA({p},{d},{q})"),
            Self::Arima(ArimaModelSpec::BoxCox { p, d, q }) => {
                format!("BoxCox-ARIMA({p},{d},{q})")
            }
            Self::Ets(EtsModelSpec::Auto) => "AutoETS".to_string(),
            Self::Ets(EtsModelSpec::Fixed(spec)) => spec.short_name(),
            Self::Ets(EtsModelSpec::SeasonalDecomposition) => "STL-ETS".to_string(),
            Self::Benchmark(BenchmarkSpec::Naive) => "Naive".to_string(),
            Self::Benchmark(BenchmarkSpec::Drift) => "Drift".to_string(),
            Self::Benchmark(BenchmarkSpec::HoltLinear) => "Holt".to_string(),
            Self::Benchmark(BenchmarkSpec::HoltWinters) => "HoltWinters".to_string(),
            Self::Benchmark(BenchmarkSpec::HistoricalMean) => "Mean".to_string(),
        }
    }

    /// Instantiate an unfitted forecaster for this specification.
    ///
    /// Fails only for the Box-Cox entry when the run has no usable
    /// transform; every other specification always constructs.
    pub fn build(&self, context: &BankContext) -> Result<BoxedForecaster> {
        let model: BoxedForecaster = match *self {
            Self::Arima(ArimaModelSpec::Auto) => Box::new(AutoArima::new()),
            Self::Arima(ArimaModelSpec::SeasonalAuto) => {
                Box::new(AutoArima::seasonal(context.seasonal_period))
            }
            Self::Arima(ArimaModelSpec::Fixed { p, d, q }) => Box::new(Arima::new(p, d, q)),
            Self::Arima(ArimaModelSpec::BoxCox { p, d, q }) => {
                let transform = context.boxcox.ok_or_else(|| {
                    PipelineError::Transform("power transform unavailable".to_string())
                })?;
                Box::new(BoxCoxArima::new(transform, p, d, q))
            }
            Self::Ets(EtsModelSpec::Auto) => Box::new(AutoEts::new()),
            Self::Ets(EtsModelSpec::Fixed(spec)) => Box::new(Ets::new(spec, 1)),
            Self::Ets(EtsModelSpec::SeasonalDecomposition) => {
                Box::new(StlEts::new(context.seasonal_period))
            }
            Self::Benchmark(BenchmarkSpec::Naive) => Box::new(Naive::new()),
            Self::Benchmark(BenchmarkSpec::Drift) => Box::new(Drift::new()),
            Self::Benchmark(BenchmarkSpec::HoltLinear) => Box::new(HoltLinear::new()),
            Self::Benchmark(BenchmarkSpec::HoltWinters) => {
                Box::new(HoltWinters::new(context.seasonal_period))
            }
            Self::Benchmark(BenchmarkSpec::HistoricalMean) => Box::new(HistoricalMean::new()),
        };
        Ok(model)
    }
}

/// The enumerated model bank, in evaluation order.
///
/// Fifteen entries: automatic, fixed, seasonal, and transformed ARIMA
/// variants; automatic and constrained ETS plus the decomposition hybrid;
/// and the benchmark set. The fixed ARIMA orders come from ACF/PACF
/// inspection of the differenced log price series.
pub fn model_bank() -> Vec<ModelSpec> {
    vec![
        ModelSpec::Arima(ArimaModelSpec::Auto),
        ModelSpec::Arima(ArimaModelSpec::Fixed { p: 0, d: 1, q: 1 }),
        ModelSpec::Arima(ArimaModelSpec::Fixed { p: 1, d: 1, q: 2 }),
        ModelSpec::Arima(ArimaModelSpec::Fixed { p: 2, d: 1, q: 2 }),
        ModelSpec::Arima(ArimaModelSpec::SeasonalAuto),
        ModelSpec::Arima(ArimaModelSpec::BoxCox { p: 1, d: 1, q: 1 }),
        ModelSpec::Ets(EtsModelSpec::Auto),
        ModelSpec::Ets(EtsModelSpec::Fixed(EtsSpec::aan())),
        ModelSpec::Ets(EtsModelSpec::Fixed(EtsSpec::ann())),
        ModelSpec::Ets(EtsModelSpec::SeasonalDecomposition),
        ModelSpec::Benchmark(BenchmarkSpec::Naive),
        ModelSpec::Benchmark(BenchmarkSpec::Drift),
        ModelSpec::Benchmark(BenchmarkSpec::HoltLinear),
        ModelSpec::Benchmark(BenchmarkSpec::HoltWinters),
        ModelSpec::Benchmark(BenchmarkSpec::HistoricalMean),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_series(n: usize) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..n)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect();
        let values = (0..n)
            .map(|i| 50.0 + 0.3 * i as f64 + (i as f64 * 0.7).sin())
            .collect();
        PriceSeries::new(dates, values).unwrap()
    }

    fn context() -> BankContext {
        BankContext {
            seasonal_period: 12,
            boxcox: Some(BoxCoxTransform::with_lambda(0.0)),
        }
    }

    #[test]
    fn bank_enumerates_fifteen_models() {
        let bank = model_bank();
        assert_eq!(bank.len(), 15);

        // Identifiers are unique.
        let mut ids: Vec<String> = bank.iter().map(|s| s.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 15);
    }

    #[test]
    fn every_spec_builds_with_a_transform_available() {
        let ctx = context();
        for spec in model_bank() {
            assert!(spec.build(&ctx).is_ok(), "{} failed to build", spec.id());
        }
    }

    #[test]
    fn boxcox_spec_requires_the_transform() {
        let ctx = BankContext {
            seasonal_period: 12,
            boxcox: None,
        };
        let spec = ModelSpec::Arima(ArimaModelSpec::BoxCox { p: 1, d: 1, q: 1 });
        assert!(matches!(
            spec.build(&ctx),
            Err(PipelineError::Transform(_))
        ));

        // Everything else still builds.
        for spec in model_bank() {
            if !matches!(spec, ModelSpec::Arima(ArimaModelSpec::BoxCox { .. })) {
                assert!(spec.build(&ctx).is_ok());
            }
        }
    }

    #[test]
    fn built_models_are_independent_instances() {
        let ctx = context();
        let spec = ModelSpec::Benchmark(BenchmarkSpec::Naive);
        let series = make_series(30);

        let mut first = spec.build(&ctx).unwrap();
        let second = spec.build(&ctx).unwrap();
        first.fit(&series).unwrap();

        assert!(first.residuals().is_some());
        assert!(second.residuals().is_none());
    }

    #[test]
    fn bank_fits_and_forecasts_on_a_plain_series() {
        let ctx = context();
        let series = make_series(80);
        let mut fitted = 0;

        for spec in model_bank() {
            let mut model = spec.build(&ctx).unwrap();
            if model.fit(&series).is_ok() {
                let forecast = model.forecast(6, 0.95).unwrap();
                assert_eq!(forecast.horizon(), 6, "{}", spec.id());
                fitted += 1;
            }
        }
        // All fifteen models can handle 80 points with period 12.
        assert_eq!(fitted, 15);
    }

    #[test]
    fn ids_match_the_reported_names_for_fixed_specs() {
        let ctx = context();
        let spec = ModelSpec::Arima(ArimaModelSpec::Fixed { p: 1, d: 1, q: 2 });
        let model = spec.build(&ctx).unwrap();
        assert_eq!(spec.id(), model.name());

        let spec = ModelSpec::Ets(EtsModelSpec::Fixed(EtsSpec::ann()));
        let model = spec.build(&ctx).unwrap();
        assert_eq!(spec.id(), model.name());
    }
}
