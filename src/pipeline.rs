//! The Box-Jenkins pipeline: ten stages from ingestion to the ranked
//! accuracy table.

use crate::config::PipelineConfig;
use crate::core::{ForecastResult, PriceSeries};
use crate::error::{PipelineError, PipelineWarning, Result};
use crate::ingest::DataSource;
use crate::models::baseline::{Drift, HistoricalMean, Naive};
use crate::models::exponential::{Ets, EtsSpec, HoltLinear};
use crate::models::{model_bank, BankContext, ModelSpec};
use crate::seasonality::{Decomposition, StlDecomposer};
use crate::snapshot;
use crate::transform::BoxCoxTransform;
use crate::trend::{linear_trend, TrendSummary};
use crate::utils::cross_validation::{rolling_origin, CvOptions, CvSummary};
use crate::utils::metrics::{eval_metrics, AccuracyMetrics};
use crate::validation::residual_tests::{jarque_bera, ljung_box, ResidualDiagnostics};
use crate::validation::stationarity::{assess_stationarity, StationarityAssessment};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Maximum differencing order tried by the stationarity stage.
const MAX_DIFFERENCING: usize = 2;
/// Interval level used for every forecast.
const INTERVAL_LEVEL: f64 = 0.95;

/// Summary of the variance-stabilization stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxCoxSummary {
    /// Estimated lambda.
    pub lambda: f64,
    /// Whether lambda is within the configured tolerance of zero.
    pub effectively_log: bool,
    /// The lambda-transformed series.
    pub transformed: PriceSeries,
}

/// Everything the pipeline keeps per surviving model: the structured record
/// the evaluation table iterates over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Bank identifier (stable across runs).
    pub id: String,
    /// Resolved model name; differs from `id` for the automatic entries.
    pub name: String,
    /// Estimated parameters, labeled.
    pub params: Vec<(String, f64)>,
    /// Residual diagnostics.
    pub diagnostics: ResidualDiagnostics,
    /// Price-scale forecast over the holdout window.
    pub forecast: ForecastResult,
    /// Accuracy against the shared holdout window.
    pub metrics: AccuracyMetrics,
}

/// One row of the ranked accuracy table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyRow {
    /// 1-based rank by RMSE; ties keep bank order.
    pub rank: usize,
    /// Model identifier.
    pub model: String,
    /// The metric set.
    pub metrics: AccuracyMetrics,
}

/// Rolling-origin cross-validation outcome for one model family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvRow {
    /// Model identifier.
    pub model: String,
    /// Fold-averaged accuracy.
    pub summary: CvSummary,
}

/// The complete artifact set of one run; serialized as the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Configuration of the run.
    pub config: PipelineConfig,
    /// Raw price series as fetched.
    pub raw: PriceSeries,
    /// Log-price series, absent when the input has non-positive values.
    pub log_series: Option<PriceSeries>,
    /// Variance-stabilization summary, absent when estimation failed.
    pub boxcox: Option<BoxCoxSummary>,
    /// Stationarity rounds and the selected differencing order.
    pub stationarity: StationarityAssessment,
    /// Linear trend characterization.
    pub trend: TrendSummary,
    /// STL decomposition, absent for series shorter than two periods.
    pub decomposition: Option<Decomposition>,
    /// Training window length.
    pub train_len: usize,
    /// Holdout window length.
    pub test_len: usize,
    /// Per-model records for every model that survived all stages.
    pub records: Vec<ModelRecord>,
    /// Accuracy table ranked by RMSE.
    pub accuracy: Vec<AccuracyRow>,
    /// Cross-validation rows, when enabled.
    pub cross_validation: Vec<CvRow>,
    /// Non-fatal conditions encountered along the way.
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineReport {
    /// Write the report as a JSON snapshot.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        snapshot::save(self, path)
    }

    /// Load a previously saved snapshot.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        snapshot::load(path)
    }

    /// Look up a record by model identifier.
    pub fn record(&self, id: &str) -> Option<&ModelRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// The pipeline runner.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a runner after validating the configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in effect.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch the series from the source and run every stage.
    pub fn run(&self, source: &dyn DataSource) -> Result<PipelineReport> {
        info!(ticker = %self.config.ticker, "fetching series");
        let series = source.fetch(&self.config)?;
        self.run_on_series(series)
    }

    /// Run every stage on an already-fetched series.
    pub fn run_on_series(&self, series: PriceSeries) -> Result<PipelineReport> {
        let horizon = self.config.horizon;
        if series.len() <= horizon {
            return Err(PipelineError::InsufficientData {
                needed: horizon + 1,
                got: series.len(),
            });
        }
        info!(observations = series.len(), horizon, "starting pipeline");

        let mut warnings: Vec<PipelineWarning> = Vec::new();
        let record_warning = |warnings: &mut Vec<PipelineWarning>, w: PipelineWarning| {
            warn!("{w}");
            warnings.push(w);
        };

        // Stage 2: variance stabilization.
        let boxcox_transform = match BoxCoxTransform::estimate(series.values()) {
            Ok(t) => Some(t),
            Err(e) => {
                record_warning(
                    &mut warnings,
                    PipelineWarning::TransformUnavailable {
                        reason: e.to_string(),
                    },
                );
                None
            }
        };
        let boxcox = match boxcox_transform {
            Some(t) => {
                info!(lambda = t.lambda(), "power transform estimated");
                let transformed = series.with_values(t.transform(series.values()))?;
                Some(BoxCoxSummary {
                    lambda: t.lambda(),
                    effectively_log: t.is_effectively_log(self.config.log_lambda_tolerance),
                    transformed,
                })
            }
            None => None,
        };
        let log_series = series.log().ok();

        // Stage 3: stationarity assessment on the (log) series.
        let analysis_values = log_series
            .as_ref()
            .map_or_else(|| series.values().to_vec(), |s| s.values().to_vec());
        let stationarity = assess_stationarity(&analysis_values, MAX_DIFFERENCING);
        if stationarity.stationary {
            info!(
                order = stationarity.selected_order,
                "both unit-root tests agree stationary"
            );
        } else {
            record_warning(
                &mut warnings,
                PipelineWarning::NonStationaryAfterMaxDiff {
                    order: stationarity.selected_order,
                },
            );
        }

        // Stage 4: trend and seasonal characterization, descriptive only.
        let trend = linear_trend(series.values());
        let decomposition = StlDecomposer::new(self.config.seasonal_period)
            .decompose(series.values());
        if decomposition.is_none() {
            info!(
                period = self.config.seasonal_period,
                "series shorter than two periods, skipping decomposition"
            );
        }

        // Stage 5: train/test split.
        let split = series.split_holdout(horizon)?;
        info!(
            train = split.train.len(),
            test = split.test.len(),
            "split series"
        );

        // Stages 6-9: fit, diagnose, forecast, and score each bank entry.
        let context = BankContext {
            seasonal_period: self.config.seasonal_period,
            boxcox: boxcox_transform,
        };
        let mut records = Vec::new();
        for spec in model_bank() {
            match self.evaluate_model(&spec, &context, &split.train, &split.test, &mut warnings) {
                Some(record) => records.push(record),
                None => continue,
            }
        }
        info!(fitted = records.len(), of = model_bank().len(), "bank evaluated");

        // Stage 9: rank by RMSE; the sort is stable so ties keep bank order.
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| {
            records[a]
                .metrics
                .rmse
                .partial_cmp(&records[b].metrics.rmse)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let accuracy: Vec<AccuracyRow> = order
            .iter()
            .enumerate()
            .map(|(rank, &i)| AccuracyRow {
                rank: rank + 1,
                model: records[i].id.clone(),
                metrics: records[i].metrics.clone(),
            })
            .collect();

        let cross_validation = if self.config.cross_validate {
            self.cross_validate(&split.train)
        } else {
            Vec::new()
        };

        Ok(PipelineReport {
            config: self.config.clone(),
            raw: series,
            log_series,
            boxcox,
            stationarity,
            trend,
            decomposition,
            train_len: split.train.len(),
            test_len: split.test.len(),
            records,
            accuracy,
            cross_validation,
            warnings,
        })
    }

    /// Fit one bank entry and carry it through diagnostics, forecasting and
    /// scoring. Any failure drops the model with a warning and returns None.
    fn evaluate_model(
        &self,
        spec: &ModelSpec,
        context: &BankContext,
        train: &PriceSeries,
        test: &PriceSeries,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Option<ModelRecord> {
        let id = spec.id();
        let drop_model = |warnings: &mut Vec<PipelineWarning>, reason: String| {
            let w = PipelineWarning::ModelDropped {
                model: id.clone(),
                reason,
            };
            warn!("{w}");
            warnings.push(w);
        };

        let mut model = match spec.build(context) {
            Ok(model) => model,
            Err(e) => {
                drop_model(warnings, e.to_string());
                return None;
            }
        };

        if let Err(e) = model.fit(train) {
            drop_model(warnings, e.to_string());
            return None;
        }

        // Diagnostics are informational: a missing test never drops a model.
        let mut diagnostics = ResidualDiagnostics::default();
        match model.residuals() {
            Some(residuals) => {
                diagnostics.ljung_box = ljung_box(residuals, model.num_params());
                if diagnostics.ljung_box.is_none() {
                    warnings.push(PipelineWarning::DiagnosticUnavailable {
                        model: id.clone(),
                        test: "Ljung-Box".to_string(),
                    });
                }
                diagnostics.normality = jarque_bera(residuals);
                if diagnostics.normality.is_none() {
                    warnings.push(PipelineWarning::DiagnosticUnavailable {
                        model: id.clone(),
                        test: "Jarque-Bera".to_string(),
                    });
                }
            }
            None => {
                for test_name in ["Ljung-Box", "Jarque-Bera"] {
                    warnings.push(PipelineWarning::DiagnosticUnavailable {
                        model: id.clone(),
                        test: test_name.to_string(),
                    });
                }
            }
        }

        let forecast = match model.forecast(test.len(), INTERVAL_LEVEL) {
            Ok(f) => f,
            Err(e) => {
                drop_model(warnings, format!("forecast failed: {e}"));
                return None;
            }
        };

        let metrics = match eval_metrics(test.values(), forecast.point(), train.values()) {
            Ok(m) => m,
            Err(e) => {
                drop_model(warnings, format!("scoring failed: {e}"));
                return None;
            }
        };

        info!(model = %id, rmse = metrics.rmse, "model evaluated");
        Some(ModelRecord {
            id,
            name: model.name(),
            params: model.params(),
            diagnostics,
            forecast,
            metrics,
        })
    }

    /// Expanding-window one-step CV for the cheap model families.
    fn cross_validate(&self, train: &PriceSeries) -> Vec<CvRow> {
        let initial = (train.len() * 2 / 3).max(10);
        let options = CvOptions::expanding(initial);
        let mut rows = Vec::new();

        let mut push = |model: &str, result: Result<CvSummary>| {
            if let Ok(summary) = result {
                info!(model, folds = summary.n_folds, mae = summary.mae, "cross-validated");
                rows.push(CvRow {
                    model: model.to_string(),
                    summary,
                });
            }
        };

        push("Naive", rolling_origin(train, &options, Naive::new));
        push("Drift", rolling_origin(train, &options, Drift::new));
        push("Mean", rolling_origin(train, &options, HistoricalMean::new));
        push("Holt", rolling_origin(train, &options, HoltLinear::new));
        push(
            "ETS(A,N,N)",
            rolling_origin(train, &options, || Ets::new(EtsSpec::ann(), 1)),
        );
        push(
            "ETS(A,A,N)",
            rolling_origin(train, &options, || Ets::new(EtsSpec::aan(), 1)),
        );

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_series(values: Vec<f64>) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect();
        PriceSeries::new(dates, values).unwrap()
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig::default()
            .with_horizon(12)
            .with_seasonal_period(12)
    }

    fn trending_seasonal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                100.0
                    + 0.4 * i as f64
                    + 5.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
                    + 1.5 * (i as f64 * 2.3).sin()
            })
            .collect()
    }

    #[test]
    fn full_run_produces_a_complete_report() {
        let pipeline = Pipeline::new(test_config()).unwrap();
        let report = pipeline
            .run_on_series(make_series(trending_seasonal(120)))
            .unwrap();

        assert_eq!(report.train_len + report.test_len, 120);
        assert_eq!(report.test_len, 12);
        assert!(report.boxcox.is_some());
        assert!(report.log_series.is_some());
        assert!(report.decomposition.is_some());
        assert!(!report.records.is_empty());
        assert_eq!(report.accuracy.len(), report.records.len());
    }

    #[test]
    fn accuracy_table_is_ranked_by_rmse() {
        let pipeline = Pipeline::new(test_config()).unwrap();
        let report = pipeline
            .run_on_series(make_series(trending_seasonal(120)))
            .unwrap();

        for pair in report.accuracy.windows(2) {
            assert!(pair[0].metrics.rmse <= pair[1].metrics.rmse);
        }
        for (i, row) in report.accuracy.iter().enumerate() {
            assert_eq!(row.rank, i + 1);
        }
    }

    #[test]
    fn too_short_series_is_fatal() {
        let pipeline = Pipeline::new(test_config()).unwrap();
        let result = pipeline.run_on_series(make_series(vec![1.0; 12]));
        assert!(matches!(
            result,
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn cross_validation_rows_appear_when_enabled() {
        let pipeline = Pipeline::new(test_config().with_cross_validation()).unwrap();
        let report = pipeline
            .run_on_series(make_series(trending_seasonal(100)))
            .unwrap();

        assert!(!report.cross_validation.is_empty());
        for row in &report.cross_validation {
            assert!(row.summary.n_folds > 0);
            assert!(row.summary.mae >= 0.0);
        }
    }

    #[test]
    fn identical_runs_are_deterministic() {
        let values = trending_seasonal(100);
        let pipeline = Pipeline::new(test_config()).unwrap();

        let first = pipeline.run_on_series(make_series(values.clone())).unwrap();
        let second = pipeline.run_on_series(make_series(values)).unwrap();

        assert_eq!(first.records.len(), second.records.len());
        for (a, b) in first.accuracy.iter().zip(second.accuracy.iter()) {
            assert_eq!(a.model, b.model);
            assert_eq!(a.metrics, b.metrics);
        }
    }
}
