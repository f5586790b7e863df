//! End-to-end pipeline scenarios on synthetic series.

use boxjenkins::config::PipelineConfig;
use boxjenkins::core::PriceSeries;
use boxjenkins::error::PipelineWarning;
use boxjenkins::ingest::{DataSource, InMemorySource};
use boxjenkins::models::model_bank;
use boxjenkins::pipeline::Pipeline;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

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

/// Synthetic price-like series: positive, trending, seasonal, noisy.
fn synthetic_prices(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            100.0
                + 0.6 * i as f64
                + 6.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
                + rng.gen_range(-2.0..2.0)
        })
        .collect()
}

#[test]
fn hundred_point_run_fills_the_accuracy_table() {
    let pipeline = Pipeline::new(test_config()).unwrap();
    let report = pipeline
        .run_on_series(make_series(synthetic_prices(100, 7)))
        .unwrap();

    // Every enumerated model survives and is scored.
    assert_eq!(report.records.len(), model_bank().len());
    assert_eq!(report.accuracy.len(), model_bank().len());

    for record in &report.records {
        assert_eq!(record.forecast.horizon(), 12, "{}", record.id);
        assert!(record.metrics.mae.is_finite());
        assert!(record.metrics.rmse.is_finite());
        assert!(record.metrics.mape.is_some(), "{} lost MAPE", record.id);
        assert!(record.metrics.mase.is_some(), "{} lost MASE", record.id);
        assert!(record.metrics.theils_u.is_finite());
    }
}

#[test]
fn split_arithmetic_holds_for_any_length() {
    for n in [40, 77, 100, 250] {
        let pipeline = Pipeline::new(test_config()).unwrap();
        let report = pipeline
            .run_on_series(make_series(synthetic_prices(n, 11)))
            .unwrap();
        assert_eq!(report.train_len + report.test_len, n);
        assert_eq!(report.test_len, 12);
    }
}

#[test]
fn non_positive_value_drops_only_the_boxcox_family() {
    let mut values = synthetic_prices(100, 3);
    values[10] = -5.0; // corrupt one training observation

    let pipeline = Pipeline::new(test_config()).unwrap();
    let report = pipeline.run_on_series(make_series(values)).unwrap();

    // The transform-dependent model is gone...
    assert!(report.boxcox.is_none());
    assert!(report.record("BoxCox-ARIMA(1,1,1)").is_none());
    assert!(!report
        .accuracy
        .iter()
        .any(|row| row.model.starts_with("BoxCox")));

    // ...with the failure on record...
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, PipelineWarning::TransformUnavailable { .. })));
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        PipelineWarning::ModelDropped { model, .. } if model.starts_with("BoxCox")
    )));

    // ...and every other family still present.
    assert_eq!(report.records.len(), model_bank().len() - 1);
}

#[test]
fn drift_is_exact_on_a_perfectly_linear_series() {
    let values: Vec<f64> = (0..100).map(|i| 50.0 + 1.25 * i as f64).collect();

    let pipeline = Pipeline::new(test_config()).unwrap();
    let report = pipeline.run_on_series(make_series(values)).unwrap();

    let drift = report.record("Drift").expect("drift model present");
    assert!(
        drift.metrics.mae < 1e-8,
        "drift MAE on a linear series was {}",
        drift.metrics.mae
    );
    assert!(drift.metrics.theils_u < 1e-8);
}

#[test]
fn stationarity_stage_is_never_silently_inconsistent() {
    for seed in [1, 2, 3] {
        let pipeline = Pipeline::new(test_config()).unwrap();
        let report = pipeline
            .run_on_series(make_series(synthetic_prices(150, seed)))
            .unwrap();

        let agreed = report
            .stationarity
            .rounds
            .last()
            .map(|r| r.adf.is_stationary && r.kpss.is_stationary)
            .unwrap_or(false);
        let warned = report
            .warnings
            .iter()
            .any(|w| matches!(w, PipelineWarning::NonStationaryAfterMaxDiff { .. }));
        assert!(
            agreed != warned,
            "either the tests agree or the warning is raised, never both or neither"
        );
    }
}

#[test]
fn forecasts_are_on_the_price_scale() {
    let pipeline = Pipeline::new(test_config()).unwrap();
    let report = pipeline
        .run_on_series(make_series(synthetic_prices(120, 5)))
        .unwrap();

    // Synthetic prices live in [90, 200]; a forecast on a transformed scale
    // would be far outside this band.
    for record in &report.records {
        for &p in record.forecast.point() {
            assert!(
                (50.0..400.0).contains(&p),
                "{} forecast {} not on the price scale",
                record.id,
                p
            );
        }
    }
}

#[test]
fn every_record_reports_diagnostics_where_computable() {
    let pipeline = Pipeline::new(test_config()).unwrap();
    let report = pipeline
        .run_on_series(make_series(synthetic_prices(120, 9)))
        .unwrap();

    for record in &report.records {
        let lb = record
            .diagnostics
            .ljung_box
            .as_ref()
            .unwrap_or_else(|| panic!("{} missing Ljung-Box", record.id));
        assert!((0.0..=1.0).contains(&lb.p_value));
        let jb = record
            .diagnostics
            .normality
            .as_ref()
            .unwrap_or_else(|| panic!("{} missing normality test", record.id));
        assert!((0.0..=1.0).contains(&jb.p_value));
    }
}

#[test]
fn pipeline_runs_through_a_data_source() {
    let series = make_series(synthetic_prices(100, 13));
    let source = InMemorySource::new(series);

    let pipeline = Pipeline::new(test_config()).unwrap();
    let report = pipeline.run(&source).unwrap();
    assert!(!report.accuracy.is_empty());

    // The source honors the configured range.
    let narrow = test_config().with_range(
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
    );
    let fetched = source.fetch(&narrow);
    assert!(fetched.is_err());
}

#[test]
fn snapshot_round_trips_the_full_report() {
    let pipeline = Pipeline::new(test_config()).unwrap();
    let report = pipeline
        .run_on_series(make_series(synthetic_prices(100, 21)))
        .unwrap();

    let file = tempfile::NamedTempFile::new().unwrap();
    report.save(file.path()).unwrap();
    let loaded = boxjenkins::pipeline::PipelineReport::load(file.path()).unwrap();

    assert_eq!(loaded.records.len(), report.records.len());
    for (a, b) in loaded.accuracy.iter().zip(report.accuracy.iter()) {
        assert_eq!(a.rank, b.rank);
        assert_eq!(a.model, b.model);
        assert_eq!(a.metrics, b.metrics);
    }
    assert_eq!(loaded.stationarity.selected_order, report.stationarity.selected_order);
}
