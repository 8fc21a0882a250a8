//! End-to-end pipeline tests against the public API

use chrono::{Duration, Local, NaiveDate};
use load_forecast::data::HistoricalRecord;
use load_forecast::model::{ForecastConfig, IntervalPolicy, LstmConfig, SvrConfig};
use load_forecast::{ForecastError, ModelArtifact};

/// 100 days of synthetic history around 500 MW with bounded noise
fn synthetic_records() -> Vec<HistoricalRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    (0..100)
        .map(|i| {
            let noise = ((i * 31 % 13) as f64 - 6.0) / 4.0; // in [-1.5, 1.5]
            let temperature = 18.0 + (i % 5) as f64;
            HistoricalRecord::new(start + Duration::days(i as i64), 500.0 + noise, temperature, 14)
        })
        .collect()
}

fn pipeline_config() -> ForecastConfig {
    ForecastConfig {
        lstm: LstmConfig::new(4).with_lstm_units(16).with_seed(42),
        svr: SvrConfig::default().with_epsilon(2.0),
        epochs: 30,
        batch_size: 16,
        validation_split: 0.2,
        interval_policy: IntervalPolicy::Flag,
    }
}

fn tomorrow() -> String {
    (Local::now() + Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}

#[test]
fn test_train_predict_evaluate() {
    let records = synthetic_records();
    let (artifact, history) = ModelArtifact::train(&records, &pipeline_config()).unwrap();

    // Loss recorded per epoch and trending down overall
    assert_eq!(history.train_loss.len(), 30);
    assert!(history.final_loss().unwrap() < history.train_loss[0]);
    assert!(!history.val_loss.is_empty());

    // Point forecast lands near the level of the series
    let forecast = artifact.predict_single(20.0, 14, &tomorrow()).unwrap();
    assert!(
        (forecast.predicted_load - 500.0).abs() < 50.0,
        "point forecast {} too far from 500",
        forecast.predicted_load
    );
    assert!(forecast.lower_bound < forecast.upper_bound);
    assert!(forecast.interval_width() < 100.0);

    // Evaluation on the training records produces a full report
    let report = artifact.evaluate_records(&records).unwrap();
    assert!(report.rmse < 50.0);
    assert!(report.interval_coverage.is_some());
    assert!(report.interval_width.is_some());

    let map = report.to_map();
    for key in ["rmse", "mae", "r2", "mape", "interval_coverage", "interval_width"] {
        assert!(map.contains_key(key), "missing metric {key}");
    }
}

#[test]
fn test_rejects_invalid_prediction_input() {
    let (artifact, _) = ModelArtifact::train(&synthetic_records(), &pipeline_config()).unwrap();

    // All three fields invalid: every message is collected
    let err = artifact.predict_single(-80.0, 24, "15/06/2027").unwrap_err();
    match err {
        ForecastError::Validation(messages) => {
            assert_eq!(messages.len(), 3);
            assert!(messages.iter().any(|m| m.contains("Temperature")));
            assert!(messages.iter().any(|m| m.contains("Hour")));
            assert!(messages.iter().any(|m| m.contains("date format")));
        }
        other => panic!("expected validation error, got {other}"),
    }

    // A well-formed but past date is rejected
    let err = artifact.predict_single(20.0, 14, "2020-01-01").unwrap_err();
    match err {
        ForecastError::Validation(messages) => {
            assert_eq!(messages, vec!["Date cannot be in the past".to_string()]);
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn test_persisted_artifact_serves_identically() {
    let records = synthetic_records();
    let (artifact, _) = ModelArtifact::train(&records, &pipeline_config()).unwrap();

    let dir = std::env::temp_dir().join(format!("load_forecast_pipeline_{}", std::process::id()));
    artifact.save(&dir).unwrap();
    let loaded = ModelArtifact::load(&dir, IntervalPolicy::Flag).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    let date = tomorrow();
    let before = artifact.predict_single(19.0, 14, &date).unwrap();
    let after = loaded.predict_single(19.0, 14, &date).unwrap();

    assert_eq!(before.predicted_load, after.predicted_load);
    assert_eq!(before.lower_bound, after.lower_bound);
    assert_eq!(before.upper_bound, after.upper_bound);
    assert_eq!(loaded.meta().n_features, 4);
}
