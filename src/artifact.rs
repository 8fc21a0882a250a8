//! Trained model artifact: the immutable bundle of forecaster, interval
//! estimator, and paired scalers
//!
//! An artifact is produced by one offline training run and served read-only.
//! The scalers are part of the model's identity; loading weights without
//! their paired scalers is not possible through this interface. Retraining
//! builds a new artifact which replaces the old one via [`ArtifactSlot`]
//! without restarting the process.

use crate::data::{Forecast, HistoricalRecord};
use crate::error::{ForecastError, Result};
use crate::metrics::{create_metrics_report, MetricsReport};
use crate::model::{
    ForecastConfig, IntervalEstimator, IntervalPolicy, LstmForecaster, TrainingHistory,
};
use crate::preprocessing::{build_dataset, make_features, validate, MinMaxScaler, FEATURE_NAMES};
use chrono::Utc;
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// On-disk layout version
pub const SCHEMA_VERSION: u32 = 1;

const FORECASTER_FILE: &str = "forecaster.bin";
const INTERVALS_FILE: &str = "intervals.bin";
const SCALER_X_FILE: &str = "scaler_x.bin";
const SCALER_Y_FILE: &str = "scaler_y.bin";
const MANIFEST_FILE: &str = "manifest.json";

/// Artifact manifest, stored as JSON next to the binary components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub schema_version: u32,
    pub created_at: String,
    pub feature_names: Vec<String>,
    pub n_features: usize,
}

/// Immutable bundle of everything one trained model needs to serve
#[derive(Debug)]
pub struct ModelArtifact {
    forecaster: LstmForecaster,
    intervals: IntervalEstimator,
    feature_scaler: MinMaxScaler,
    target_scaler: MinMaxScaler,
    interval_policy: IntervalPolicy,
    meta: ArtifactMeta,
}

impl ModelArtifact {
    /// Run the full offline training flow on cleaned historical records.
    ///
    /// Features are built and scaled, the point forecaster is fit on the
    /// scaled data, and the interval estimator is fit on the forecaster's
    /// training residuals in original units.
    pub fn train(
        records: &[HistoricalRecord],
        config: &ForecastConfig,
    ) -> Result<(Self, TrainingHistory)> {
        if records.is_empty() {
            return Err(ForecastError::InsufficientData(
                "no historical records to train on".to_string(),
            ));
        }

        let (x, y) = build_dataset(records);

        let mut feature_scaler = MinMaxScaler::new();
        feature_scaler.fit(&x)?;
        let mut target_scaler = MinMaxScaler::new();
        target_scaler.fit(&y.view().insert_axis(Axis(1)).to_owned())?;

        let x_scaled = feature_scaler.transform(&x)?;
        let y_scaled = target_scaler.transform_1d(&y)?;

        let mut forecaster = LstmForecaster::from_config(config.lstm.clone());
        let history = forecaster.fit(
            &x_scaled,
            &y_scaled,
            config.epochs,
            config.batch_size,
            config.validation_split,
        )?;

        // Residuals in original units against the full training set
        let points_scaled = forecaster.predict(&x_scaled)?;
        let points = target_scaler.inverse_transform_1d(&points_scaled)?;
        let residuals = &y - &points;

        let mut intervals = IntervalEstimator::new(config.svr.clone());
        intervals.fit(&x_scaled, &residuals)?;

        info!(
            rows = records.len(),
            final_loss = history.final_loss(),
            "model artifact trained"
        );

        let artifact = Self {
            forecaster,
            intervals,
            feature_scaler,
            target_scaler,
            interval_policy: config.interval_policy,
            meta: ArtifactMeta {
                schema_version: SCHEMA_VERSION,
                created_at: Utc::now().to_rfc3339(),
                feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                n_features: x.ncols(),
            },
        };

        Ok((artifact, history))
    }

    pub fn meta(&self) -> &ArtifactMeta {
        &self.meta
    }

    /// Forecast a single (temperature, hour, date) input.
    ///
    /// Validation failures stop the pipeline before any scaling or model
    /// computation. An inverted interval is logged, flagged on the result,
    /// and resolved according to the configured policy.
    pub fn predict_single(&self, temperature: f64, hour: u32, date: &str) -> Result<Forecast> {
        let errors = validate(temperature, hour, date);
        if !errors.is_empty() {
            return Err(ForecastError::Validation(errors));
        }

        let features = make_features(temperature, hour, date)?;
        let x_scaled = self.feature_scaler.transform(&features.to_matrix())?;

        let point_scaled = self.forecaster.predict(&x_scaled)?;
        let point = self.target_scaler.inverse_transform_1d(&point_scaled)?[0];

        let points = Array1::from_elem(1, point);
        let (lower, upper) = self.intervals.predict_intervals(&x_scaled, &points)?;

        let (lower, upper, inverted) =
            resolve_interval(point, lower[0], upper[0], self.interval_policy);
        if inverted {
            warn!(
                point,
                lower, upper, "interval estimator produced lower > upper"
            );
        }

        Ok(Forecast {
            predicted_load: point,
            lower_bound: lower,
            upper_bound: upper,
            interval_inverted: inverted,
        })
    }

    /// Batch forecast over cleaned records; returns (points, lower, upper)
    pub fn predict_batch(
        &self,
        records: &[HistoricalRecord],
    ) -> Result<(Array1<f64>, Array1<f64>, Array1<f64>)> {
        let (x, _) = build_dataset(records);
        let x_scaled = self.feature_scaler.transform(&x)?;

        let points_scaled = self.forecaster.predict(&x_scaled)?;
        let points = self.target_scaler.inverse_transform_1d(&points_scaled)?;
        let (lower, upper) = self.intervals.predict_intervals(&x_scaled, &points)?;

        Ok((points, lower, upper))
    }

    /// Offline validation: point and interval metrics against the records'
    /// observed loads
    pub fn evaluate_records(&self, records: &[HistoricalRecord]) -> Result<MetricsReport> {
        if records.is_empty() {
            return Err(ForecastError::InsufficientData(
                "no records to evaluate".to_string(),
            ));
        }

        let (points, lower, upper) = self.predict_batch(records)?;
        let y_true = Array1::from_iter(records.iter().map(|r| r.load));

        Ok(create_metrics_report(
            &y_true,
            &points,
            Some(&lower),
            Some(&upper),
        ))
    }

    /// Persist all components to a directory: forecaster weights, interval
    /// bundle, both scalers, and a JSON manifest.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        fs::write(dir.join(FORECASTER_FILE), bincode::serialize(&self.forecaster)?)?;
        fs::write(dir.join(INTERVALS_FILE), bincode::serialize(&self.intervals)?)?;
        fs::write(dir.join(SCALER_X_FILE), bincode::serialize(&self.feature_scaler)?)?;
        fs::write(dir.join(SCALER_Y_FILE), bincode::serialize(&self.target_scaler)?)?;
        fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&self.meta)?)?;

        info!(dir = %dir.display(), "model artifact saved");
        Ok(())
    }

    /// Load a bundle, failing fast when the components do not fit together.
    ///
    /// Every dimensionality check happens here, at startup, never at first
    /// prediction.
    pub fn load<P: AsRef<Path>>(dir: P, interval_policy: IntervalPolicy) -> Result<Self> {
        let dir = dir.as_ref();

        let meta: ArtifactMeta = serde_json::from_slice(&fs::read(dir.join(MANIFEST_FILE))?)?;
        if meta.schema_version != SCHEMA_VERSION {
            return Err(ForecastError::ArtifactMismatch(format!(
                "schema version {} (expected {})",
                meta.schema_version, SCHEMA_VERSION
            )));
        }

        let forecaster: LstmForecaster =
            bincode::deserialize(&fs::read(dir.join(FORECASTER_FILE))?)?;
        let intervals: IntervalEstimator =
            bincode::deserialize(&fs::read(dir.join(INTERVALS_FILE))?)?;
        let feature_scaler: MinMaxScaler =
            bincode::deserialize(&fs::read(dir.join(SCALER_X_FILE))?)?;
        let target_scaler: MinMaxScaler =
            bincode::deserialize(&fs::read(dir.join(SCALER_Y_FILE))?)?;

        let expected = forecaster.input_size();
        match feature_scaler.n_columns() {
            Some(cols) if cols == expected => {}
            cols => {
                return Err(ForecastError::ArtifactMismatch(format!(
                    "feature scaler covers {cols:?} columns, forecaster expects {expected}"
                )))
            }
        }
        match target_scaler.n_columns() {
            Some(1) => {}
            cols => {
                return Err(ForecastError::ArtifactMismatch(format!(
                    "target scaler covers {cols:?} columns, expected 1"
                )))
            }
        }
        match intervals.n_features() {
            Some(cols) if cols == expected => {}
            cols => {
                return Err(ForecastError::ArtifactMismatch(format!(
                    "interval estimator was fit on {cols:?} features, forecaster expects {expected}"
                )))
            }
        }
        if meta.n_features != expected {
            return Err(ForecastError::ArtifactMismatch(format!(
                "manifest declares {} features, forecaster expects {expected}",
                meta.n_features
            )));
        }

        info!(dir = %dir.display(), created_at = %meta.created_at, "model artifact loaded");

        Ok(Self {
            forecaster,
            intervals,
            feature_scaler,
            target_scaler,
            interval_policy,
            meta,
        })
    }
}

/// Resolve the reported interval values for one prediction.
///
/// The inversion flag is always surfaced; the policy only decides what
/// values accompany it.
fn resolve_interval(
    point: f64,
    lower: f64,
    upper: f64,
    policy: IntervalPolicy,
) -> (f64, f64, bool) {
    if lower <= upper {
        return (lower, upper, false);
    }
    match policy {
        IntervalPolicy::Flag => (lower, upper, true),
        IntervalPolicy::Clamp => (point, point, true),
    }
}

/// Shared handle to the currently served artifact.
///
/// Readers take a cheap clone of the inner [`Arc`]; a finished retraining
/// run swaps the new artifact in without interrupting in-flight
/// predictions or restarting the process.
#[derive(Debug)]
pub struct ArtifactSlot {
    inner: RwLock<Arc<ModelArtifact>>,
}

impl ArtifactSlot {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self {
            inner: RwLock::new(Arc::new(artifact)),
        }
    }

    /// Current artifact for serving
    pub fn current(&self) -> Arc<ModelArtifact> {
        self.inner.read().expect("artifact slot poisoned").clone()
    }

    /// Atomically replace the served artifact
    pub fn swap(&self, artifact: ModelArtifact) {
        let mut guard = self.inner.write().expect("artifact slot poisoned");
        *guard = Arc::new(artifact);
    }
}
