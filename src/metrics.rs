//! Point-accuracy and interval-quality metrics
//!
//! Pure functions over parallel arrays; nothing here holds mutable state.
//! Numeric degeneracies (zero true values under MAPE, inverted intervals)
//! are collected into the report as anomalies instead of aborting a batch
//! evaluation.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root mean squared error
pub fn calculate_rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;
    mse.sqrt()
}

/// Mean absolute error
pub fn calculate_mae(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Coefficient of determination
pub fn calculate_r2(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let mean = y_true.mean().unwrap_or(0.0);
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_res == 0.0 {
        1.0
    } else if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Mean absolute percentage error.
///
/// Division by zero is deliberately not guarded; the caller guarantees
/// `y_true` contains no zeros, and `create_metrics_report` flags violations
/// as an anomaly instead.
pub fn calculate_mape(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| ((t - p) / t).abs())
        .sum::<f64>()
        / y_true.len() as f64
        * 100.0
}

/// Fraction of true values inside [lower, upper], bounds inclusive
pub fn interval_coverage(
    y_true: &Array1<f64>,
    y_lower: &Array1<f64>,
    y_upper: &Array1<f64>,
) -> f64 {
    let covered = y_true
        .iter()
        .zip(y_lower.iter())
        .zip(y_upper.iter())
        .filter(|((t, l), u)| **l <= **t && **t <= **u)
        .count();
    covered as f64 / y_true.len() as f64
}

/// Mean interval width (upper - lower)
pub fn interval_width(y_lower: &Array1<f64>, y_upper: &Array1<f64>) -> f64 {
    y_lower
        .iter()
        .zip(y_upper.iter())
        .map(|(l, u)| u - l)
        .sum::<f64>()
        / y_lower.len() as f64
}

/// Composed evaluation report.
///
/// Interval fields are present only when both bound arrays were supplied;
/// they are omitted from serialized output rather than null-filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub mape: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_coverage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_width: Option<f64>,
    /// Numeric degeneracies found during evaluation, reported rather than
    /// raised
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub anomalies: Vec<String>,
}

impl MetricsReport {
    /// Metric name to value mapping (anomaly notes excluded)
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("rmse".to_string(), self.rmse);
        map.insert("mae".to_string(), self.mae);
        map.insert("r2".to_string(), self.r2);
        map.insert("mape".to_string(), self.mape);
        if let Some(coverage) = self.interval_coverage {
            map.insert("interval_coverage".to_string(), coverage);
        }
        if let Some(width) = self.interval_width {
            map.insert("interval_width".to_string(), width);
        }
        map
    }
}

/// Compose point metrics with interval metrics when both bound arrays are
/// supplied.
pub fn create_metrics_report(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    y_lower: Option<&Array1<f64>>,
    y_upper: Option<&Array1<f64>>,
) -> MetricsReport {
    let mut anomalies = Vec::new();

    let zero_count = y_true.iter().filter(|&&t| t == 0.0).count();
    if zero_count > 0 {
        anomalies.push(format!(
            "MAPE is undefined: {zero_count} zero value(s) in y_true"
        ));
    }

    let mut report = MetricsReport {
        rmse: calculate_rmse(y_true, y_pred),
        mae: calculate_mae(y_true, y_pred),
        r2: calculate_r2(y_true, y_pred),
        mape: calculate_mape(y_true, y_pred),
        interval_coverage: None,
        interval_width: None,
        anomalies,
    };

    if let (Some(lower), Some(upper)) = (y_lower, y_upper) {
        let inverted = lower
            .iter()
            .zip(upper.iter())
            .filter(|(l, u)| l > u)
            .count();
        if inverted > 0 {
            report.anomalies.push(format!(
                "{inverted} inverted interval(s) with lower > upper"
            ));
        }

        report.interval_coverage = Some(interval_coverage(y_true, lower, upper));
        report.interval_width = Some(interval_width(lower, upper));
    }

    report
}
