//! Calendar and weather feature derivation plus input validation
//!
//! The model consumes exactly four features in a fixed order:
//! Temperature, Hour, Month, Weekday. The scalers are fitted against this
//! order, so it must never change between training and inference.

use crate::data::HistoricalRecord;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Feature column names, in model input order
pub const FEATURE_NAMES: [&str; 4] = ["Temperature", "Hour", "Month", "Weekday"];

/// Number of model input features
pub const N_FEATURES: usize = 4;

/// Valid temperature range in °C
pub const TEMPERATURE_RANGE: (f64, f64) = (-50.0, 60.0);

/// Ordered feature tuple derived from (temperature, hour, date)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Temperature in °C
    pub temperature: f64,
    /// Hour of day, 0-23
    pub hour: u32,
    /// Month, 1-12 (pure function of the date)
    pub month: u32,
    /// Weekday, 0 = Monday .. 6 = Sunday (pure function of the date)
    pub weekday: u32,
}

impl FeatureVector {
    /// Flatten to a row in model input order
    pub fn to_row(&self) -> [f64; N_FEATURES] {
        [
            self.temperature,
            self.hour as f64,
            self.month as f64,
            self.weekday as f64,
        ]
    }

    /// 1 x 4 matrix for single-sample inference
    pub fn to_matrix(&self) -> Array2<f64> {
        Array2::from_shape_vec((1, N_FEATURES), self.to_row().to_vec())
            .expect("fixed shape")
    }
}

/// Derive the feature vector for a single prediction input.
///
/// The date must be an ISO `YYYY-MM-DD` string; a parse failure is reported
/// as a validation error, not a panic.
pub fn make_features(temperature: f64, hour: u32, date: &str) -> Result<FeatureVector> {
    let parsed = parse_date(date)
        .ok_or_else(|| ForecastError::Validation(vec![DATE_FORMAT_MSG.to_string()]))?;

    Ok(FeatureVector {
        temperature,
        hour,
        month: parsed.month(),
        weekday: parsed.weekday().num_days_from_monday(),
    })
}

const TEMPERATURE_MSG: &str = "Temperature must be between -50°C and 60°C";
const TEMPERATURE_NAN_MSG: &str = "Temperature must be a number";
const HOUR_MSG: &str = "Hour must be between 0 and 23";
const DATE_FORMAT_MSG: &str = "Invalid date format (use YYYY-MM-DD)";
const DATE_PAST_MSG: &str = "Date cannot be in the past";

/// Validate a single prediction input, accumulating every failure.
///
/// Returns the list of error messages; an empty list means the input is
/// valid. Rules are independent and never short-circuit.
pub fn validate(temperature: f64, hour: u32, date: &str) -> Vec<String> {
    validate_at(temperature, hour, date, Local::now().naive_local())
}

/// Validation against an explicit "now", for deterministic tests
pub fn validate_at(temperature: f64, hour: u32, date: &str, now: NaiveDateTime) -> Vec<String> {
    let mut errors = Vec::new();

    if !temperature.is_finite() {
        errors.push(TEMPERATURE_NAN_MSG.to_string());
    } else if temperature < TEMPERATURE_RANGE.0 || temperature > TEMPERATURE_RANGE.1 {
        errors.push(TEMPERATURE_MSG.to_string());
    }

    if hour > 23 {
        errors.push(HOUR_MSG.to_string());
    }

    match parse_date(date) {
        Some(parsed) => {
            // Midnight of the requested date against the current moment, so
            // forecasts are only issued for dates that have not passed.
            if parsed.and_hms_opt(0, 0, 0).expect("midnight exists") < now {
                errors.push(DATE_PAST_MSG.to_string());
            }
        }
        None => errors.push(DATE_FORMAT_MSG.to_string()),
    }

    errors
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Build the feature matrix and target vector from cleaned historical rows.
///
/// Selects exactly the four feature columns (fixed order) and the Load
/// column. Rows are assumed already coerced by the data loader.
pub fn build_dataset(records: &[HistoricalRecord]) -> (Array2<f64>, Array1<f64>) {
    let mut x = Array2::zeros((records.len(), N_FEATURES));
    let mut y = Array1::zeros(records.len());

    for (i, record) in records.iter().enumerate() {
        let row = FeatureVector {
            temperature: record.temperature,
            hour: record.hour,
            month: record.month(),
            weekday: record.weekday(),
        }
        .to_row();

        for (j, &value) in row.iter().enumerate() {
            x[[i, j]] = value;
        }
        y[i] = record.load;
    }

    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn future_now() -> NaiveDateTime {
        // Fixed "now" well before the test dates below
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_make_features_calendar() {
        let features = make_features(20.0, 14, "2024-01-01").unwrap();
        assert_eq!(features.month, 1);
        assert_eq!(features.weekday, 0); // Monday

        let features = make_features(20.0, 14, "2024-06-16").unwrap();
        assert_eq!(features.month, 6);
        assert_eq!(features.weekday, 6); // Sunday
    }

    #[test]
    fn test_make_features_row_order() {
        let features = make_features(18.5, 9, "2024-03-08").unwrap();
        assert_eq!(features.to_row(), [18.5, 9.0, 3.0, 4.0]); // Friday
    }

    #[test]
    fn test_make_features_bad_date() {
        let err = make_features(20.0, 14, "15/06/2024").unwrap_err();
        match err {
            ForecastError::Validation(messages) => assert_eq!(messages.len(), 1),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_validate_accumulates_all_errors() {
        let errors = validate_at(100.0, 25, "not-a-date", future_now());
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_validate_ok() {
        let errors = validate_at(20.0, 14, "2024-06-15", future_now());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_validate_past_date() {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let errors = validate_at(20.0, 14, "2024-06-15", now);
        assert_eq!(errors, vec![DATE_PAST_MSG.to_string()]);
    }

    #[test]
    fn test_validate_nan_temperature() {
        let errors = validate_at(f64::NAN, 14, "2024-06-15", future_now());
        assert_eq!(errors, vec![TEMPERATURE_NAN_MSG.to_string()]);
    }

    #[test]
    fn test_build_dataset_shapes() {
        let records = vec![
            HistoricalRecord::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 500.0, 20.0, 14),
            HistoricalRecord::new(NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(), 480.0, 22.0, 15),
        ];

        let (x, y) = build_dataset(&records);
        assert_eq!(x.shape(), &[2, 4]);
        assert_eq!(y.len(), 2);
        // 2024-06-15 is a Saturday
        assert_eq!(x.row(0).to_vec(), vec![20.0, 14.0, 6.0, 5.0]);
        assert_eq!(y[0], 500.0);
    }
}
