//! # Preprocessing module
//!
//! Turns raw (temperature, hour, date) inputs into the fixed four-feature
//! representation the models consume, and normalizes features and target
//! with independently fitted min-max scalers.
//!
//! ## Example
//!
//! ```rust
//! use load_forecast::preprocessing::{build_dataset, make_features, MinMaxScaler};
//! use load_forecast::data::HistoricalRecord;
//! use chrono::NaiveDate;
//!
//! let records = vec![
//!     HistoricalRecord::new(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), 500.0, 20.0, 14),
//!     HistoricalRecord::new(NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(), 480.0, 22.0, 15),
//! ];
//!
//! let (x, y) = build_dataset(&records);
//! let mut scaler = MinMaxScaler::new();
//! scaler.fit(&x).unwrap();
//! let x_scaled = scaler.transform(&x).unwrap();
//! assert_eq!(x_scaled.shape(), &[2, 4]);
//! ```

mod features;
mod scaler;

pub use features::{
    build_dataset, make_features, validate, validate_at, FeatureVector, FEATURE_NAMES, N_FEATURES,
    TEMPERATURE_RANGE,
};
pub use scaler::MinMaxScaler;
