//! # Model module
//!
//! The two-stage forecasting core: an LSTM point forecaster and a pair of
//! epsilon-insensitive kernel regressors calibrating prediction intervals
//! from its residuals.
//!
//! ## Example
//!
//! ```rust,no_run
//! use load_forecast::model::{LstmConfig, LstmForecaster};
//! use ndarray::{Array1, Array2};
//!
//! let config = LstmConfig::new(4).with_lstm_units(32).with_seed(7);
//! let mut forecaster = LstmForecaster::from_config(config);
//!
//! let x = Array2::zeros((100, 4));
//! let y = Array1::zeros(100);
//! let history = forecaster.fit(&x, &y, 50, 32, 0.2).unwrap();
//! println!("final loss: {:?}", history.final_loss());
//! ```

mod config;
mod layers;
mod lstm;
mod optimizer;
mod svr;

pub use config::{ForecastConfig, IntervalPolicy, Kernel, LstmConfig, SvrConfig};
pub use layers::{Activation, Dense, Dropout};
pub use lstm::{LstmForecaster, LstmLayer, TrainingHistory};
pub use optimizer::{Adam, AdamSlot};
pub use svr::{IntervalEstimator, SvrRegressor};
