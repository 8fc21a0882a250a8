//! # Load Forecast
//!
//! Short-term electrical load forecasting with calibrated prediction
//! intervals.
//!
//! The pipeline is two-stage: a compact LSTM network produces the point
//! forecast, and a pair of epsilon-insensitive kernel regressors, fitted on
//! the network's training residuals, turns each point into a lower and
//! upper bound. Features and target are min-max scaled with scalers that
//! persist alongside the weights as one model artifact.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use load_forecast::artifact::ModelArtifact;
//! use load_forecast::data::load_records;
//! use load_forecast::model::ForecastConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let records = load_records("data/load_history.csv")?;
//!     let (artifact, history) = ModelArtifact::train(&records, &ForecastConfig::default())?;
//!     println!("final training loss: {:?}", history.final_loss());
//!
//!     let forecast = artifact.predict_single(21.5, 14, "2027-06-15")?;
//!     println!(
//!         "predicted load: {:.2} MW ({})",
//!         forecast.predicted_load,
//!         forecast.confidence_interval()
//!     );
//!
//!     artifact.save("models/latest")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`data`]: historical record types and the CSV loader
//! - [`preprocessing`]: feature construction, input validation, min-max
//!   scaling
//! - [`model`]: the LSTM point forecaster and the SVR interval estimator
//! - [`metrics`]: point-accuracy and interval-quality metrics
//! - [`artifact`]: training flow, persistence, and the serving handle

pub mod artifact;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod preprocessing;

pub use artifact::{ArtifactSlot, ModelArtifact};
pub use data::{Forecast, HistoricalRecord};
pub use error::{ForecastError, Result};
pub use metrics::{create_metrics_report, MetricsReport};
pub use model::{ForecastConfig, IntervalPolicy};
