//! # Data module
//!
//! Historical load records, forecast output, and CSV ingestion with a
//! coerce-and-drop cleaning policy.

mod loader;
mod types;

pub use loader::load_records;
pub use types::{Forecast, HistoricalRecord};
