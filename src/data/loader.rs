//! CSV ingestion for historical load data
//!
//! Expects columns {Date, Load, Temperature, Hour}. Values are coerced at the
//! string level; any row that fails coercion is dropped, never imputed.

use super::types::HistoricalRecord;
use crate::error::Result;
use chrono::NaiveDate;
use csv::Reader;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// Raw CSV row before coercion
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Load")]
    load: String,
    #[serde(rename = "Temperature")]
    temperature: String,
    #[serde(rename = "Hour")]
    hour: String,
}

impl RawRecord {
    /// Coerce string fields into a typed record. Returns None when any
    /// field fails coercion (missing-value policy: drop).
    fn coerce(&self) -> Option<HistoricalRecord> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()?;
        let load: f64 = self.load.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
        let temperature: f64 = self
            .temperature
            .trim()
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())?;
        // Hour columns sometimes arrive as floats ("14.0"); truncate like an
        // integer cast would.
        let hour: f64 = self.hour.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
        if hour < 0.0 {
            return None;
        }

        Some(HistoricalRecord::new(date, load, temperature, hour as u32))
    }
}

/// Load historical records from a CSV file, dropping rows that fail coercion
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<HistoricalRecord>> {
    let file = File::open(path.as_ref())?;
    let mut reader = Reader::from_reader(file);

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in reader.deserialize() {
        let raw: RawRecord = row?;
        match raw.coerce() {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, kept = records.len(), "dropped rows that failed coercion");
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "load_forecast_loader_{}_{}.csv",
            std::process::id(),
            contents.len()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_records_drops_bad_rows() {
        let path = write_temp_csv(
            "Date,Load,Temperature,Hour\n\
             2024-06-15,500.0,20.0,14\n\
             not-a-date,510.0,21.0,15\n\
             2024-06-16,oops,19.5,16\n\
             2024-06-17,495.0,,17\n\
             2024-06-18,505.0,22.0,18.0\n",
        );

        let records = load_records(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hour, 14);
        assert_eq!(records[1].hour, 18); // "18.0" truncates to 18
        assert_eq!(records[1].load, 505.0);
    }

    #[test]
    fn test_load_records_all_valid() {
        let path = write_temp_csv(
            "Date,Load,Temperature,Hour\n\
             2024-01-01,450.5,-5.0,0\n\
             2024-01-02,460.25,-4.5,23\n",
        );

        let records = load_records(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(records[0].weekday(), 0); // Monday
    }
}
