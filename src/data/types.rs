//! Core data types for historical load records and forecast output

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One row of historical load data after coercion and cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Calendar date of the observation
    pub date: NaiveDate,
    /// Observed electrical load (target, original units)
    pub load: f64,
    /// Ambient temperature in °C
    pub temperature: f64,
    /// Hour of day, 0-23
    pub hour: u32,
}

impl HistoricalRecord {
    pub fn new(date: NaiveDate, load: f64, temperature: f64, hour: u32) -> Self {
        Self {
            date,
            load,
            temperature,
            hour,
        }
    }

    /// Month of the observation, 1-12
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// Weekday of the observation, 0 = Monday .. 6 = Sunday
    pub fn weekday(&self) -> u32 {
        self.date.weekday().num_days_from_monday()
    }
}

/// A single forecast: point estimate plus calibrated interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    /// Point estimate of load, original units
    pub predicted_load: f64,
    /// Lower interval bound (point estimate + fitted lower offset)
    pub lower_bound: f64,
    /// Upper interval bound (point estimate + fitted upper offset)
    pub upper_bound: f64,
    /// True when the raw bounds came back inverted (lower > upper).
    /// The interval estimators are fit independently, so ordering is a
    /// calibration goal rather than a guarantee.
    pub interval_inverted: bool,
}

impl Forecast {
    /// Human-readable interval, matching the serving response format
    pub fn confidence_interval(&self) -> String {
        format!("{:.2} - {:.2}", self.lower_bound, self.upper_bound)
    }

    /// Interval width (upper - lower); negative when inverted
    pub fn interval_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_accessors() {
        let record = HistoricalRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            500.0,
            20.0,
            14,
        );

        assert_eq!(record.month(), 1);
        assert_eq!(record.weekday(), 0); // 2024-01-01 is a Monday
    }

    #[test]
    fn test_confidence_interval_format() {
        let forecast = Forecast {
            predicted_load: 500.0,
            lower_bound: 480.125,
            upper_bound: 520.5,
            interval_inverted: false,
        };

        assert_eq!(forecast.confidence_interval(), "480.12 - 520.50");
        assert!((forecast.interval_width() - 40.375).abs() < 1e-10);
    }
}
