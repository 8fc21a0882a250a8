//! Min-max scaling to [0, 1], fitted once per model artifact
//!
//! Two independent instances are used in the pipeline: one for the feature
//! matrix and one for the single-column target. The fitted (min, max) pairs
//! are part of the model's identity and persist with the weights.

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column min-max normalizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Option<Array1<f64>>,
    maxs: Option<Array1<f64>>,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self {
            mins: None,
            maxs: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.mins.is_some()
    }

    /// Number of columns the scaler was fitted on
    pub fn n_columns(&self) -> Option<usize> {
        self.mins.as_ref().map(|m| m.len())
    }

    /// Fit column-wise minima and maxima on the full training set.
    ///
    /// Must be called exactly once per artifact lifetime; a second call is
    /// an error rather than a silent refit.
    pub fn fit(&mut self, data: &Array2<f64>) -> Result<()> {
        if self.is_fitted() {
            return Err(ForecastError::AlreadyFitted("MinMaxScaler"));
        }
        if data.nrows() == 0 {
            return Err(ForecastError::InsufficientData(
                "cannot fit scaler on empty data".to_string(),
            ));
        }

        let mins = data.map_axis(Axis(0), |col| {
            col.iter().cloned().fold(f64::INFINITY, f64::min)
        });
        let maxs = data.map_axis(Axis(0), |col| {
            col.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        });

        self.mins = Some(mins);
        self.maxs = Some(maxs);
        Ok(())
    }

    /// Scale to [0, 1] using the fitted range.
    ///
    /// Values outside the fitted range extrapolate outside [0, 1] on
    /// purpose: out-of-range inputs should look unusual, not get clamped.
    /// Zero-range columns map to 0.
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        let (mins, maxs) = self.params()?;
        self.check_columns(data.ncols())?;

        let mut scaled = Array2::zeros(data.raw_dim());
        for (j, mut col) in scaled.columns_mut().into_iter().enumerate() {
            let min = mins[j];
            let range = maxs[j] - min;
            for (i, value) in col.iter_mut().enumerate() {
                *value = if range > 0.0 {
                    (data[[i, j]] - min) / range
                } else {
                    0.0
                };
            }
        }

        Ok(scaled)
    }

    /// Map scaled values back to original units
    pub fn inverse_transform(&self, scaled: &Array2<f64>) -> Result<Array2<f64>> {
        let (mins, maxs) = self.params()?;
        self.check_columns(scaled.ncols())?;

        let mut data = Array2::zeros(scaled.raw_dim());
        for (j, mut col) in data.columns_mut().into_iter().enumerate() {
            let min = mins[j];
            let range = maxs[j] - min;
            for (i, value) in col.iter_mut().enumerate() {
                *value = scaled[[i, j]] * range + min;
            }
        }

        Ok(data)
    }

    /// Single-column convenience for the target vector
    pub fn transform_1d(&self, data: &Array1<f64>) -> Result<Array1<f64>> {
        let scaled = self.transform(&column(data))?;
        Ok(scaled.column(0).to_owned())
    }

    /// Single-column inverse for the target vector
    pub fn inverse_transform_1d(&self, scaled: &Array1<f64>) -> Result<Array1<f64>> {
        let data = self.inverse_transform(&column(scaled))?;
        Ok(data.column(0).to_owned())
    }

    fn params(&self) -> Result<(&Array1<f64>, &Array1<f64>)> {
        match (&self.mins, &self.maxs) {
            (Some(mins), Some(maxs)) => Ok((mins, maxs)),
            _ => Err(ForecastError::NotFitted("MinMaxScaler")),
        }
    }

    fn check_columns(&self, got: usize) -> Result<()> {
        let expected = self.n_columns().unwrap_or(0);
        if got != expected {
            return Err(ForecastError::DimensionMismatch { expected, got });
        }
        Ok(())
    }
}

fn column(data: &Array1<f64>) -> Array2<f64> {
    data.view()
        .insert_axis(Axis(1))
        .to_owned()
}
