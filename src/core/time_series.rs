//! TimeSeries data structure handed to forecasting models.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// A univariate time series with strictly increasing timestamps.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a univariate time series.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if values.len() != timestamps.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        Ok(Self {
            timestamps,
            values,
            label: None,
        })
    }

    /// Attach a label, usually the series key.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Copy of the observations in `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end || end > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }
        Ok(Self {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            label: self.label.clone(),
        })
    }

    /// Check for NaN or infinite observations.
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Apply `f` to every observation, keeping timestamps and label.
    pub fn map_values<F>(&self, f: F) -> TimeSeries
    where
        F: Fn(f64) -> f64,
    {
        Self {
            timestamps: self.timestamps.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
            label: self.label.clone(),
        }
    }
}
