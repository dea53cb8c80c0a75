//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};
use crate::utils::stats::quantile_normal;

/// Point forecasts with optional standard errors and interval bounds.
///
/// Values are on the scale the model was fitted on; transformations are
/// undone later when forecasts are turned into distributions.
#[derive(Debug, Clone, Default)]
pub struct Forecast {
    point: Vec<f64>,
    std_errors: Option<Vec<f64>>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions only.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            ..Self::default()
        }
    }

    /// Create a forecast whose steps carry a standard error each.
    pub fn from_values_with_std_errors(values: Vec<f64>, std_errors: Vec<f64>) -> Result<Self> {
        if values.len() != std_errors.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: std_errors.len(),
            });
        }
        Ok(Self {
            point: values,
            std_errors: Some(std_errors),
            ..Self::default()
        })
    }

    /// Create a forecast with explicit interval bounds.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        for bound in [&lower, &upper] {
            if bound.len() != values.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: values.len(),
                    got: bound.len(),
                });
            }
        }
        Ok(Self {
            point: values,
            std_errors: None,
            lower: Some(lower),
            upper: Some(upper),
        })
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn std_errors(&self) -> Option<&[f64]> {
        self.std_errors.as_deref()
    }

    pub fn has_lower(&self) -> bool {
        self.lower.is_some()
    }

    pub fn has_upper(&self) -> bool {
        self.upper.is_some()
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Add symmetric normal intervals at `level` (a fraction, e.g. 0.95).
    pub fn with_intervals(mut self, level: f64) -> Result<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must be in (0, 1), got {}",
                level
            )));
        }
        let se = self.std_errors.as_ref().ok_or_else(|| {
            ForecastError::ComputationError("forecast has no standard errors".to_string())
        })?;

        let z = quantile_normal((1.0 + level) / 2.0);
        let lower = self
            .point
            .iter()
            .zip(se)
            .map(|(p, s)| p - z * s)
            .collect();
        let upper = self
            .point
            .iter()
            .zip(se)
            .map(|(p, s)| p + z * s)
            .collect();

        self.lower = Some(lower);
        self.upper = Some(upper);
        Ok(self)
    }
}
