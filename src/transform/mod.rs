//! Response transformations applied before model fitting.
//!
//! A model declared as `ETS(box_cox(Turnover, 0.3))` is fitted on the
//! transformed series; its forecasts are mapped back through the inverse
//! transformation when distributions are built.
//!
//! # Example
//!
//! ```
//! use tidy_forecast::transform::Transformation;
//!
//! let t = Transformation::BoxCox { lambda: 0.3 };
//! let y = t.forward(120.0);
//! assert!((t.inverse(y) - 120.0).abs() < 1e-9);
//! ```

pub mod boxcox;

pub use boxcox::{boxcox, boxcox_lambda, inv_boxcox, is_boxcox_suitable};

use crate::error::{ForecastError, Result};
use boxcox::{boxcox_value, inv_boxcox_value, LOG_LAMBDA_EPS};

/// Transformation of the response variable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Transformation {
    #[default]
    Identity,
    /// Natural logarithm.
    Log,
    /// Box-Cox power transform with fixed lambda.
    BoxCox { lambda: f64 },
}

impl Transformation {
    pub fn is_identity(&self) -> bool {
        matches!(self, Transformation::Identity)
    }

    /// Transform a single observation.
    pub fn forward(&self, x: f64) -> f64 {
        match *self {
            Transformation::Identity => x,
            Transformation::Log => {
                if x > 0.0 {
                    x.ln()
                } else {
                    f64::NAN
                }
            }
            Transformation::BoxCox { lambda } => boxcox_value(x, lambda),
        }
    }

    /// Map a value on the transformed scale back to the original scale.
    pub fn inverse(&self, y: f64) -> f64 {
        match *self {
            Transformation::Identity => y,
            Transformation::Log => y.exp(),
            Transformation::BoxCox { lambda } => inv_boxcox_value(y, lambda),
        }
    }

    /// Second derivative of the inverse transformation at `y`.
    ///
    /// Drives the second-order bias adjustment of back-transformed means.
    pub fn inverse_second_derivative(&self, y: f64) -> f64 {
        match *self {
            Transformation::Identity => 0.0,
            Transformation::Log => y.exp(),
            Transformation::BoxCox { lambda } => {
                if lambda.abs() < LOG_LAMBDA_EPS {
                    return y.exp();
                }
                let base = lambda * y + 1.0;
                if base <= 0.0 {
                    0.0
                } else {
                    (1.0 - lambda) * base.powf(1.0 / lambda - 2.0)
                }
            }
        }
    }

    /// Transform a whole series, failing on values outside the domain.
    pub fn apply(&self, values: &[f64]) -> Result<Vec<f64>> {
        let out: Vec<f64> = values.iter().map(|&x| self.forward(x)).collect();
        if let Some(pos) = out
            .iter()
            .zip(values)
            .position(|(y, x)| !y.is_finite() && x.is_finite())
        {
            return Err(ForecastError::InvalidParameter(format!(
                "{} is undefined for observation {} ({})",
                self.describe("x"),
                pos,
                values[pos]
            )));
        }
        Ok(out)
    }

    /// Render as the expression applied to `response`.
    pub fn describe(&self, response: &str) -> String {
        match self {
            Transformation::Identity => response.to_string(),
            Transformation::Log => format!("log({})", response),
            Transformation::BoxCox { lambda } => format!("box_cox({}, {})", response, lambda),
        }
    }
}
