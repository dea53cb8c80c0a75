//! Forecast distributions and the intervals drawn from them.

use std::fmt;

use crate::error::{ForecastError, Result};
use crate::transform::Transformation;
use crate::utils::stats::quantile_normal;

/// Predictive distribution of a single forecast step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    /// Normal distribution on the response scale.
    Normal { mean: f64, sd: f64 },
    /// Normal distribution on a transformed scale, mapped back through the
    /// inverse of `transform`.
    Transformed {
        mean: f64,
        sd: f64,
        transform: Transformation,
    },
    /// No distribution, as forecast by a model that failed to fit.
    Missing,
}

impl Distribution {
    /// Build the distribution of a forecast made on the `transform` scale.
    pub fn from_transformed(mean: f64, sd: f64, transform: Transformation) -> Self {
        if transform.is_identity() {
            Distribution::Normal { mean, sd }
        } else {
            Distribution::Transformed {
                mean,
                sd,
                transform,
            }
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Distribution::Missing)
    }

    fn normal_params(&self) -> (f64, f64) {
        match *self {
            Distribution::Normal { mean, sd } => (mean, sd),
            Distribution::Transformed { mean, sd, .. } => (mean, sd),
            Distribution::Missing => (f64::NAN, f64::NAN),
        }
    }

    fn inverse(&self, y: f64) -> f64 {
        match self {
            Distribution::Normal { .. } | Distribution::Missing => y,
            Distribution::Transformed { transform, .. } => transform.inverse(y),
        }
    }

    /// Mean on the response scale.
    ///
    /// Transformed distributions use the second order Taylor approximation
    /// `f⁻¹(μ) + σ²/2 · (f⁻¹)''(μ)`. Missing distributions give NaN.
    pub fn mean(&self) -> f64 {
        match *self {
            Distribution::Normal { mean, .. } => mean,
            Distribution::Missing => f64::NAN,
            Distribution::Transformed {
                mean,
                sd,
                transform,
            } => {
                let adjustment = if sd.is_finite() {
                    0.5 * sd * sd * transform.inverse_second_derivative(mean)
                } else {
                    0.0
                };
                transform.inverse(mean) + adjustment
            }
        }
    }

    pub fn median(&self) -> f64 {
        let (mean, _) = self.normal_params();
        self.inverse(mean)
    }

    /// Variance of the underlying normal, on the scale the model was fitted on.
    pub fn variance_transformed(&self) -> f64 {
        let (_, sd) = self.normal_params();
        sd * sd
    }

    /// Quantile at probability `p` on the response scale.
    ///
    /// An unknown (NaN) sd gives NaN; zero or infinite sd returns the
    /// median.
    pub fn quantile(&self, p: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(ForecastError::InvalidParameter(format!(
                "probability must be in [0, 1], got {}",
                p
            )));
        }
        let (mean, sd) = self.normal_params();
        if sd.is_nan() {
            return Ok(f64::NAN);
        }
        if !(sd.is_finite() && sd > 0.0) {
            return Ok(self.inverse(mean));
        }
        Ok(self.inverse(mean + sd * quantile_normal(p)))
    }

    /// Central interval covering `level` percent of the distribution.
    pub fn hilo(&self, level: f64) -> Result<Hilo> {
        if !(level > 0.0 && level < 100.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must be a percentage in (0, 100), got {}",
                level
            )));
        }
        let tail = (1.0 - level / 100.0) / 2.0;
        Ok(Hilo {
            lower: self.quantile(tail)?,
            upper: self.quantile(1.0 - tail)?,
            level,
        })
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            return f.write_str("NA");
        }
        let (mean, sd) = self.normal_params();
        let normal = format!("N({}, {})", signif(mean, 2), signif(sd * sd, 2));
        match self {
            Distribution::Normal { .. } => f.write_str(&normal),
            Distribution::Transformed { .. } => write!(f, "t({})", normal),
            Distribution::Missing => Ok(()),
        }
    }
}

/// Interval bounds at a confidence level given in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hilo {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
}

impl Hilo {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl fmt::Display for Hilo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}]{}",
            signif(self.lower, 4),
            signif(self.upper, 4),
            self.level
        )
    }
}

/// Format with roughly `digits` significant digits.
pub(crate) fn signif(x: f64, digits: i32) -> String {
    if !x.is_finite() {
        return format!("{}", x);
    }
    if x == 0.0 {
        return "0".to_string();
    }
    let magnitude = x.abs().log10().floor() as i32;
    let decimals = (digits - 1 - magnitude).max(0) as usize;
    format!("{:.*}", decimals, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_hilo_is_symmetric() {
        let dist = Distribution::Normal {
            mean: 100.0,
            sd: 10.0,
        };
        let hilo = dist.hilo(95.0).unwrap();
        assert_relative_eq!(hilo.lower, 100.0 - 19.59964, epsilon = 1e-3);
        assert_relative_eq!(hilo.upper, 100.0 + 19.59964, epsilon = 1e-3);
        assert_eq!(hilo.level, 95.0);
        assert!(hilo.contains(dist.mean()));
    }

    #[test]
    fn log_normal_mean_is_bias_adjusted() {
        let dist = Distribution::from_transformed(2.0, 0.1, Transformation::Log);
        assert_relative_eq!(dist.median(), 2.0f64.exp(), epsilon = 1e-12);
        assert_relative_eq!(dist.mean(), 2.0f64.exp() * 1.005, epsilon = 1e-12);
        assert!(dist.mean() > dist.median());
    }

    #[test]
    fn transformed_bounds_bracket_mean() {
        for transform in [Transformation::Log, Transformation::BoxCox { lambda: 0.3 }] {
            let mu = transform.forward(250.0);
            let dist = Distribution::from_transformed(mu, 0.2, transform);
            let hilo = dist.hilo(95.0).unwrap();
            assert!(hilo.lower < dist.mean());
            assert!(dist.mean() < hilo.upper);
        }
    }

    #[test]
    fn identity_transform_collapses_to_normal() {
        let dist = Distribution::from_transformed(5.0, 1.0, Transformation::Identity);
        assert!(matches!(dist, Distribution::Normal { .. }));
    }

    #[test]
    fn degenerate_distribution_has_point_interval() {
        let dist = Distribution::Normal { mean: 7.0, sd: 0.0 };
        let hilo = dist.hilo(80.0).unwrap();
        assert_eq!(hilo.lower, 7.0);
        assert_eq!(hilo.upper, 7.0);
        assert_eq!(hilo.width(), 0.0);
    }

    #[test]
    fn hilo_rejects_fractional_level_out_of_range() {
        let dist = Distribution::Normal { mean: 0.0, sd: 1.0 };
        assert!(dist.hilo(0.0).is_err());
        assert!(dist.hilo(100.0).is_err());
        assert!(dist.quantile(1.5).is_err());
    }

    #[test]
    fn display_uses_variance() {
        let dist = Distribution::Normal {
            mean: 12.3,
            sd: 3.4f64.sqrt(),
        };
        assert_eq!(dist.to_string(), "N(12, 3.4)");
        let dist = Distribution::from_transformed(2.1, 0.1414, Transformation::Log);
        assert_eq!(dist.to_string(), "t(N(2.1, 0.020))");
    }

    #[test]
    fn unknown_sd_gives_point_mean_without_interval() {
        let dist = Distribution::Normal {
            mean: 40.0,
            sd: f64::NAN,
        };
        assert_eq!(dist.mean(), 40.0);
        let hilo = dist.hilo(95.0).unwrap();
        assert!(hilo.lower.is_nan() && hilo.upper.is_nan());

        let dist = Distribution::from_transformed(2.0, f64::NAN, Transformation::Log);
        assert_relative_eq!(dist.mean(), 2.0f64.exp(), epsilon = 1e-12);
    }

    #[test]
    fn missing_distribution_has_nan_summaries() {
        let dist = Distribution::Missing;
        assert!(dist.mean().is_nan());
        assert!(dist.median().is_nan());
        let hilo = dist.hilo(95.0).unwrap();
        assert!(hilo.lower.is_nan() && hilo.upper.is_nan());
        assert_eq!(dist.to_string(), "NA");
    }

    #[test]
    fn signif_rounds_to_digits() {
        assert_eq!(signif(1234.4, 2), "1234");
        assert_eq!(signif(0.012345, 2), "0.012");
        assert_eq!(signif(0.0, 3), "0");
    }
}
