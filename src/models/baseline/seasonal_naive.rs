//! Seasonal Naive forecasting model.
//!
//! Forecasts by repeating the value from the same season in the last cycle.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::stats::finite_sum_sq;

/// Seasonal Naive forecaster.
///
/// Each forecast equals the most recent observation from the same season.
/// Forecast standard errors grow with the number of whole seasons ahead:
/// `σ·sqrt(k)` with `k = floor((h - 1) / m) + 1`.
///
/// A single season of history is enough for point forecasts; without any
/// residual the variance is unknown and standard errors are NaN.
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    period: usize,
    history: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
}

impl SeasonalNaive {
    /// Create a new SeasonalNaive model with the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            history: None,
            fitted: None,
            residuals: None,
            sigma2: None,
        }
    }

    /// Get the seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Latest observed value for the season `steps_back` positions before
    /// the end of the history, skipping missing cycles.
    fn seasonal_value(history: &[f64], period: usize, steps_back: usize) -> f64 {
        let mut idx = history.len() - steps_back;
        loop {
            if history[idx].is_finite() {
                return history[idx];
            }
            if idx < period {
                return f64::NAN;
            }
            idx -= period;
        }
    }
}

impl Default for SeasonalNaive {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Forecaster for SeasonalNaive {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let m = self.period;
        if values.len() < m {
            return Err(ForecastError::InsufficientData {
                needed: m,
                got: values.len(),
            });
        }

        let fitted: Vec<f64> = (0..values.len())
            .map(|i| if i < m { f64::NAN } else { values[i - m] })
            .collect();
        let residuals: Vec<f64> = values.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        let (sum_sq, count) = finite_sum_sq(&residuals);

        self.history = Some(values.to_vec());
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        self.sigma2 = (count > 0).then(|| sum_sq / count as f64);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let history = self.history.as_ref().ok_or(ForecastError::FitRequired)?;
        let sigma = self.sigma2.map_or(f64::NAN, f64::sqrt);
        let m = self.period;

        let mut predictions = Vec::with_capacity(horizon);
        let mut std_errors = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            let steps_back = m - (h - 1) % m;
            predictions.push(Self::seasonal_value(history, m, steps_back));

            let k = (h - 1) / m + 1;
            std_errors.push(sigma * (k as f64).sqrt());
        }

        Forecast::from_values_with_std_errors(predictions, std_errors)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    fn name(&self) -> &str {
        "SNAIVE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::series_from;
    use approx::assert_relative_eq;

    #[test]
    fn seasonal_naive_repeats_last_cycle() {
        let values: Vec<f64> = (0..8).map(|i| (i % 4) as f64 * 10.0 + (i / 4) as f64).collect();
        let mut model = SeasonalNaive::new(4);
        model.fit(&series_from(values)).unwrap();

        let forecast = model.predict(6).unwrap();
        assert_eq!(forecast.point(), &[1.0, 11.0, 21.0, 31.0, 1.0, 11.0]);
    }

    #[test]
    fn seasonal_naive_std_errors_step_per_season() {
        let values = vec![1.0, 2.0, 3.0, 2.0, 4.0, 5.0];
        let mut model = SeasonalNaive::new(3);
        model.fit(&series_from(values)).unwrap();

        // residuals: 1, 2, 2 -> sigma2 = 3
        assert_relative_eq!(model.sigma2().unwrap(), 3.0);
        let forecast = model.predict(7).unwrap();
        let se = forecast.std_errors().unwrap();
        let sigma = 3.0f64.sqrt();
        assert_relative_eq!(se[0], sigma);
        assert_relative_eq!(se[2], sigma);
        assert_relative_eq!(se[3], sigma * 2.0f64.sqrt());
        assert_relative_eq!(se[6], sigma * 3.0f64.sqrt());
    }

    #[test]
    fn seasonal_naive_skips_missing_last_cycle() {
        let values = vec![1.0, 2.0, 3.0, 4.0, f64::NAN, 6.0];
        let mut model = SeasonalNaive::new(3);
        model.fit(&series_from(values)).unwrap();
        assert_eq!(model.predict(3).unwrap().point(), &[4.0, 2.0, 6.0]);
    }

    #[test]
    fn seasonal_naive_needs_one_cycle() {
        let mut model = SeasonalNaive::new(12);
        let err = model.fit(&series_from(vec![1.0; 11])).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { needed: 12, got: 11 }));
    }

    #[test]
    fn seasonal_naive_single_cycle_has_unknown_variance() {
        let values: Vec<f64> = (1..=4).map(|v| v as f64).collect();
        let mut model = SeasonalNaive::new(4);
        model.fit(&series_from(values)).unwrap();

        assert!(model.sigma2().is_none());
        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.point(), &[1.0, 2.0, 3.0, 4.0, 1.0]);
        assert!(forecast.std_errors().unwrap().iter().all(|s| s.is_nan()));
    }

    #[test]
    fn seasonal_naive_requires_fit() {
        let model = SeasonalNaive::new(12);
        assert!(matches!(model.predict(3), Err(ForecastError::FitRequired)));
        assert_eq!(model.name(), "SNAIVE");
    }
}
