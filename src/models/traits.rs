//! Forecaster trait defining the common interface for all models.

use std::fmt;

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster: fmt::Debug {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Point forecasts with per-step standard errors.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Point forecasts with normal intervals at `level` (a fraction, e.g. 0.95).
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.predict(horizon)?.with_intervals(level)
    }

    /// Get the fitted values (in-sample one-step predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Innovation variance estimate.
    fn sigma2(&self) -> Option<f64>;

    /// Small-sample corrected AIC, where the model has a likelihood.
    fn aicc(&self) -> Option<f64> {
        None
    }

    /// Model family name.
    fn name(&self) -> &str;

    /// Fitted specification, e.g. `ETS(M,Ad,M)` or `ARIMA(1,0,1)(0,1,1)[12]`.
    ///
    /// Before fitting this is the family name.
    fn spec_name(&self) -> String {
        self.name().to_string()
    }

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use tidy_forecast::models::{BoxedForecaster, Forecaster};
/// use tidy_forecast::models::baseline::SeasonalNaive;
///
/// let model: BoxedForecaster = Box::new(SeasonalNaive::new(12));
/// assert_eq!(model.name(), "SNAIVE");
/// assert!(!model.is_fitted());
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::AutoARIMA;
    use crate::models::baseline::SeasonalNaive;
    use crate::models::exponential::AutoETS;
    use crate::models::test_support::monthly_series;

    fn all_models() -> Vec<BoxedForecaster> {
        vec![
            Box::new(SeasonalNaive::new(12)),
            Box::new(AutoETS::new(12)),
            Box::new(AutoARIMA::new(12)),
        ]
    }

    #[test]
    fn boxed_models_fit_and_predict() {
        let series = monthly_series(96, 7);
        for mut model in all_models() {
            assert!(!model.is_fitted());
            model.fit(&series).unwrap();
            assert!(model.is_fitted(), "{} not fitted", model.name());

            let forecast = model.predict(24).unwrap();
            assert_eq!(forecast.horizon(), 24);
            let se = forecast.std_errors().unwrap();
            assert!(se.iter().all(|s| s.is_finite() && *s >= 0.0));
            assert!(model.sigma2().unwrap() > 0.0);
        }
    }

    #[test]
    fn default_intervals_come_from_std_errors() {
        let series = monthly_series(60, 3);
        let mut model: BoxedForecaster = Box::new(SeasonalNaive::new(12));
        model.fit(&series).unwrap();

        let forecast = model.predict_with_intervals(12, 0.95).unwrap();
        let (lower, upper) = (forecast.lower().unwrap(), forecast.upper().unwrap());
        for ((l, p), u) in lower.iter().zip(forecast.point()).zip(upper) {
            assert!(l < p && p < u);
        }
    }

    #[test]
    fn residuals_align_with_series() {
        let series = monthly_series(48, 11);
        for mut model in all_models() {
            model.fit(&series).unwrap();
            assert_eq!(model.residuals().unwrap().len(), series.len());
            assert_eq!(model.fitted_values().unwrap().len(), series.len());
        }
    }

    #[test]
    fn spec_name_describes_fitted_model() {
        let series = monthly_series(72, 5);
        let mut model = AutoETS::new(12);
        assert_eq!(model.spec_name(), "ETS");
        model.fit(&series).unwrap();
        assert!(model.spec_name().starts_with("ETS("));
    }
}
