//! Forecasting models.

mod traits;

pub mod arima;
pub mod baseline;
pub mod exponential;

#[cfg(test)]
pub(crate) mod test_support;

pub use traits::{BoxedForecaster, Forecaster};
