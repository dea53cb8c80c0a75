//! Seasonal ARIMA models.
//!
//! This module provides:
//! - ARIMA(p, d, q)(P, D, Q)\[m\] models with an optional mean or drift
//! - AutoARIMA for automatic order selection
//! - Differencing helpers and unit-root based differencing order selection

mod auto_arima;
mod diff;
mod model;

pub use auto_arima::{AutoARIMA, AutoARIMAConfig};
pub use diff::{
    difference, differencing_polynomial, kpss_statistic, ndiffs, nsdiffs, seasonal_difference,
    seasonal_strength,
};
pub use model::{ARIMASpec, ARIMA};
