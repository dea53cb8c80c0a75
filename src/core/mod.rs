//! Core data structures for time series forecasting.

mod distribution;
mod forecast;
mod period;
mod time_series;

pub use distribution::{Distribution, Hilo};
pub(crate) use distribution::signif;
pub use forecast::Forecast;
pub use period::{format_datetime, parse_datetime, YearMonth};
pub use time_series::TimeSeries;
