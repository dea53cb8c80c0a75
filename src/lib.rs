//! # tidy-forecast
//!
//! Tidy forecasting for keyed monthly tables.
//!
//! Load or simulate retail turnover as a [`table::Tsibble`], fit ETS, ARIMA
//! and seasonal naive models per series with optional Box-Cox or log
//! transformations, and forecast back-transformed distributions with
//! prediction intervals. [`pipeline::run`] chains the whole workflow.

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod convert;
pub mod core;
pub mod data;
pub mod error;
pub mod fable;
pub mod models;
pub mod pipeline;
pub mod table;
pub mod transform;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, TimeSeries, YearMonth};
    pub use crate::error::{ForecastError, Result};
    pub use crate::fable::{forecast, model, Horizon, ModelDefinition};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{run, PipelineConfig};
    pub use crate::table::{DataFrame, Tsibble};
}
