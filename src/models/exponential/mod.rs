//! Exponential smoothing models.
//!
//! - ETS (Error-Trend-Seasonal) state-space framework
//! - AutoETS (automatic model selection)

mod auto_ets;
mod ets;

pub use auto_ets::{AutoETS, AutoETSConfig, SelectionCriterion};
pub use ets::{ETSSpec, ErrorType, SeasonalType, SmoothingParams, TrendType, ETS};
