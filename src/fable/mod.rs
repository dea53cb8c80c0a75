//! Tidy model and forecast tables.
//!
//! A [`Mable`] holds one fitted model per series key and model definition;
//! [`forecast`] turns it into a [`Fable`] of back-transformed forecast
//! distributions, from which [`Fable::hilo`] draws intervals.
//!
//! # Example
//!
//! ```no_run
//! use tidy_forecast::data::{simulate_retail, SimulationSpec};
//! use tidy_forecast::fable::{forecast, model, Horizon, ModelDefinition};
//!
//! let data = simulate_retail(&SimulationSpec::default()).unwrap();
//! let defs = vec![
//!     ModelDefinition::parse("ets = ETS(box_cox(Turnover, 0.3))").unwrap(),
//!     ModelDefinition::parse("snaive = SNAIVE(Turnover)").unwrap(),
//! ];
//! let mable = model(&data, &defs).unwrap();
//! let fable = forecast(&mable, Horizon::parse("2 years").unwrap()).unwrap();
//! let intervals = fable.hilo(95.0).unwrap().unpack("95%").unwrap();
//! println!("{}", intervals);
//! ```

mod forecast;
mod formula;
mod mable;

pub use forecast::{forecast, Fable, FableRow, HiloFable, Horizon};
pub use formula::{ModelDefinition, ModelFamily};
pub use mable::{model, FittedModel, Mable, ModelCell, MONTHLY_PERIOD};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::YearMonth;
    use crate::data::{simulate_retail, SimulationSpec};
    use crate::table::Tsibble;

    /// Department store turnover for `states`, monthly from January 2000.
    pub(crate) fn retail_tsibble(states: &[&str], months: usize, seed: u64) -> Tsibble {
        let spec = SimulationSpec::default()
            .with_states(states)
            .with_industries(&["Department stores"])
            .with_start(YearMonth::new(2000, 1).unwrap())
            .with_months(months)
            .with_seed(seed);
        simulate_retail(&spec).unwrap()
    }
}
