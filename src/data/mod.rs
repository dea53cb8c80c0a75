//! Retail turnover datasets: CSV loading and a seeded simulator with the
//! same schema.

mod retail;

pub use retail::{
    read_retail, read_retail_csv, simulate_retail, SimulationSpec, DEFAULT_INDUSTRIES,
    DEFAULT_STATES, INDUSTRY, KEYS, MONTH, SERIES_ID, STATE, TURNOVER,
};
