//! Monthly retail turnover by state and industry.

use std::io::Read;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, info};

use crate::convert::yearmonth;
use crate::core::YearMonth;
use crate::error::{ForecastError, Result};
use crate::table::{read_csv, read_csv_path, Column, DataFrame, Tsibble};

pub const STATE: &str = "State";
pub const INDUSTRY: &str = "Industry";
pub const SERIES_ID: &str = "Series ID";
pub const MONTH: &str = "Month";
pub const TURNOVER: &str = "Turnover";

/// Key columns of the retail table.
pub const KEYS: [&str; 2] = [STATE, INDUSTRY];

pub const DEFAULT_STATES: [&str; 8] = [
    "Australian Capital Territory",
    "New South Wales",
    "Northern Territory",
    "Queensland",
    "South Australia",
    "Tasmania",
    "Victoria",
    "Western Australia",
];

pub const DEFAULT_INDUSTRIES: [&str; 8] = [
    "Cafes, restaurants and catering services",
    "Clothing retailing",
    "Department stores",
    "Food retailing",
    "Hardware, building and garden supplies retailing",
    "Liquor retailing",
    "Supermarket and grocery stores",
    "Takeaway food services",
];

/// Relative turnover by calendar month, January first.
const MONTHLY_PATTERN: [f64; 12] = [
    0.94, 0.86, 0.95, 0.93, 0.96, 0.92, 0.97, 0.97, 0.95, 1.00, 1.05, 1.40,
];

/// Read a retail CSV into a tsibble keyed by state and industry.
///
/// The month column may hold `2019 Jan`, ISO dates or datetimes. Every
/// column of the file is kept.
pub fn read_retail_csv(path: impl AsRef<Path>) -> Result<Tsibble> {
    let path = path.as_ref();
    let frame = read_csv_path(path)?;
    info!(path = %path.display(), rows = frame.n_rows(), "read retail data");
    retail_tsibble(frame)
}

/// Like [`read_retail_csv`], from any reader.
pub fn read_retail<R: Read>(reader: R) -> Result<Tsibble> {
    retail_tsibble(read_csv(reader)?)
}

fn retail_tsibble(frame: DataFrame) -> Result<Tsibble> {
    for required in [STATE, INDUSTRY, MONTH, TURNOVER] {
        if !frame.has_column(required) {
            return Err(ForecastError::Schema(format!(
                "retail data is missing column `{}`",
                required
            )));
        }
    }
    frame.column(TURNOVER)?.as_float()?;
    let frame = yearmonth(&frame, MONTH)?;
    Tsibble::from_data_frame(frame, MONTH, &KEYS)
}

/// Parameters of the synthetic retail generator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSpec {
    pub states: Vec<String>,
    pub industries: Vec<String>,
    /// First simulated month.
    pub start: YearMonth,
    /// Number of months per series.
    pub months: usize,
    pub seed: u64,
    /// Standard deviation of the multiplicative log-noise.
    pub noise: f64,
}

impl Default for SimulationSpec {
    /// Eight states and eight industries from April 1982 to December 2018.
    fn default() -> Self {
        Self {
            states: DEFAULT_STATES.iter().map(|s| s.to_string()).collect(),
            industries: DEFAULT_INDUSTRIES.iter().map(|s| s.to_string()).collect(),
            start: YearMonth::from_index(1982 * 12 + 3),
            months: 441,
            seed: 2018,
            noise: 0.03,
        }
    }
}

impl SimulationSpec {
    pub fn with_states<S: AsRef<str>>(mut self, states: &[S]) -> Self {
        self.states = states.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_industries<S: AsRef<str>>(mut self, industries: &[S]) -> Self {
        self.industries = industries.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_start(mut self, start: YearMonth) -> Self {
        self.start = start;
        self
    }

    pub fn with_months(mut self, months: usize) -> Self {
        self.months = months;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }
}

/// Deterministic synthetic retail data with the same schema as the
/// retail CSV: level, annual growth, multiplicative monthly seasonality
/// and log-normal noise for every (state, industry) pair.
pub fn simulate_retail(spec: &SimulationSpec) -> Result<Tsibble> {
    if spec.states.is_empty() || spec.industries.is_empty() || spec.months == 0 {
        return Err(ForecastError::InvalidParameter(
            "simulation needs at least one state, one industry and one month".to_string(),
        ));
    }
    let noise = Normal::new(0.0, spec.noise)
        .map_err(|e| ForecastError::InvalidParameter(format!("noise: {}", e)))?;
    let mut rng = StdRng::seed_from_u64(spec.seed);

    let n = spec.states.len() * spec.industries.len() * spec.months;
    let (mut states, mut industries, mut ids) =
        (Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n));
    let (mut months, mut turnover) = (Vec::with_capacity(n), Vec::with_capacity(n));

    for (si, state) in spec.states.iter().enumerate() {
        for (ii, industry) in spec.industries.iter().enumerate() {
            let series_id = format!("A3349{:03}T", si * spec.industries.len() + ii);
            let level = 20.0 + 35.0 * (si % 4) as f64 + 15.0 * (ii % 5) as f64;
            let growth = 0.025 + 0.005 * ((si + ii) % 4) as f64;
            let seasonal_scale = 0.6 + 0.1 * (ii % 5) as f64;

            for t in 0..spec.months {
                let month = spec.start.add_months(t as i64);
                let years = t as f64 / 12.0;
                let season =
                    1.0 + seasonal_scale * (MONTHLY_PATTERN[month.month() as usize - 1] - 1.0);
                let value = level
                    * (1.0 + growth).powf(years)
                    * season
                    * noise.sample(&mut rng).exp();

                states.push(state.clone());
                industries.push(industry.clone());
                ids.push(series_id.clone());
                months.push(month);
                turnover.push((value * 10.0).round() / 10.0);
            }
        }
    }
    debug!(series = spec.states.len() * spec.industries.len(), rows = n, "simulated retail data");

    let frame = DataFrame::new(vec![
        Column::text(STATE, states),
        Column::text(INDUSTRY, industries),
        Column::text(SERIES_ID, ids),
        Column::year_month(MONTH, months),
        Column::float(TURNOVER, turnover),
    ])?;
    Tsibble::from_data_frame(frame, MONTH, &KEYS)
}
