//! The retail forecasting workflow, end to end.
//!
//! Filter a keyed monthly table to a few series, round-trip it through a
//! plain data frame, fit the configured models, forecast, extract interval
//! bounds and select the output columns.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::convert::{as_datetime, yearmonth};
use crate::core::YearMonth;
use crate::data::{INDUSTRY, MONTH, STATE, TURNOVER};
use crate::error::{ForecastError, Result};
use crate::fable::{forecast, model, Fable, Horizon, Mable, ModelDefinition};
use crate::table::{DataFrame, Tsibble};

/// Pipeline settings.
///
/// `states` filters the first key column and `industries` the second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub states: Vec<String>,
    pub industries: Vec<String>,
    /// Model formulas such as `arima = ARIMA(log(Turnover))`.
    pub models: Vec<String>,
    /// Horizon text such as `2 years`.
    pub horizon: String,
    /// Interval level in percent.
    pub level: f64,
    /// First month of the training window.
    pub train_start: Option<YearMonth>,
    /// Last month of the training window.
    pub train_end: Option<YearMonth>,
    pub measure: String,
    pub index: String,
    pub keys: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            states: vec!["New South Wales".to_string(), "Victoria".to_string()],
            industries: vec!["Department stores".to_string()],
            models: vec![
                "ets = ETS(box_cox(Turnover, 0.3))".to_string(),
                "arima = ARIMA(log(Turnover))".to_string(),
                "snaive = SNAIVE(Turnover)".to_string(),
            ],
            horizon: "2 years".to_string(),
            level: 95.0,
            train_start: None,
            train_end: None,
            measure: TURNOVER.to_string(),
            index: MONTH.to_string(),
            keys: vec![STATE.to_string(), INDUSTRY.to_string()],
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: PipelineConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ForecastError::Config(e.to_string()))
    }

    pub fn with_states<S: AsRef<str>>(mut self, states: &[S]) -> Self {
        self.states = states.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_industries<S: AsRef<str>>(mut self, industries: &[S]) -> Self {
        self.industries = industries.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_models<S: AsRef<str>>(mut self, models: &[S]) -> Self {
        self.models = models.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_horizon(mut self, horizon: impl Into<String>) -> Self {
        self.horizon = horizon.into();
        self
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn with_train_window(mut self, start: Option<YearMonth>, end: Option<YearMonth>) -> Self {
        self.train_start = start;
        self.train_end = end;
        self
    }

    /// Parsed model definitions.
    pub fn model_definitions(&self) -> Result<Vec<ModelDefinition>> {
        self.models.iter().map(|m| ModelDefinition::parse(m)).collect()
    }

    pub fn forecast_horizon(&self) -> Result<Horizon> {
        Horizon::parse(&self.horizon)
    }

    /// Name of the interval column, e.g. `95%`.
    pub fn hilo_column(&self) -> String {
        format!("{}%", self.level)
    }

    /// Columns of the final output, in order.
    pub fn output_columns(&self) -> Vec<String> {
        let hilo = self.hilo_column();
        let mut columns = self.keys.clone();
        columns.extend([
            ".model".to_string(),
            ".mean".to_string(),
            format!("{}_lower", hilo),
            format!("{}_upper", hilo),
            self.index.clone(),
        ]);
        columns
    }

    /// Check every setting, parsing models and horizon.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ForecastError::Config(msg));
        if self.keys.len() != 2 {
            return fail(format!(
                "exactly two key columns are required, got {}",
                self.keys.len()
            ));
        }
        if self.states.is_empty() || self.industries.is_empty() {
            return fail("states and industries must not be empty".to_string());
        }
        if self.measure.is_empty() || self.index.is_empty() {
            return fail("measure and index must be named".to_string());
        }
        if !(self.level > 0.0 && self.level < 100.0) {
            return fail(format!("level must be in (0, 100), got {}", self.level));
        }
        if let (Some(start), Some(end)) = (self.train_start, self.train_end) {
            if start > end {
                return fail(format!("train_start {} is after train_end {}", start, end));
            }
        }
        self.forecast_horizon()?;
        let definitions = self.model_definitions()?;
        if definitions.is_empty() {
            return fail("at least one model is required".to_string());
        }
        if let Some(def) = definitions.iter().find(|d| d.response() != self.measure) {
            return fail(format!(
                "model `{}` uses `{}` but the measure is `{}`",
                def.name(),
                def.response(),
                self.measure
            ));
        }
        Ok(())
    }
}

/// Everything a pipeline run produces.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Filtered, round-tripped tsibble (before the training window).
    pub filtered: Tsibble,
    pub mable: Mable,
    pub fable: Fable,
    /// Selected output columns with the index as datetimes.
    pub output: DataFrame,
}

/// Filter to the configured series via a plain data frame with datetime
/// months, then rebuild the tsibble.
pub fn filter_round_trip(data: &Tsibble, config: &PipelineConfig) -> Result<Tsibble> {
    let frame = as_datetime(&data.to_data_frame(), &config.index)?;
    let frame = frame
        .filter_in(&config.keys[0], &config.states)?
        .filter_in(&config.keys[1], &config.industries)?;
    if frame.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    let frame = yearmonth(&frame, &config.index)?;
    Tsibble::from_data_frame(frame, &config.index, &config.keys)
}

/// Run the workflow on `data`.
pub fn run(data: &Tsibble, config: &PipelineConfig) -> Result<PipelineOutput> {
    config.validate()?;
    let definitions = config.model_definitions()?;
    let horizon = config.forecast_horizon()?;

    let filtered = filter_round_trip(data, config)?;
    info!(rows = filtered.n_rows(), series = filtered.n_keys(), "filtered data");

    let train = filtered.filter_index(config.train_start, config.train_end)?;
    if train.n_rows() == 0 {
        return Err(ForecastError::EmptyData);
    }

    let mable = model(&train, &definitions)?;
    info!(
        series = mable.n_rows(),
        models = definitions.len(),
        null_models = mable.n_null(),
        "fitted models"
    );

    let fable = forecast(&mable, horizon)?;
    info!(rows = fable.n_rows(), horizon = horizon.steps(), "forecast");

    let hilo = fable.hilo(config.level)?;
    let unpacked = hilo.unpack(&hilo.hilo_column())?;
    let output = as_datetime(&unpacked.select(&config.output_columns())?, &config.index)?;
    info!(rows = output.n_rows(), cols = output.n_cols(), "selected output");

    Ok(PipelineOutput {
        filtered,
        mable,
        fable,
        output,
    })
}

/// Every row of `filtered` matches the filter values and no matching row
/// of `original` was dropped.
pub fn check_filter(original: &Tsibble, filtered: &Tsibble, config: &PipelineConfig) -> Result<()> {
    let in_filter = |frame: &DataFrame| -> Result<Vec<bool>> {
        let first = frame.column(&config.keys[0])?.as_text()?;
        let second = frame.column(&config.keys[1])?.as_text()?;
        Ok(first
            .iter()
            .zip(second)
            .map(|(a, b)| config.states.contains(a) && config.industries.contains(b))
            .collect())
    };
    let kept = in_filter(filtered.frame())?;
    if let Some(row) = kept.iter().position(|m| !m) {
        return Err(ForecastError::Schema(format!(
            "row {} does not match the filter",
            row
        )));
    }
    let expected = in_filter(original.frame())?.iter().filter(|m| **m).count();
    if expected != filtered.n_rows() {
        return Err(ForecastError::DimensionMismatch {
            expected,
            got: filtered.n_rows(),
        });
    }
    Ok(())
}

/// Check the output table against the mable it was forecast from: the
/// configured columns in order, `h` consecutive months after the end of
/// the data for every (key, model) pair of `mable`, and
/// `lower <= mean <= upper` on every row with an interval. Rows of null
/// models carry NaN in all three; models with unknown variance have a mean
/// but NaN bounds.
pub fn check_output(output: &DataFrame, mable: &Mable, config: &PipelineConfig) -> Result<()> {
    let expected = config.output_columns();
    if output.column_names() != expected {
        return Err(ForecastError::Schema(format!(
            "output columns {:?}, expected {:?}",
            output.column_names(),
            expected
        )));
    }

    let h = config.forecast_horizon()?.steps();
    let hilo = config.hilo_column();
    let lower = output.column(&format!("{}_lower", hilo))?.as_float()?;
    let upper = output.column(&format!("{}_upper", hilo))?.as_float()?;
    let mean = output.column(".mean")?.as_float()?;
    for row in 0..output.n_rows() {
        let no_interval = lower[row].is_nan() && upper[row].is_nan();
        if !no_interval && !(lower[row] <= mean[row] && mean[row] <= upper[row]) {
            return Err(ForecastError::ComputationError(format!(
                "row {}: bounds [{}, {}] do not bracket mean {}",
                row, lower[row], upper[row], mean[row]
            )));
        }
    }

    let mut origins: HashMap<Vec<&str>, YearMonth> = HashMap::new();
    for (key, cells) in mable.rows() {
        for (name, cell) in mable.model_names().into_iter().zip(cells) {
            let mut group: Vec<&str> = key.values().iter().map(String::as_str).collect();
            group.push(name);
            origins.insert(group, cell.last_month());
        }
    }
    let expected_rows = origins.len() * h;
    if output.n_rows() != expected_rows {
        return Err(ForecastError::DimensionMismatch {
            expected: expected_rows,
            got: output.n_rows(),
        });
    }

    let months: Vec<YearMonth> = output
        .column(&config.index)?
        .as_datetime()?
        .iter()
        .map(YearMonth::from_datetime)
        .collect();
    let group_columns = config
        .keys
        .iter()
        .map(String::as_str)
        .chain([".model"])
        .map(|name| output.column(name).and_then(|c| c.as_text()))
        .collect::<Result<Vec<_>>>()?;
    let group_of =
        |row: usize| group_columns.iter().map(|c| c[row].as_str()).collect::<Vec<&str>>();

    let mut seen = HashSet::new();
    let mut row = 0;
    while row < output.n_rows() {
        let group = group_of(row);
        let Some(origin) = origins.get(&group) else {
            return Err(ForecastError::Schema(format!(
                "{:?} is not a series and model of the mable",
                group
            )));
        };
        if !seen.insert(group.clone()) {
            return Err(ForecastError::Schema(format!(
                "rows of {:?} are not contiguous",
                group
            )));
        }
        let end = (row..output.n_rows())
            .find(|&r| group_of(r) != group)
            .unwrap_or(output.n_rows());
        if end - row != h {
            return Err(ForecastError::DimensionMismatch {
                expected: h,
                got: end - row,
            });
        }
        if months[row] != origin.succ()
            || months[row..end].windows(2).any(|w| w[0].months_until(w[1]) != 1)
        {
            return Err(ForecastError::TimestampError(format!(
                "months of {:?} do not follow {} consecutively",
                group, origin
            )));
        }
        row = end;
    }
    Ok(())
}
