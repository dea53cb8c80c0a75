//! Forecast tables and interval extraction.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::core::{Distribution, Hilo, YearMonth};
use crate::error::{ForecastError, Result};
use crate::fable::mable::Mable;
use crate::table::{Column, DataFrame, SeriesKey};

/// Forecast horizon in monthly steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon(usize);

impl Horizon {
    /// A horizon of `n` months.
    pub fn months(n: usize) -> Self {
        Self(n)
    }

    pub fn steps(&self) -> usize {
        self.0
    }

    /// Parse `"2 years"`, `"24 months"`, `"6 quarters"` or a bare `"24"`.
    ///
    /// # Example
    /// ```
    /// use tidy_forecast::fable::Horizon;
    ///
    /// assert_eq!(Horizon::parse("2 years").unwrap().steps(), 24);
    /// assert_eq!(Horizon::parse("6 quarters").unwrap().steps(), 18);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        let (count, unit) = match text.split_once(char::is_whitespace) {
            Some((count, unit)) => (count, unit.trim()),
            None => (text, "months"),
        };
        let count: usize = count
            .parse()
            .map_err(|_| ForecastError::Parse(format!("invalid horizon `{}`", input)))?;
        let months_per_unit = match unit.to_lowercase().as_str() {
            "month" | "months" => 1,
            "quarter" | "quarters" => 3,
            "year" | "years" => 12,
            other => {
                return Err(ForecastError::Parse(format!(
                    "unknown horizon unit `{}` in `{}`",
                    other, input
                )))
            }
        };
        if count == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be positive".to_string(),
            ));
        }
        count
            .checked_mul(months_per_unit)
            .map(Self)
            .ok_or_else(|| ForecastError::Parse(format!("horizon `{}` is too long", input)))
    }
}

impl FromStr for Horizon {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One forecast step of one model for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct FableRow {
    pub key: SeriesKey,
    pub model: String,
    pub month: YearMonth,
    pub distribution: Distribution,
}

impl FableRow {
    /// Mean of the forecast distribution on the response scale.
    pub fn mean(&self) -> f64 {
        self.distribution.mean()
    }
}

/// Forecast table: one distribution per (key, model, month).
#[derive(Debug, Clone, PartialEq)]
pub struct Fable {
    key_names: Vec<String>,
    index: String,
    response: String,
    rows: Vec<FableRow>,
}

/// Forecast every model of `mable` `horizon` months past the end of its
/// series. Null models get `horizon` rows with missing distributions.
pub fn forecast(mable: &Mable, horizon: Horizon) -> Result<Fable> {
    let h = horizon.steps();
    if h == 0 {
        return Err(ForecastError::InvalidParameter(
            "forecast horizon must be positive".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for (key, cells) in mable.rows() {
        for (def, cell) in mable.definitions().iter().zip(cells) {
            let Some(fitted) = cell.fitted() else {
                rows.extend((1..=h).map(|step| FableRow {
                    key: key.clone(),
                    model: def.name().to_string(),
                    month: cell.last_month().add_months(step as i64),
                    distribution: Distribution::Missing,
                }));
                debug!(key = %key, model = def.name(), "null model, forecasts are missing");
                continue;
            };
            let prediction = fitted.model().predict(h)?;
            let sd = prediction.std_errors();
            for (step, point) in prediction.point().iter().enumerate() {
                let sd = sd.map_or(0.0, |s| s[step]);
                rows.push(FableRow {
                    key: key.clone(),
                    model: def.name().to_string(),
                    month: fitted.last_month().add_months(step as i64 + 1),
                    distribution: Distribution::from_transformed(
                        *point,
                        sd,
                        fitted.transformation(),
                    ),
                });
            }
            debug!(key = %key, model = def.name(), horizon = h, "forecast model");
        }
    }

    let response = mable
        .definitions()
        .first()
        .map(|d| d.response().to_string())
        .unwrap_or_default();
    Ok(Fable {
        key_names: mable.key_names().to_vec(),
        index: mable.index_name().to_string(),
        response,
        rows,
    })
}

impl Fable {
    pub fn rows(&self) -> &[FableRow] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn key_names(&self) -> &[String] {
        &self.key_names
    }

    /// Name of the distribution column.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Attach a central interval at `level` percent to every row.
    pub fn hilo(&self, level: f64) -> Result<HiloFable> {
        let hilos = self
            .rows
            .iter()
            .map(|row| row.distribution.hilo(level))
            .collect::<Result<Vec<_>>>()?;
        Ok(HiloFable {
            fable: self.clone(),
            level,
            hilos,
        })
    }

    /// Keys, `.model`, index, distribution (as text) and `.mean`.
    fn base_columns(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = self
            .key_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Column::text(
                    name.as_str(),
                    self.rows.iter().map(|r| r.key.values()[i].clone()).collect(),
                )
            })
            .collect();
        columns.push(Column::text(
            ".model",
            self.rows.iter().map(|r| r.model.clone()).collect(),
        ));
        columns.push(Column::year_month(
            self.index.as_str(),
            self.rows.iter().map(|r| r.month).collect(),
        ));
        columns.push(Column::text(
            self.response.as_str(),
            self.rows.iter().map(|r| r.distribution.to_string()).collect(),
        ));
        columns.push(Column::float(
            ".mean",
            self.rows.iter().map(FableRow::mean).collect(),
        ));
        columns
    }

    pub fn to_data_frame(&self) -> Result<DataFrame> {
        DataFrame::new(self.base_columns())
    }

    fn n_series(&self) -> usize {
        let mut seen: Vec<(&SeriesKey, &str)> = Vec::new();
        for row in &self.rows {
            if !seen.contains(&(&row.key, row.model.as_str())) {
                seen.push((&row.key, row.model.as_str()));
            }
        }
        seen.len()
    }
}

impl fmt::Display for Fable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.to_data_frame().map_err(|_| fmt::Error)?;
        writeln!(
            f,
            "# A fable: {} x {} [1M]",
            frame.n_rows(),
            frame.n_cols()
        )?;
        writeln!(
            f,
            "# Key:     {}, .model [{}]",
            self.key_names.join(", "),
            self.n_series()
        )?;
        frame.fmt_body(f)
    }
}

/// A fable with one interval column.
#[derive(Debug, Clone, PartialEq)]
pub struct HiloFable {
    fable: Fable,
    level: f64,
    hilos: Vec<Hilo>,
}

impl HiloFable {
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn hilos(&self) -> &[Hilo] {
        &self.hilos
    }

    pub fn fable(&self) -> &Fable {
        &self.fable
    }

    /// Name of the interval column, e.g. `95%`.
    pub fn hilo_column(&self) -> String {
        format!("{}%", self.level)
    }

    /// Fable columns plus the interval column rendered as text.
    pub fn to_data_frame(&self) -> Result<DataFrame> {
        let mut columns = self.fable.base_columns();
        columns.push(Column::text(
            self.hilo_column(),
            self.hilos.iter().map(Hilo::to_string).collect(),
        ));
        DataFrame::new(columns)
    }

    /// Split the interval column `column` into `{column}_lower` and
    /// `{column}_upper` float columns.
    pub fn unpack(&self, column: &str) -> Result<DataFrame> {
        if column != self.hilo_column() {
            return Err(ForecastError::Schema(format!(
                "no interval column `{}` (have `{}`)",
                column,
                self.hilo_column()
            )));
        }
        let mut columns = self.fable.base_columns();
        columns.push(Column::float(
            format!("{}_lower", column),
            self.hilos.iter().map(|h| h.lower).collect(),
        ));
        columns.push(Column::float(
            format!("{}_upper", column),
            self.hilos.iter().map(|h| h.upper).collect(),
        ));
        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fable::formula::ModelDefinition;
    use crate::fable::mable::model;
    use crate::fable::test_support::retail_tsibble;

    fn retail_mable(states: &[&str], months: usize) -> Mable {
        let defs: Vec<ModelDefinition> = [
            "ets = ETS(box_cox(Turnover, 0.3))",
            "arima = ARIMA(log(Turnover))",
            "snaive = SNAIVE(Turnover)",
        ]
        .iter()
        .map(|s| ModelDefinition::parse(s).unwrap())
        .collect();
        model(&retail_tsibble(states, months, 11), &defs).unwrap()
    }

    #[test]
    fn horizon_parsing() {
        assert_eq!(Horizon::parse("2 years").unwrap(), Horizon::months(24));
        assert_eq!(Horizon::parse("1 year").unwrap().steps(), 12);
        assert_eq!(Horizon::parse(" 24 months ").unwrap().steps(), 24);
        assert_eq!("6 quarters".parse::<Horizon>().unwrap().steps(), 18);
        assert_eq!(Horizon::parse("24").unwrap().steps(), 24);
        assert!(matches!(Horizon::parse("2 decades"), Err(ForecastError::Parse(_))));
        assert!(matches!(Horizon::parse("two years"), Err(ForecastError::Parse(_))));
        assert!(matches!(
            Horizon::parse("0 years"),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn oversized_horizon_is_a_parse_error() {
        let years = usize::MAX / 6;
        assert!(matches!(
            Horizon::parse(&format!("{} years", years)),
            Err(ForecastError::Parse(_))
        ));
        assert_eq!(
            Horizon::parse(&format!("{} months", usize::MAX)).unwrap().steps(),
            usize::MAX
        );
    }

    #[test]
    fn forecast_has_h_rows_per_series_and_model() {
        let mable = retail_mable(&["Victoria", "Tasmania"], 72);
        let fable = forecast(&mable, Horizon::months(24)).unwrap();
        assert_eq!(fable.n_rows(), 2 * 3 * 24);

        let first = &fable.rows()[0];
        assert_eq!(first.month, YearMonth::new(2006, 1).unwrap());
        assert_eq!(fable.rows()[23].month, YearMonth::new(2007, 12).unwrap());
        assert!(matches!(first.distribution, Distribution::Transformed { .. }));
        assert!(fable.to_string().contains("# Key:     State, Industry, .model [6]"));
    }

    #[test]
    fn hilo_bounds_bracket_the_mean() {
        let mable = retail_mable(&["Victoria"], 96);
        let hilo = forecast(&mable, Horizon::parse("2 years").unwrap())
            .unwrap()
            .hilo(95.0)
            .unwrap();
        for (row, interval) in hilo.fable().rows().iter().zip(hilo.hilos()) {
            assert!(interval.lower <= row.mean() && row.mean() <= interval.upper);
            assert!(interval.lower > 0.0);
        }
        assert_eq!(hilo.hilo_column(), "95%");
        let frame = hilo.to_data_frame().unwrap();
        assert!(frame.has_column("95%"));
    }

    #[test]
    fn unpack_splits_interval_columns() {
        let mable = retail_mable(&["Victoria"], 48);
        let hilo = forecast(&mable, Horizon::months(12))
            .unwrap()
            .hilo(95.0)
            .unwrap();
        let frame = hilo.unpack("95%").unwrap();
        assert_eq!(
            frame.column_names(),
            vec![
                "State",
                "Industry",
                ".model",
                "Month",
                "Turnover",
                ".mean",
                "95%_lower",
                "95%_upper"
            ]
        );
        assert_eq!(frame.n_rows(), 36);
        assert!(matches!(hilo.unpack("80%"), Err(ForecastError::Schema(_))));
    }

    #[test]
    fn null_models_forecast_missing_rows() {
        let data = retail_tsibble(&["Victoria"], 48, 12);
        let frame = data.to_data_frame();
        let mut turnover = frame.column("Turnover").unwrap().as_float().unwrap().to_vec();
        turnover[5] = 0.0;
        let frame = frame
            .replace_column(Column::float("Turnover", turnover))
            .unwrap();
        let data =
            crate::table::Tsibble::from_data_frame(frame, "Month", &["State", "Industry"]).unwrap();
        let defs = vec![
            ModelDefinition::parse("arima = ARIMA(log(Turnover))").unwrap(),
            ModelDefinition::parse("snaive = SNAIVE(Turnover)").unwrap(),
        ];
        let mable = model(&data, &defs).unwrap();
        assert_eq!(mable.n_null(), 1);

        let fable = forecast(&mable, Horizon::months(6)).unwrap();
        assert_eq!(fable.n_rows(), 2 * 6);
        let arima: Vec<&FableRow> = fable.rows().iter().filter(|r| r.model == "arima").collect();
        assert_eq!(arima.len(), 6);
        assert!(arima.iter().all(|r| r.distribution.is_missing() && r.mean().is_nan()));
        assert_eq!(arima[0].month, YearMonth::new(2004, 1).unwrap());

        let unpacked = fable.hilo(95.0).unwrap().unpack("95%").unwrap();
        let lower = unpacked.column("95%_lower").unwrap().as_float().unwrap();
        let models = unpacked.column(".model").unwrap().as_text().unwrap();
        for (model, lower) in models.iter().zip(lower) {
            assert_eq!(model == "arima", lower.is_nan());
        }
    }

    #[test]
    fn invalid_level_is_rejected() {
        let mable = retail_mable(&["Victoria"], 36);
        let fable = forecast(&mable, Horizon::months(3)).unwrap();
        assert!(fable.hilo(100.0).is_err());
        assert!(fable.hilo(0.0).is_err());
    }
}
