//! Model tables: one row per series key, one fitted model per definition.

use std::fmt;

use tracing::{debug, warn};

use crate::core::{TimeSeries, YearMonth};
use crate::error::{ForecastError, Result};
use crate::fable::formula::ModelDefinition;
use crate::models::BoxedForecaster;
use crate::table::{Column, DataFrame, SeriesKey, Tsibble};
use crate::transform::Transformation;

/// Seasonal period of monthly data.
pub const MONTHLY_PERIOD: usize = 12;

/// A model fitted to one series, on the transformed scale.
#[derive(Debug)]
pub struct FittedModel {
    model: BoxedForecaster,
    transformation: Transformation,
    last_month: YearMonth,
}

impl FittedModel {
    pub fn model(&self) -> &BoxedForecaster {
        &self.model
    }

    pub fn transformation(&self) -> Transformation {
        self.transformation
    }

    /// Last observed month of the training series.
    pub fn last_month(&self) -> YearMonth {
        self.last_month
    }

    /// Fitted specification, e.g. `ETS(M,A,M)`.
    pub fn spec(&self) -> String {
        self.model.spec_name()
    }
}

/// One cell of a mable.
#[derive(Debug)]
pub enum ModelCell {
    Fitted(FittedModel),
    /// The model could not be fitted; its forecasts are missing.
    Null {
        reason: String,
        /// Last observed month of the series.
        last_month: YearMonth,
    },
}

impl ModelCell {
    pub fn fitted(&self) -> Option<&FittedModel> {
        match self {
            ModelCell::Fitted(m) => Some(m),
            ModelCell::Null { .. } => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ModelCell::Null { .. })
    }

    /// Last observed month of the series the cell was fitted to.
    pub fn last_month(&self) -> YearMonth {
        match self {
            ModelCell::Fitted(m) => m.last_month(),
            ModelCell::Null { last_month, .. } => *last_month,
        }
    }
}

impl fmt::Display for ModelCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelCell::Fitted(m) => write!(f, "<{}>", m.spec()),
            ModelCell::Null { .. } => f.write_str("<NULL model>"),
        }
    }
}

/// Model table.
#[derive(Debug)]
pub struct Mable {
    key_names: Vec<String>,
    index: String,
    definitions: Vec<ModelDefinition>,
    rows: Vec<(SeriesKey, Vec<ModelCell>)>,
}

/// Fit every definition to every series of `data`.
///
/// Fit failures, including responses outside the domain of the
/// transformation, become null models with a warning.
pub fn model(data: &Tsibble, definitions: &[ModelDefinition]) -> Result<Mable> {
    if definitions.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "at least one model definition is required".to_string(),
        ));
    }
    for (i, def) in definitions.iter().enumerate() {
        if definitions[..i].iter().any(|d| d.name() == def.name()) {
            return Err(ForecastError::Schema(format!(
                "model name `{}` is used twice",
                def.name()
            )));
        }
        if data.key_names().iter().any(|k| k == def.name()) {
            return Err(ForecastError::Schema(format!(
                "model name `{}` clashes with a key column",
                def.name()
            )));
        }
    }

    let mut rows = Vec::with_capacity(data.n_keys());
    for key in data.keys() {
        let last_month = data.last_month(key)?;
        let mut cells = Vec::with_capacity(definitions.len());
        for def in definitions {
            let series = data.series(key, def.response())?;
            let cell = match fit_one(def, &series, last_month) {
                Ok(fitted) => {
                    debug!(key = %key, model = def.name(), spec = %fitted.spec(), "fitted model");
                    ModelCell::Fitted(fitted)
                }
                Err(e) => {
                    warn!(key = %key, model = def.name(), error = %e, "model fit failed, using a null model");
                    ModelCell::Null {
                        reason: e.to_string(),
                        last_month,
                    }
                }
            };
            cells.push(cell);
        }
        rows.push((key.clone(), cells));
    }

    Ok(Mable {
        key_names: data.key_names().to_vec(),
        index: data.index_name().to_string(),
        definitions: definitions.to_vec(),
        rows,
    })
}

fn fit_one(
    def: &ModelDefinition,
    series: &TimeSeries,
    last_month: YearMonth,
) -> Result<FittedModel> {
    let transformation = def.transformation();
    let values = transformation.apply(series.values())?;
    let transformed = TimeSeries::univariate(series.timestamps().to_vec(), values)?;

    let mut model = def.build(MONTHLY_PERIOD);
    model.fit(&transformed)?;
    Ok(FittedModel {
        model,
        transformation,
        last_month,
    })
}

impl Mable {
    pub fn key_names(&self) -> &[String] {
        &self.key_names
    }

    /// Name of the index column of the training data.
    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn definitions(&self) -> &[ModelDefinition] {
        &self.definitions
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.definitions.iter().map(ModelDefinition::name).collect()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[(SeriesKey, Vec<ModelCell>)] {
        &self.rows
    }

    /// The cell for one series and model name.
    pub fn cell(&self, key: &SeriesKey, model: &str) -> Option<&ModelCell> {
        let col = self.definitions.iter().position(|d| d.name() == model)?;
        self.rows
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, cells)| &cells[col])
    }

    /// Number of null models.
    pub fn n_null(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|(_, cells)| cells)
            .filter(|c| c.is_null())
            .count()
    }

    /// One row per fitted model: keys, `.model`, `spec`, `sigma2`, `AICc`.
    ///
    /// `sigma2` is on the transformed scale; models without a likelihood
    /// report a missing `AICc`.
    pub fn glance(&self) -> Result<DataFrame> {
        let mut keys: Vec<Vec<String>> = vec![Vec::new(); self.key_names.len()];
        let (mut names, mut specs, mut sigma2, mut aicc) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new());

        for (key, cells) in &self.rows {
            for (def, cell) in self.definitions.iter().zip(cells) {
                let Some(fitted) = cell.fitted() else {
                    continue;
                };
                for (col, value) in keys.iter_mut().zip(key.values()) {
                    col.push(value.clone());
                }
                names.push(def.name().to_string());
                specs.push(fitted.spec());
                sigma2.push(fitted.model().sigma2().unwrap_or(f64::NAN));
                aicc.push(fitted.model().aicc().unwrap_or(f64::NAN));
            }
        }

        let mut columns: Vec<Column> = self
            .key_names
            .iter()
            .zip(keys)
            .map(|(name, values)| Column::text(name.as_str(), values))
            .collect();
        columns.push(Column::text(".model", names));
        columns.push(Column::text("spec", specs));
        columns.push(Column::float("sigma2", sigma2));
        columns.push(Column::float("AICc", aicc));
        DataFrame::new(columns)
    }

    /// The table as text columns, one per key and model.
    fn display_frame(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = self
            .key_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Column::text(
                    name.as_str(),
                    self.rows
                        .iter()
                        .map(|(k, _)| k.values()[i].clone())
                        .collect(),
                )
            })
            .collect();
        for (j, def) in self.definitions.iter().enumerate() {
            columns.push(Column::text(
                def.name(),
                self.rows
                    .iter()
                    .map(|(_, cells)| cells[j].to_string())
                    .collect(),
            ));
        }
        DataFrame::new(columns)
    }
}

impl fmt::Display for Mable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.display_frame().map_err(|_| fmt::Error)?;
        writeln!(f, "# A mable: {} x {}", frame.n_rows(), frame.n_cols())?;
        writeln!(f, "# Key:     {} [{}]", self.key_names.join(", "), self.n_rows())?;
        frame.fmt_body(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fable::test_support::retail_tsibble;

    fn definitions() -> Vec<ModelDefinition> {
        [
            "ets = ETS(box_cox(Turnover, 0.3))",
            "arima = ARIMA(log(Turnover))",
            "snaive = SNAIVE(Turnover)",
        ]
        .iter()
        .map(|s| ModelDefinition::parse(s).unwrap())
        .collect()
    }

    #[test]
    fn model_fits_every_definition_per_key() {
        let data = retail_tsibble(&["Victoria", "Tasmania"], 72, 1);
        let mable = model(&data, &definitions()).unwrap();

        assert_eq!(mable.n_rows(), 2);
        assert_eq!(mable.model_names(), vec!["ets", "arima", "snaive"]);
        assert_eq!(mable.n_null(), 0);

        let key = SeriesKey::new(vec!["Victoria", "Department stores"]);
        let ets = mable.cell(&key, "ets").unwrap().fitted().unwrap();
        assert!(ets.spec().starts_with("ETS("));
        assert_eq!(ets.transformation(), Transformation::BoxCox { lambda: 0.3 });
        assert_eq!(ets.last_month(), YearMonth::new(2005, 12).unwrap());
        assert_eq!(
            mable.cell(&key, "snaive").unwrap().to_string(),
            "<SNAIVE>"
        );
    }

    #[test]
    fn non_positive_response_gives_null_log_model() {
        let data = retail_tsibble(&["Victoria"], 48, 2);
        let frame = data.to_data_frame();
        let turnover: Vec<f64> = frame.column("Turnover").unwrap().as_float().unwrap().to_vec();
        let mut shifted = turnover.clone();
        shifted[10] = -1.0;
        let frame = frame
            .replace_column(Column::float("Turnover", shifted))
            .unwrap();
        let data = Tsibble::from_data_frame(frame, "Month", &["State", "Industry"]).unwrap();

        let mable = model(&data, &definitions()).unwrap();
        assert_eq!(mable.n_null(), 2);
        let key = SeriesKey::new(vec!["Victoria", "Department stores"]);
        let arima = mable.cell(&key, "arima").unwrap();
        assert!(arima.is_null());
        assert_eq!(arima.last_month(), YearMonth::new(2003, 12).unwrap());
        assert!(!mable.cell(&key, "snaive").unwrap().is_null());
        assert_eq!(mable.glance().unwrap().n_rows(), 1);
    }

    #[test]
    fn glance_reports_one_row_per_fitted_model() {
        let data = retail_tsibble(&["Victoria"], 60, 3);
        let glance = model(&data, &definitions()).unwrap().glance().unwrap();
        assert_eq!(
            glance.column_names(),
            vec!["State", "Industry", ".model", "spec", "sigma2", "AICc"]
        );
        assert_eq!(glance.n_rows(), 3);
        let aicc = glance.column("AICc").unwrap().as_float().unwrap();
        assert!(aicc[0].is_finite() && aicc[1].is_finite());
        assert!(aicc[2].is_nan());
    }

    #[test]
    fn duplicate_model_names_are_rejected() {
        let data = retail_tsibble(&["Victoria"], 36, 4);
        let defs = vec![
            ModelDefinition::parse("m = SNAIVE(Turnover)").unwrap(),
            ModelDefinition::parse("m = ETS(Turnover)").unwrap(),
        ];
        assert!(matches!(model(&data, &defs), Err(ForecastError::Schema(_))));
        assert!(matches!(
            model(&data, &[]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn display_shows_header_and_cells() {
        let data = retail_tsibble(&["Victoria"], 36, 5);
        let defs = vec![ModelDefinition::parse("snaive = SNAIVE(Turnover)").unwrap()];
        let text = model(&data, &defs).unwrap().to_string();
        assert!(text.starts_with("# A mable: 1 x 3\n# Key:     State, Industry [1]"));
        assert!(text.contains("<SNAIVE>"));
    }
}
