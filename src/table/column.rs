//! Typed columns of a data frame.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::core::{format_datetime, signif, YearMonth};
use crate::error::{ForecastError, Result};

/// Logical type tag of a column, shown under the header when printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Float,
    DateTime,
    YearMonth,
}

impl ColumnType {
    /// Short tag used in table headers.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            ColumnType::Text => "chr",
            ColumnType::Float => "dbl",
            ColumnType::DateTime => "dttm",
            ColumnType::YearMonth => "mth",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Column storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<String>),
    Float(Vec<f64>),
    DateTime(Vec<DateTime<Utc>>),
    YearMonth(Vec<YearMonth>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
            ColumnData::YearMonth(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Text(_) => ColumnType::Text,
            ColumnData::Float(_) => ColumnType::Float,
            ColumnData::DateTime(_) => ColumnType::DateTime,
            ColumnData::YearMonth(_) => ColumnType::YearMonth,
        }
    }

    fn take(&self, indices: &[usize]) -> ColumnData {
        fn gather<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().map(|&i| values[i].clone()).collect()
        }
        match self {
            ColumnData::Text(v) => ColumnData::Text(gather(v, indices)),
            ColumnData::Float(v) => ColumnData::Float(gather(v, indices)),
            ColumnData::DateTime(v) => ColumnData::DateTime(gather(v, indices)),
            ColumnData::YearMonth(v) => ColumnData::YearMonth(gather(v, indices)),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn float(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, ColumnData::Float(values))
    }

    pub fn datetime(name: impl Into<String>, values: Vec<DateTime<Utc>>) -> Self {
        Self::new(name, ColumnData::DateTime(values))
    }

    pub fn year_month(name: impl Into<String>, values: Vec<YearMonth>) -> Self {
        Self::new(name, ColumnData::YearMonth(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn mismatch(&self, expected: ColumnType) -> ForecastError {
        ForecastError::TypeMismatch {
            column: self.name.clone(),
            expected: expected.abbreviation().to_string(),
            got: self.column_type().abbreviation().to_string(),
        }
    }

    pub fn as_text(&self) -> Result<&[String]> {
        match &self.data {
            ColumnData::Text(v) => Ok(v),
            _ => Err(self.mismatch(ColumnType::Text)),
        }
    }

    pub fn as_float(&self) -> Result<&[f64]> {
        match &self.data {
            ColumnData::Float(v) => Ok(v),
            _ => Err(self.mismatch(ColumnType::Float)),
        }
    }

    pub fn as_datetime(&self) -> Result<&[DateTime<Utc>]> {
        match &self.data {
            ColumnData::DateTime(v) => Ok(v),
            _ => Err(self.mismatch(ColumnType::DateTime)),
        }
    }

    pub fn as_year_month(&self) -> Result<&[YearMonth]> {
        match &self.data {
            ColumnData::YearMonth(v) => Ok(v),
            _ => Err(self.mismatch(ColumnType::YearMonth)),
        }
    }

    /// Gather rows by position. Indices must be in range.
    pub fn take(&self, indices: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            data: self.data.take(indices),
        }
    }

    /// Render one cell for display or CSV output. Missing floats print as `NA`.
    pub fn cell_display(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Text(v) => v[row].clone(),
            ColumnData::Float(v) => {
                let x = v[row];
                if x.is_nan() {
                    "NA".to_string()
                } else {
                    signif(x, 4)
                }
            }
            ColumnData::DateTime(v) => format_datetime(&v[row]),
            ColumnData::YearMonth(v) => v[row].to_string(),
        }
    }

    /// Render one cell losslessly, for CSV output.
    pub fn cell_raw(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Float(v) if v[row].is_nan() => String::new(),
            ColumnData::Float(v) => v[row].to_string(),
            _ => self.cell_display(row),
        }
    }
}
