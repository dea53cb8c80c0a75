//! A plain columnar table with no temporal or key semantics.

use std::collections::HashSet;
use std::fmt;

use crate::error::{ForecastError, Result};
use crate::table::column::Column;

/// Rows shown by `Display` before the remainder is summarised.
const DISPLAY_ROWS: usize = 10;

/// Ordered, uniquely named, equal-length columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataFrame {
    columns: Vec<Column>,
}

impl DataFrame {
    /// Create a data frame, validating names and lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(ForecastError::Schema(format!(
                    "duplicate column name `{}`",
                    column.name()
                )));
            }
        }
        if let Some(first) = columns.first() {
            for column in &columns[1..] {
                if column.len() != first.len() {
                    return Err(ForecastError::DimensionMismatch {
                        expected: first.len(),
                        got: column.len(),
                    });
                }
            }
        }
        Ok(Self { columns })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.position(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| ForecastError::Schema(format!("no column named `{}`", name)))
    }

    /// Keep the named columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<DataFrame> {
        let columns = names
            .iter()
            .map(|name| self.column(name.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        DataFrame::new(columns)
    }

    /// Keep rows whose text value in `column` is one of `values`.
    pub fn filter_in<S: AsRef<str>>(&self, column: &str, values: &[S]) -> Result<DataFrame> {
        let wanted: HashSet<&str> = values.iter().map(AsRef::as_ref).collect();
        let mask: Vec<bool> = self
            .column(column)?
            .as_text()?
            .iter()
            .map(|v| wanted.contains(v.as_str()))
            .collect();
        self.filter_rows(&mask)
    }

    /// Keep rows where `mask` is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<DataFrame> {
        if mask.len() != self.n_rows() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.n_rows(),
                got: mask.len(),
            });
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        Ok(self.take_unchecked(&indices))
    }

    /// Gather rows by position.
    pub fn take(&self, indices: &[usize]) -> Result<DataFrame> {
        let n = self.n_rows();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(ForecastError::IndexOutOfBounds {
                index: bad,
                size: n,
            });
        }
        Ok(self.take_unchecked(indices))
    }

    pub(crate) fn take_unchecked(&self, indices: &[usize]) -> DataFrame {
        DataFrame {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
        }
    }

    /// Swap in a column with the same name as an existing one.
    pub fn replace_column(&self, column: Column) -> Result<DataFrame> {
        let pos = self.position(column.name()).ok_or_else(|| {
            ForecastError::Schema(format!("no column named `{}`", column.name()))
        })?;
        if column.len() != self.n_rows() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.n_rows(),
                got: column.len(),
            });
        }
        let mut columns = self.columns.clone();
        columns[pos] = column;
        Ok(DataFrame { columns })
    }

    /// Append a column, or replace the existing one of the same name.
    pub fn with_column(&self, column: Column) -> Result<DataFrame> {
        if self.has_column(column.name()) {
            return self.replace_column(column);
        }
        let mut columns = self.columns.clone();
        columns.push(column);
        DataFrame::new(columns)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<DataFrame> {
        let column = self.column(from)?.clone().renamed(to);
        let mut columns = self.columns.clone();
        if let Some(pos) = self.position(from) {
            columns[pos] = column;
        }
        DataFrame::new(columns)
    }

    /// Cells of one row as display strings.
    pub fn row_display(&self, row: usize) -> Result<Vec<String>> {
        if row >= self.n_rows() {
            return Err(ForecastError::IndexOutOfBounds {
                index: row,
                size: self.n_rows(),
            });
        }
        Ok(self.columns.iter().map(|c| c.cell_display(row)).collect())
    }

    pub(crate) fn fmt_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.n_rows().min(DISPLAY_ROWS);
        let mut cells: Vec<Vec<String>> = vec![
            self.columns.iter().map(|c| c.name().to_string()).collect(),
            self.columns
                .iter()
                .map(|c| format!("<{}>", c.column_type()))
                .collect(),
        ];
        for row in 0..shown {
            cells.push(self.columns.iter().map(|c| c.cell_display(row)).collect());
        }

        let widths: Vec<usize> = (0..self.n_cols())
            .map(|j| cells.iter().map(|r| r[j].chars().count()).max().unwrap_or(0))
            .collect();
        let row_label_width = shown.to_string().len();

        for (i, row) in cells.iter().enumerate() {
            let label = if i >= 2 {
                (i - 1).to_string()
            } else {
                String::new()
            };
            write!(f, "{:>w$}", label, w = row_label_width)?;
            for (cell, width) in row.iter().zip(&widths) {
                write!(f, " {:>w$}", cell, w = *width)?;
            }
            writeln!(f)?;
        }
        if self.n_rows() > shown {
            writeln!(f, "# ℹ {} more rows", self.n_rows() - shown)?;
        }
        Ok(())
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# A data frame: {} x {}", self.n_rows(), self.n_cols())?;
        self.fmt_body(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Column::text("State", vec!["Victoria", "Tasmania", "Victoria"]),
            Column::text("Industry", vec!["Food", "Food", "Takeaway"]),
            Column::float("Turnover", vec![10.0, 2.0, 4.5]),
        ])
        .unwrap()
    }

    #[test]
    fn new_rejects_duplicate_names_and_ragged_columns() {
        let dup = DataFrame::new(vec![
            Column::float("x", vec![1.0]),
            Column::float("x", vec![2.0]),
        ]);
        assert!(matches!(dup, Err(ForecastError::Schema(_))));

        let ragged = DataFrame::new(vec![
            Column::float("x", vec![1.0]),
            Column::float("y", vec![1.0, 2.0]),
        ]);
        assert!(matches!(
            ragged,
            Err(ForecastError::DimensionMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn filter_in_keeps_matching_rows() {
        let df = sample().filter_in("State", &["Victoria"]).unwrap();
        assert_eq!(df.n_rows(), 2);
        assert_eq!(
            df.column("Turnover").unwrap().as_float().unwrap(),
            &[10.0, 4.5]
        );
    }

    #[test]
    fn filter_in_requires_text_column() {
        let err = sample().filter_in("Turnover", &["1"]).unwrap_err();
        assert!(matches!(err, ForecastError::TypeMismatch { .. }));
    }

    #[test]
    fn select_reorders_columns() {
        let df = sample().select(&["Turnover", "State"]).unwrap();
        assert_eq!(df.column_names(), vec!["Turnover", "State"]);
        assert!(sample().select(&["Missing"]).is_err());
    }

    #[test]
    fn rename_and_with_column() {
        let df = sample().rename("Turnover", "value").unwrap();
        assert!(df.has_column("value"));
        assert!(!df.has_column("Turnover"));

        let df = df
            .with_column(Column::float("extra", vec![0.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(df.n_cols(), 4);
        assert!(df
            .replace_column(Column::float("extra", vec![1.0]))
            .is_err());
    }

    #[test]
    fn take_checks_bounds() {
        let df = sample();
        assert_eq!(df.take(&[2]).unwrap().n_rows(), 1);
        assert!(matches!(
            df.take(&[3]),
            Err(ForecastError::IndexOutOfBounds { index: 3, size: 3 })
        ));
    }

    #[test]
    fn display_has_header_and_types() {
        let text = sample().to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("# A data frame: 3 x 3"));
        assert!(text.contains("<chr>"));
        assert!(text.contains("<dbl>"));
        assert!(text.contains("Tasmania"));
        assert_eq!(sample().row_display(1).unwrap()[0], "Tasmania");
    }
}
