//! Keyed, monthly indexed tables.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use crate::core::{TimeSeries, YearMonth};
use crate::error::{ForecastError, Result};
use crate::table::column::{Column, ColumnType};
use crate::table::frame::DataFrame;

/// Values of the key columns identifying one series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey(Vec<String>);

impl SeriesKey {
    pub fn new<S: Into<String>>(values: Vec<S>) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// A data frame tagged with a `YearMonth` index and text key columns.
///
/// Rows are sorted by key then index, and every (key, index) pair is
/// unique. Rows of one key are contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct Tsibble {
    frame: DataFrame,
    index: String,
    keys: Vec<String>,
    groups: Vec<(SeriesKey, Range<usize>)>,
}

impl Tsibble {
    /// Tag `frame` with an index and keys, validating the invariants.
    pub fn from_data_frame<S: AsRef<str>>(
        frame: DataFrame,
        index: &str,
        keys: &[S],
    ) -> Result<Self> {
        let keys: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();

        let index_column = frame.column(index)?;
        if index_column.column_type() != ColumnType::YearMonth {
            return Err(ForecastError::TypeMismatch {
                column: index.to_string(),
                expected: ColumnType::YearMonth.abbreviation().to_string(),
                got: index_column.column_type().abbreviation().to_string(),
            });
        }
        for (i, key) in keys.iter().enumerate() {
            if key == index || keys[..i].contains(key) {
                return Err(ForecastError::Schema(format!(
                    "key `{}` is repeated or is the index",
                    key
                )));
            }
            frame.column(key)?.as_text()?;
        }

        let months = index_column.as_year_month()?;
        let key_columns = keys
            .iter()
            .map(|k| frame.column(k).and_then(Column::as_text))
            .collect::<Result<Vec<_>>>()?;
        let compare_keys = |a: usize, b: usize| {
            key_columns
                .iter()
                .map(|col| col[a].cmp(&col[b]))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        };

        let mut order: Vec<usize> = (0..frame.n_rows()).collect();
        order.sort_by(|&a, &b| compare_keys(a, b).then(months[a].cmp(&months[b])));

        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if compare_keys(a, b) == Ordering::Equal && months[a] == months[b] {
                let key = SeriesKey::new(key_columns.iter().map(|c| c[a].clone()).collect());
                return Err(ForecastError::DuplicateKey {
                    key: key.to_string(),
                    index: months[a].to_string(),
                });
            }
        }

        let mut groups: Vec<(SeriesKey, Range<usize>)> = Vec::new();
        for (pos, &row) in order.iter().enumerate() {
            let starts_group = pos == 0 || compare_keys(order[pos - 1], row) != Ordering::Equal;
            if starts_group {
                let key = SeriesKey::new(key_columns.iter().map(|c| c[row].clone()).collect());
                groups.push((key, pos..pos + 1));
            } else if let Some((_, range)) = groups.last_mut() {
                range.end = pos + 1;
            }
        }

        Ok(Self {
            frame: frame.take_unchecked(&order),
            index: index.to_string(),
            keys,
            groups,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn key_names(&self) -> &[String] {
        &self.keys
    }

    /// Distinct keys in sorted order.
    pub fn keys(&self) -> Vec<&SeriesKey> {
        self.groups.iter().map(|(k, _)| k).collect()
    }

    pub fn n_keys(&self) -> usize {
        self.groups.len()
    }

    pub fn n_rows(&self) -> usize {
        self.frame.n_rows()
    }

    /// Spacing of the index; monthly tables only.
    pub fn interval(&self) -> &'static str {
        "1M"
    }

    /// Borrow the underlying frame.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Drop the index and key tags.
    pub fn to_data_frame(&self) -> DataFrame {
        self.frame.clone()
    }

    pub fn into_data_frame(self) -> DataFrame {
        self.frame
    }

    fn rows_of(&self, key: &SeriesKey) -> Result<Range<usize>> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, range)| range.clone())
            .ok_or_else(|| ForecastError::Schema(format!("no series with key `{}`", key)))
    }

    fn months(&self) -> Result<&[YearMonth]> {
        self.frame.column(&self.index)?.as_year_month()
    }

    /// Index values of one series, ascending.
    pub fn months_of(&self, key: &SeriesKey) -> Result<&[YearMonth]> {
        let rows = self.rows_of(key)?;
        Ok(&self.months()?[rows])
    }

    pub fn last_month(&self, key: &SeriesKey) -> Result<YearMonth> {
        self.months_of(key)?
            .last()
            .copied()
            .ok_or(ForecastError::EmptyData)
    }

    /// Whether any series skips a month.
    pub fn has_gaps(&self) -> Result<bool> {
        let months = self.months()?;
        Ok(self
            .groups
            .iter()
            .any(|(_, rows)| has_gap(&months[rows.clone()])))
    }

    /// Extract the `measure` column of one series as a time series.
    ///
    /// Fails if the series has implicit gaps in its index.
    pub fn series(&self, key: &SeriesKey, measure: &str) -> Result<TimeSeries> {
        let rows = self.rows_of(key)?;
        let months = &self.months()?[rows.clone()];
        if has_gap(months) {
            return Err(ForecastError::TimestampError(format!(
                "series `{}` has implicit gaps in `{}`",
                key, self.index
            )));
        }
        let values = self.frame.column(measure)?.as_float()?[rows].to_vec();
        let timestamps = months
            .iter()
            .map(YearMonth::to_datetime)
            .collect::<Result<Vec<_>>>()?;
        Ok(TimeSeries::univariate(timestamps, values)?.with_label(key.to_string()))
    }

    /// Keep rows whose text value in `column` is one of `values`.
    pub fn filter_in<S: AsRef<str>>(&self, column: &str, values: &[S]) -> Result<Tsibble> {
        let frame = self.frame.filter_in(column, values)?;
        Tsibble::from_data_frame(frame, &self.index, &self.keys)
    }

    /// Keep rows with `start <= index <= end`; open bounds are `None`.
    pub fn filter_index(
        &self,
        start: Option<YearMonth>,
        end: Option<YearMonth>,
    ) -> Result<Tsibble> {
        let mask: Vec<bool> = self
            .months()?
            .iter()
            .map(|m| start.map_or(true, |s| *m >= s) && end.map_or(true, |e| *m <= e))
            .collect();
        let frame = self.frame.filter_rows(&mask)?;
        Tsibble::from_data_frame(frame, &self.index, &self.keys)
    }
}

fn has_gap(months: &[YearMonth]) -> bool {
    months.windows(2).any(|w| w[0].months_until(w[1]) != 1)
}

impl fmt::Display for Tsibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# A tsibble: {} x {} [{}]",
            self.frame.n_rows(),
            self.frame.n_cols(),
            self.interval()
        )?;
        writeln!(f, "# Key:       {} [{}]", self.keys.join(", "), self.n_keys())?;
        self.frame.fmt_body(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn frame(months: Vec<YearMonth>, states: Vec<&str>) -> DataFrame {
        let n = months.len();
        DataFrame::new(vec![
            Column::text("State", states),
            Column::year_month("Month", months),
            Column::float("Turnover", (0..n).map(|i| i as f64).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn rows_are_sorted_by_key_then_index() {
        let df = frame(
            vec![ym(2000, 2), ym(2000, 1), ym(2000, 1)],
            vec!["b", "b", "a"],
        );
        let ts = Tsibble::from_data_frame(df, "Month", &["State"]).unwrap();
        let states = ts.frame().column("State").unwrap().as_text().unwrap();
        assert_eq!(states, &["a", "b", "b"]);
        let months = ts.months_of(&SeriesKey::new(vec!["b"])).unwrap();
        assert_eq!(months, &[ym(2000, 1), ym(2000, 2)]);
        assert_eq!(ts.n_keys(), 2);
    }

    #[test]
    fn duplicate_key_index_pairs_are_rejected() {
        let df = frame(vec![ym(2000, 1), ym(2000, 1)], vec!["a", "a"]);
        let err = Tsibble::from_data_frame(df, "Month", &["State"]).unwrap_err();
        assert_eq!(
            err,
            ForecastError::DuplicateKey {
                key: "a".to_string(),
                index: "2000 Jan".to_string(),
            }
        );
    }

    #[test]
    fn index_must_be_year_month() {
        let df = DataFrame::new(vec![
            Column::text("State", vec!["a"]),
            Column::float("Month", vec![1.0]),
        ])
        .unwrap();
        assert!(matches!(
            Tsibble::from_data_frame(df, "Month", &["State"]),
            Err(ForecastError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn series_extracts_values_in_order() {
        let df = frame(
            vec![ym(2000, 3), ym(2000, 1), ym(2000, 2)],
            vec!["a", "a", "a"],
        );
        let ts = Tsibble::from_data_frame(df, "Month", &["State"]).unwrap();
        let key = SeriesKey::new(vec!["a"]);
        let series = ts.series(&key, "Turnover").unwrap();
        assert_eq!(series.values(), &[1.0, 2.0, 0.0]);
        assert_eq!(series.label(), Some("a"));
        assert_eq!(ts.last_month(&key).unwrap(), ym(2000, 3));
    }

    #[test]
    fn series_with_gap_is_an_error() {
        let df = frame(vec![ym(2000, 1), ym(2000, 3)], vec!["a", "a"]);
        let ts = Tsibble::from_data_frame(df, "Month", &["State"]).unwrap();
        assert!(ts.has_gaps().unwrap());
        assert!(ts.series(&SeriesKey::new(vec!["a"]), "Turnover").is_err());
    }

    #[test]
    fn filter_index_is_inclusive() {
        let df = frame(
            vec![ym(2000, 1), ym(2000, 2), ym(2000, 3)],
            vec!["a", "a", "a"],
        );
        let ts = Tsibble::from_data_frame(df, "Month", &["State"]).unwrap();
        let filtered = ts
            .filter_index(Some(ym(2000, 2)), Some(ym(2000, 3)))
            .unwrap();
        assert_eq!(filtered.n_rows(), 2);
        assert_eq!(ts.filter_index(None, Some(ym(2000, 1))).unwrap().n_rows(), 1);
    }

    #[test]
    fn display_shows_tsibble_header() {
        let df = frame(vec![ym(2000, 1)], vec!["a"]);
        let ts = Tsibble::from_data_frame(df, "Month", &["State"]).unwrap();
        let text = ts.to_string();
        assert!(text.starts_with("# A tsibble: 1 x 3 [1M]"));
        assert!(text.contains("# Key:       State [1]"));
    }
}
