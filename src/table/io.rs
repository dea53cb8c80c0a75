//! CSV reading and writing for data frames.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::core::{parse_datetime, YearMonth};
use crate::error::{ForecastError, Result};
use crate::table::column::{Column, ColumnData};
use crate::table::frame::DataFrame;

/// Read a CSV with a header row, inferring a type per column.
///
/// A column becomes `Float` when every non-empty cell parses as a number
/// (empty and `NA` cells become NaN), then `DateTime`, then `YearMonth`
/// when every cell parses as one; anything else is `Text`.
pub fn read_csv<R: Read>(reader: R) -> Result<DataFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.is_empty() {
        return Err(ForecastError::Schema("CSV has no header row".to_string()));
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(ForecastError::Csv(format!(
                "line {}: expected {} fields, got {}",
                line + 2,
                headers.len(),
                record.len()
            )));
        }
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, infer_column(values)))
        .collect();
    let frame = DataFrame::new(columns)?;
    debug!(rows = frame.n_rows(), cols = frame.n_cols(), "read csv");
    Ok(frame)
}

/// Read a CSV file from disk.
pub fn read_csv_path(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ForecastError::Io(format!("failed to open `{}`: {}", path.display(), e))
    })?;
    read_csv(file)
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell == "NA"
}

fn infer_column(values: Vec<String>) -> ColumnData {
    let present = values.iter().filter(|v| !is_missing(v)).count();
    if present == 0 {
        return ColumnData::Text(values);
    }

    if values
        .iter()
        .filter(|v| !is_missing(v))
        .all(|v| v.parse::<f64>().is_ok())
    {
        let floats = values
            .iter()
            .map(|v| v.parse::<f64>().unwrap_or(f64::NAN))
            .collect();
        return ColumnData::Float(floats);
    }

    // Temporal columns may not have gaps.
    if present == values.len() {
        if let Some(datetimes) = values
            .iter()
            .map(|v| parse_datetime(v))
            .collect::<Option<Vec<_>>>()
        {
            return ColumnData::DateTime(datetimes);
        }
        if let Ok(months) = values
            .iter()
            .map(|v| v.parse::<YearMonth>())
            .collect::<Result<Vec<_>>>()
        {
            return ColumnData::YearMonth(months);
        }
    }

    ColumnData::Text(values)
}

/// Write a data frame as CSV with a header row.
pub fn write_csv<W: Write>(frame: &DataFrame, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(frame.column_names())?;
    for row in 0..frame.n_rows() {
        writer.write_record(frame.columns().iter().map(|c| c.cell_raw(row)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a data frame to a CSV file, replacing any existing file.
pub fn write_csv_path(frame: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        ForecastError::Io(format!("failed to create `{}`: {}", path.display(), e))
    })?;
    write_csv(frame, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column::ColumnType;

    const RETAIL: &str = "\
State,Industry,Series ID,Month,Turnover
Victoria,Food retailing,A3349417W,1982 Apr,303.1
Victoria,Food retailing,A3349417W,1982 May,NA
";

    #[test]
    fn read_csv_infers_types() {
        let df = read_csv(RETAIL.as_bytes()).unwrap();
        let types: Vec<ColumnType> = df.columns().iter().map(Column::column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Text,
                ColumnType::Text,
                ColumnType::Text,
                ColumnType::YearMonth,
                ColumnType::Float
            ]
        );
        let turnover = df.column("Turnover").unwrap().as_float().unwrap();
        assert_eq!(turnover[0], 303.1);
        assert!(turnover[1].is_nan());
    }

    #[test]
    fn read_csv_detects_datetimes() {
        let csv = "Month,x\n2019-01-01T00:00:00Z,1\n2019-02-01T00:00:00Z,2\n";
        let df = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            df.column("Month").unwrap().column_type(),
            ColumnType::DateTime
        );
    }

    #[test]
    fn temporal_column_with_gap_stays_text() {
        let csv = "Month,x\n2019 Jan,1\n,2\n";
        let df = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(df.column("Month").unwrap().column_type(), ColumnType::Text);
    }

    #[test]
    fn ragged_record_is_an_error() {
        let csv = "a,b\n1,2\n3\n";
        assert!(read_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn write_then_read_preserves_frame() {
        let df = read_csv(RETAIL.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        write_csv(&df, &mut buffer).unwrap();
        let back = read_csv(buffer.as_slice()).unwrap();
        assert_eq!(back.column_names(), df.column_names());
        assert_eq!(
            back.column("Month").unwrap(),
            df.column("Month").unwrap()
        );
        assert!(back.column("Turnover").unwrap().as_float().unwrap()[1].is_nan());
    }
}
