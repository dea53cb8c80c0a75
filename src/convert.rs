//! Conversions between tsibbles and data frames.
//!
//! Every conversion keeps all rows and columns and changes only the type of
//! the temporal column: calendar months on the tsibble side, datetimes on
//! the data frame side.

use tracing::debug;

use crate::core::YearMonth;
use crate::error::{ForecastError, Result};
use crate::table::{Column, ColumnData, ColumnType, DataFrame, Tsibble};

/// Relabel a month column as datetimes at the first instant of each month.
///
/// Datetime columns pass through unchanged.
pub fn as_datetime(frame: &DataFrame, column: &str) -> Result<DataFrame> {
    let col = frame.column(column)?;
    let datetimes = match col.data() {
        ColumnData::DateTime(_) => return Ok(frame.clone()),
        ColumnData::YearMonth(months) => months
            .iter()
            .map(YearMonth::to_datetime)
            .collect::<Result<Vec<_>>>()?,
        _ => {
            return Err(ForecastError::TypeMismatch {
                column: column.to_string(),
                expected: ColumnType::YearMonth.abbreviation().to_string(),
                got: col.column_type().abbreviation().to_string(),
            })
        }
    };
    debug!(column, "converted month column to datetime");
    frame.replace_column(Column::datetime(column, datetimes))
}

/// Relabel a datetime or text column as calendar months.
///
/// Month columns pass through unchanged; datetimes map to the month that
/// contains them.
pub fn yearmonth(frame: &DataFrame, column: &str) -> Result<DataFrame> {
    let col = frame.column(column)?;
    let months = match col.data() {
        ColumnData::YearMonth(_) => return Ok(frame.clone()),
        ColumnData::DateTime(values) => values.iter().map(YearMonth::from_datetime).collect(),
        ColumnData::Text(values) => values
            .iter()
            .map(|v| v.parse::<YearMonth>())
            .collect::<Result<Vec<_>>>()?,
        ColumnData::Float(_) => {
            return Err(ForecastError::TypeMismatch {
                column: column.to_string(),
                expected: ColumnType::DateTime.abbreviation().to_string(),
                got: ColumnType::Float.abbreviation().to_string(),
            })
        }
    };
    debug!(column, "converted column to year-month");
    frame.replace_column(Column::year_month(column, months))
}

/// Drop the tsibble tags, optionally turning the index into datetimes.
pub fn tsibble_to_frame(tsibble: &Tsibble, datetime: bool) -> Result<DataFrame> {
    let frame = tsibble.to_data_frame();
    if datetime {
        as_datetime(&frame, tsibble.index_name())
    } else {
        Ok(frame)
    }
}

/// Convert `index` to calendar months and tag the frame as a tsibble.
pub fn frame_to_tsibble<S: AsRef<str>>(
    frame: &DataFrame,
    index: &str,
    keys: &[S],
) -> Result<Tsibble> {
    let frame = yearmonth(frame, index)?;
    Tsibble::from_data_frame(frame, index, keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tsibble {
        let months = (0..3)
            .map(|i| YearMonth::new(2018, 11).unwrap().add_months(i))
            .collect();
        let frame = DataFrame::new(vec![
            Column::text("State", vec!["Victoria"; 3]),
            Column::year_month("Month", months),
            Column::float("Turnover", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        Tsibble::from_data_frame(frame, "Month", &["State"]).unwrap()
    }

    #[test]
    fn round_trip_restores_tsibble() {
        let ts = sample();
        let frame = tsibble_to_frame(&ts, true).unwrap();
        assert_eq!(
            frame.column("Month").unwrap().column_type(),
            ColumnType::DateTime
        );
        let back = frame_to_tsibble(&frame, "Month", &["State"]).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn conversions_are_idempotent() {
        let frame = tsibble_to_frame(&sample(), true).unwrap();
        assert_eq!(as_datetime(&frame, "Month").unwrap(), frame);
        let months = yearmonth(&frame, "Month").unwrap();
        assert_eq!(yearmonth(&months, "Month").unwrap(), months);
    }

    #[test]
    fn text_months_are_parsed() {
        let frame = DataFrame::new(vec![Column::text("Month", vec!["2019 Jan", "2019-02"])])
            .unwrap();
        let months = yearmonth(&frame, "Month").unwrap();
        assert_eq!(
            months.column("Month").unwrap().as_year_month().unwrap()[1],
            YearMonth::new(2019, 2).unwrap()
        );
    }

    #[test]
    fn numeric_columns_are_rejected() {
        let frame = DataFrame::new(vec![Column::float("Month", vec![1.0])]).unwrap();
        assert!(matches!(
            yearmonth(&frame, "Month"),
            Err(ForecastError::TypeMismatch { .. })
        ));
        assert!(as_datetime(&frame, "Month").is_err());
    }
}
