//! Tabular data: generic data frames, keyed monthly tsibbles and CSV IO.

pub mod column;
pub mod frame;
pub mod io;
pub mod tsibble;

pub use column::{Column, ColumnData, ColumnType};
pub use frame::DataFrame;
pub use io::{read_csv, read_csv_path, write_csv, write_csv_path};
pub use tsibble::{SeriesKey, Tsibble};
