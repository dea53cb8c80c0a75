//! File-based loading of retail data and pipeline configuration.

use std::fs;

use tempfile::tempdir;
use tidy_forecast::core::YearMonth;
use tidy_forecast::data::{read_retail_csv, simulate_retail, SimulationSpec};
use tidy_forecast::pipeline::{check_output, run, PipelineConfig};
use tidy_forecast::table::{read_csv_path, write_csv_path, ColumnType};
use tidy_forecast::ForecastError;

fn small_spec() -> SimulationSpec {
    SimulationSpec::default()
        .with_states(&["Victoria", "Tasmania"])
        .with_industries(&["Department stores"])
        .with_start(YearMonth::new(2010, 1).unwrap())
        .with_months(72)
}

#[test]
fn retail_csv_round_trips_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("retail.csv");
    let data = simulate_retail(&small_spec()).unwrap();
    write_csv_path(data.frame(), &path).unwrap();

    let loaded = read_retail_csv(&path).unwrap();
    assert_eq!(loaded, data);
}

#[test]
fn config_file_drives_the_pipeline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pipeline.toml");
    fs::write(
        &path,
        r#"
states = ["Tasmania"]
industries = ["Department stores"]
models = ["snaive = SNAIVE(Turnover)", "arima = ARIMA(log(Turnover))"]
horizon = "18 months"
level = 90.0
train_end = "2014 Dec"
"#,
    )
    .unwrap();

    let config = PipelineConfig::load(&path).unwrap();
    assert_eq!(config.train_end, Some(YearMonth::new(2014, 12).unwrap()));

    let out = run(&simulate_retail(&small_spec()).unwrap(), &config).unwrap();
    check_output(&out.output, &out.mable, &config).unwrap();
    assert_eq!(out.output.n_rows(), 2 * 18);
    assert!(out.output.has_column("90%_upper"));

    let csv = dir.path().join("forecasts.csv");
    write_csv_path(&out.output, &csv).unwrap();
    let written = read_csv_path(&csv).unwrap();
    assert_eq!(written.n_rows(), 36);
    assert_eq!(
        written.column("Month").unwrap().column_type(),
        ColumnType::DateTime
    );
}

#[test]
fn bad_config_files_are_config_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");

    fs::write(&path, "level = \"high\"\n").unwrap();
    assert!(matches!(PipelineConfig::load(&path), Err(ForecastError::Config(_))));

    fs::write(&path, "level = 120.0\n").unwrap();
    assert!(matches!(PipelineConfig::load(&path), Err(ForecastError::Config(_))));

    let missing = dir.path().join("missing.toml");
    assert!(matches!(PipelineConfig::load(&missing), Err(ForecastError::Config(_))));
}

#[test]
fn retail_csv_without_turnover_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("retail.csv");
    fs::write(&path, "State,Industry,Month\nVictoria,Department stores,2018 Jan\n").unwrap();
    assert!(matches!(read_retail_csv(&path), Err(ForecastError::Schema(_))));
}
