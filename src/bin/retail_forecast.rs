//! # retail-forecast
//!
//! Forecast monthly retail turnover for selected states and industries
//! with ETS, ARIMA and seasonal naive models.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tidy_forecast::data::{read_retail_csv, simulate_retail, SimulationSpec};
use tidy_forecast::pipeline::{check_filter, check_output, run, PipelineConfig};
use tidy_forecast::table::write_csv_path;
use tidy_forecast::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "retail-forecast", version, about = "Retail turnover forecasts with 95% intervals")]
struct Cli {
    /// TOML pipeline configuration; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Retail CSV with State, Industry, Month and Turnover columns.
    /// Simulated data is used when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// State to keep (repeatable).
    #[arg(long = "state")]
    states: Vec<String>,

    /// Industry to keep (repeatable).
    #[arg(long = "industry")]
    industries: Vec<String>,

    /// Forecast horizon, e.g. "2 years" or "18 months".
    #[arg(long)]
    horizon: Option<String>,

    /// Interval level in percent.
    #[arg(long)]
    level: Option<f64>,

    /// Write the output table to this CSV file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also print per-model fit statistics.
    #[arg(long)]
    glance: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if !self.states.is_empty() {
            config = config.with_states(&self.states);
        }
        if !self.industries.is_empty() {
            config = config.with_industries(&self.industries);
        }
        if let Some(horizon) = &self.horizon {
            config = config.with_horizon(horizon.as_str());
        }
        if let Some(level) = self.level {
            config = config.with_level(level);
        }
        config.validate()?;
        Ok(config)
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let config = cli.pipeline_config()?;
    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let data = match &cli.input {
        Some(path) => read_retail_csv(path)?,
        None => {
            info!("no input given, using simulated retail data");
            simulate_retail(&SimulationSpec::default())?
        }
    };

    let result = run(&data, &config)?;
    check_filter(&data, &result.filtered, &config)?;
    check_output(&result.output, &result.mable, &config)?;

    println!("{}", result.filtered);
    println!("{}", result.mable);
    println!("{}", result.output);
    if cli.glance {
        println!("{}", result.mable.glance()?);
    }
    if let Some(path) = &cli.output {
        write_csv_path(&result.output, path)?;
        info!(path = %path.display(), rows = result.output.n_rows(), "wrote forecasts");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
