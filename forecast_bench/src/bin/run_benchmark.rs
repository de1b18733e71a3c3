//! # run_benchmark
//!
//! Command-line entry point: aggregate an input table, backtest the selected
//! forecasters and write the metrics, predictions and horizon tables.

use clap::Parser;
use forecast_bench::config::{BenchmarkConfig, ModelKind};
use forecast_bench::validation::ValidationReport;
use forecast_bench::{report, Benchmark, DataLoader, Frequency, Result};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "run_benchmark")]
#[command(about = "Rolling-origin forecast benchmark", long_about = None)]
struct Cli {
    /// Input CSV with a date column and a value column
    #[arg(long)]
    input_csv: PathBuf,

    /// Name of the date column
    #[arg(long, default_value = "date")]
    date_col: String,

    /// Name of the value column
    #[arg(long, default_value = "value")]
    value_col: String,

    /// Aggregation frequency (D, W, MS, ME, QS, YS)
    #[arg(long, default_value = "MS")]
    freq: String,

    /// Number of periods forecast per window
    #[arg(long, default_value_t = 6)]
    horizon: usize,

    /// Length of the first training window
    #[arg(long, default_value_t = 36)]
    min_train_size: usize,

    /// Comma-separated model selection
    #[arg(
        long,
        default_value = "statistical-arima,additive-decomposition,pretrained-foundation-model"
    )]
    models: String,

    /// Prefix of the output tables
    #[arg(long, default_value = "results/benchmark")]
    output_prefix: PathBuf,

    /// Directory of local foundation-model checkpoints
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// JSON report of the dataset validator; the run is refused unless it passed
    #[arg(long)]
    validation_report: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<BenchmarkConfig> {
        Ok(BenchmarkConfig {
            input_csv: self.input_csv,
            date_col: self.date_col,
            value_col: self.value_col,
            freq: self.freq.parse::<Frequency>()?,
            horizon: self.horizon,
            min_train_size: self.min_train_size,
            models: ModelKind::parse_list(&self.models)?,
            output_prefix: self.output_prefix,
            checkpoint_dir: self.checkpoint_dir,
            validation_report: self.validation_report,
        })
    }
}

fn run(config: &BenchmarkConfig) -> Result<()> {
    config.validate()?;

    if let Some(path) = &config.validation_report {
        ValidationReport::from_path(path)?.require_passed()?;
        info!(report = %path.display(), "dataset validation passed");
    }

    let series = DataLoader::from_csv(
        &config.input_csv,
        &config.date_col,
        &config.value_col,
        config.freq,
    )?;
    let windows = config.check_window_count(series.len())?;
    info!(
        points = series.len(),
        frequency = %series.frequency(),
        windows,
        "series ready"
    );

    let mut forecasters = config.build_forecasters()?;
    let benchmark = Benchmark::new(config.horizon, config.min_train_size)?;
    let results = benchmark.run(&series, &mut forecasters)?;

    let paths = report::write_report(&config.output_prefix, &results)?;
    if results.metrics.is_empty() {
        info!("no model produced a forecast");
    }
    for row in &results.metrics {
        println!("{}", row);
    }
    println!("Metrics written to {}", paths.metrics.display());
    println!("Predictions written to {}", paths.predictions.display());
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let result = cli.into_config().and_then(|config| run(&config));

    if let Err(e) = result {
        error!(error = %e, "benchmark failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
