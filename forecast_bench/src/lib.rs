//! # Forecast Bench
//!
//! Rolling-origin backtesting of forecasters on an aggregated time series.
//!
//! ## Features
//!
//! - Aggregation of a date/value event table to a regular series (`D`, `W`, `MS`, `ME`, `QS`, `YS`)
//! - Expanding-window splits with a fixed forecast horizon
//! - Forecasters: seasonal ARIMA, additive trend + yearly seasonality, pretrained foundation model
//! - MAE, RMSE and sMAPE per model, plus sMAPE per forecast step
//! - Per-window fault isolation: a failed window is logged and skipped
//!
//! ## Quick Start
//!
//! ```no_run
//! use forecast_bench::config::{build_forecasters, ModelKind};
//! use forecast_bench::{report, Benchmark, DataLoader, Frequency};
//! use std::path::Path;
//!
//! let series = DataLoader::from_csv("series.csv", "date", "value", Frequency::MonthStart)?;
//!
//! let mut forecasters = build_forecasters(
//!     &[ModelKind::StatisticalArima, ModelKind::AdditiveDecomposition],
//!     6,
//!     None,
//! )?;
//!
//! let benchmark = Benchmark::new(6, 36)?;
//! let results = benchmark.run(&series, &mut forecasters)?;
//! for row in &results.metrics {
//!     println!("{}", row);
//! }
//! report::write_report(Path::new("results/benchmark"), &results)?;
//! # Ok::<(), forecast_bench::BenchError>(())
//! ```

pub mod benchmark;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod report;
pub mod splitter;
pub mod synthetic;
pub mod validation;

// Re-export commonly used types
pub use crate::benchmark::{Benchmark, BenchmarkReport, PredictionRecord};
pub use crate::config::{BenchmarkConfig, ModelKind};
pub use crate::data::{DataLoader, Frequency, SeriesSlice, TimeSeries};
pub use crate::error::{BenchError, Result};
pub use crate::metrics::MetricSummary;
pub use crate::models::Forecaster;
pub use crate::splitter::RollingOriginSplitter;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
