//! # cvbench
//!
//! Facade over the benchmark workspace. `forecast_bench` holds the
//! rolling-origin backtest (aggregation, splitting, forecasters, metrics and
//! orchestration); `series_math` holds the numeric kernels the forecasters
//! share.
//!
//! ## Example
//!
//! ```
//! use cvbench::forecast_bench::metrics::{mae, rmse, smape};
//!
//! assert_eq!(mae(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
//! assert!((rmse(&[0.0, 0.0], &[3.0, 4.0]) - 3.5355).abs() < 1e-4);
//! assert_eq!(smape(&[10.0], &[10.0]), 0.0);
//! ```

pub use forecast_bench;
pub use series_math;

pub use forecast_bench::{
    Benchmark, BenchmarkReport, DataLoader, Forecaster, Frequency, RollingOriginSplitter,
    TimeSeries,
};

/// Version of the facade crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
