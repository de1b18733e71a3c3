//! Forecasting models evaluated by the benchmark
//!
//! Every model implements [`Forecaster`]: given a training prefix, return the
//! next `horizon` values. Models refit from scratch on each call; only the
//! pretrained wrapper keeps state between calls (its loaded backend).

use crate::data::SeriesSlice;
use crate::error::{BenchError, Result};
use std::fmt::Debug;

pub mod arima;
pub mod baseline;
pub mod decomposition;
pub mod foundation;

pub use arima::ArimaForecaster;
pub use baseline::MeanForecaster;
pub use decomposition::DecompositionForecaster;
pub use foundation::PretrainedForecaster;

/// A model that can be fitted on a training window and produce a point forecast
pub trait Forecaster: Debug {
    /// Identifier used in the result tables
    fn name(&self) -> &str;

    /// Forecast the `horizon` values following `train`
    ///
    /// Window-level failures are reported as [`BenchError::Forecast`] (or
    /// [`BenchError::Math`]) and are skipped by the caller.
    fn forecast(&mut self, train: &SeriesSlice<'_>, horizon: usize) -> Result<Vec<f64>>;
}

impl<F: Forecaster + ?Sized> Forecaster for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn forecast(&mut self, train: &SeriesSlice<'_>, horizon: usize) -> Result<Vec<f64>> {
        (**self).forecast(train, horizon)
    }
}

/// Reject forecasts that contain NaN or infinite values
pub(crate) fn ensure_finite(model: &str, values: Vec<f64>) -> Result<Vec<f64>> {
    if series_math::all_finite(&values) {
        Ok(values)
    } else {
        Err(BenchError::Forecast(format!(
            "{} produced non-finite forecast values",
            model
        )))
    }
}
