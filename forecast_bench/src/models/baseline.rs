//! Training-mean baseline

use super::Forecaster;
use crate::data::SeriesSlice;
use crate::error::{BenchError, Result};

/// Forecasts every step as the mean of the training window
#[derive(Debug, Clone, Default)]
pub struct MeanForecaster;

impl MeanForecaster {
    pub fn new() -> Self {
        Self
    }
}

impl Forecaster for MeanForecaster {
    fn name(&self) -> &str {
        "mean"
    }

    fn forecast(&mut self, train: &SeriesSlice<'_>, horizon: usize) -> Result<Vec<f64>> {
        let mean = train
            .mean()
            .ok_or_else(|| BenchError::Forecast("Training window is empty".to_string()))?;
        Ok(vec![mean; horizon])
    }
}
