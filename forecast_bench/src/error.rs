//! Error types for the forecast_bench crate

use thiserror::Error;

/// Custom error types for the forecast_bench crate
#[derive(Debug, Error)]
pub enum BenchError {
    /// A required column is missing from the input table
    #[error("Schema error: {0}")]
    Schema(String),

    /// A date or value in the input table could not be parsed
    #[error("Data quality error: {0}")]
    DataQuality(String),

    /// Invalid model selection or window parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single window's fit or predict failed
    #[error("Forecast error: {0}")]
    Forecast(String),

    /// A forecaster variant could not be constructed at all
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Error from a numeric kernel
    #[error("Math error: {0}")]
    Math(#[from] series_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from CSV writing
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from JSON decoding
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, BenchError>;

impl From<polars::prelude::PolarsError> for BenchError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        BenchError::Polars(err.to_string())
    }
}

impl BenchError {
    /// Errors that stop the run before any output is produced
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Errors that are swallowed per window or per model
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BenchError::Forecast(_) | BenchError::ModelUnavailable(_) | BenchError::Math(_)
        )
    }
}
