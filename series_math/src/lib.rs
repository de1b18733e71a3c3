//! # Series Math
//!
//! Numeric kernels shared by the forecasters in `forecast_bench`.
//! This crate provides lag-polynomial algebra, differencing and its inverse,
//! penalised least squares and the regression features used by additive
//! trend/seasonality models.

use thiserror::Error;

pub mod differencing;
pub mod features;
pub mod least_squares;
pub mod polynomial;

/// Errors that can occur in numeric routines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Returns true when every value is finite.
pub fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}
