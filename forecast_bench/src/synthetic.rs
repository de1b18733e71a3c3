//! Seeded synthetic series for demos and tests

use crate::data::{Frequency, TimeSeries};
use crate::error::{BenchError, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Monthly series `base + trend * t + amplitude * sin(2 pi t / 12) + noise`
///
/// Noise is Gaussian with standard deviation `noise_sd`; the same `seed`
/// always gives the same series.
pub fn monthly_seasonal_series(
    start: NaiveDate,
    months: usize,
    base: f64,
    amplitude: f64,
    trend: f64,
    noise_sd: f64,
    seed: u64,
) -> Result<TimeSeries> {
    if !noise_sd.is_finite() || noise_sd < 0.0 {
        return Err(BenchError::Configuration(format!(
            "Noise standard deviation must be finite and non-negative, got {}",
            noise_sd
        )));
    }
    let noise = Normal::new(0.0, noise_sd)
        .map_err(|e| BenchError::Configuration(format!("Invalid noise level: {}", e)))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let values = (0..months)
        .map(|t| {
            let t = t as f64;
            base + trend * t + amplitude * (2.0 * PI * t / 12.0).sin() + noise.sample(&mut rng)
        })
        .collect();

    TimeSeries::from_start("value", Frequency::MonthStart, start, values)
}
