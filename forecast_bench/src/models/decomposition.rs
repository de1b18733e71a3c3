//! Additive trend + yearly seasonality decomposition
//!
//! `y(t) = k + m t + sum_j delta_j max(0, t - c_j) + s(t)`, where the hinge
//! terms give a piecewise-linear trend with changepoints `c_j` and `s(t)` is a
//! Fourier series with a one-year period. Coefficients are fitted jointly by
//! ridge regression; changepoint and seasonal coefficients are shrunk towards
//! zero according to their prior scales.

use super::{ensure_finite, Forecaster};
use crate::data::{Frequency, SeriesSlice};
use crate::error::{BenchError, Result};
use chrono::NaiveDate;
use series_math::features::{changepoint_grid, fourier_features, hinge_features};
use series_math::least_squares::{predict, ridge_regression};
use tracing::debug;

const YEAR_DAYS: f64 = 365.25;
/// Multiplier turning a prior scale into a ridge penalty: `RIDGE_SCALE / scale^2`
const RIDGE_SCALE: f64 = 0.01;

/// Prophet-style additive forecaster
#[derive(Debug, Clone)]
pub struct DecompositionForecaster {
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    yearly_order: usize,
    seasonality_prior_scale: f64,
}

impl Default for DecompositionForecaster {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            yearly_order: 10,
            seasonality_prior_scale: 10.0,
        }
    }
}

impl DecompositionForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_changepoints(mut self, n_changepoints: usize, range: f64) -> Self {
        self.n_changepoints = n_changepoints;
        self.changepoint_range = range;
        self
    }

    pub fn with_prior_scales(mut self, changepoint: f64, seasonality: f64) -> Self {
        self.changepoint_prior_scale = changepoint;
        self.seasonality_prior_scale = seasonality;
        self
    }

    pub fn with_yearly_order(mut self, order: usize) -> Self {
        self.yearly_order = order;
        self
    }

    /// Dates of the `horizon` periods after `train`
    ///
    /// Uses the frequency inferred from the training dates, or month start
    /// when it cannot be inferred.
    pub fn future_index(train: &SeriesSlice<'_>, horizon: usize) -> Vec<NaiveDate> {
        let frequency = Frequency::infer(train.timestamps()).unwrap_or(Frequency::MonthStart);
        match train.last_timestamp() {
            Some(last) => frequency.future_labels(last, horizon),
            None => Vec::new(),
        }
    }

    fn design(&self, days: &[f64], span: f64, changepoints: &[f64]) -> Vec<Vec<f64>> {
        let scaled: Vec<f64> = days.iter().map(|d| d / span).collect();
        let hinges = hinge_features(&scaled, changepoints);
        let seasonal = fourier_features(days, YEAR_DAYS, self.yearly_order);

        scaled
            .iter()
            .zip(hinges)
            .zip(seasonal)
            .map(|((&t, hinge), fourier)| {
                let mut row = Vec::with_capacity(2 + hinge.len() + fourier.len());
                row.push(1.0);
                row.push(t);
                row.extend(hinge);
                row.extend(fourier);
                row
            })
            .collect()
    }

    fn penalties(&self, n_changepoints: usize) -> Vec<f64> {
        let changepoint = RIDGE_SCALE / self.changepoint_prior_scale.powi(2);
        let seasonal = RIDGE_SCALE / self.seasonality_prior_scale.powi(2);

        let mut penalties = vec![0.0, 0.0];
        penalties.extend(std::iter::repeat(changepoint).take(n_changepoints));
        penalties.extend(std::iter::repeat(seasonal).take(2 * self.yearly_order));
        penalties
    }
}

fn days_since(origin: NaiveDate, dates: &[NaiveDate]) -> Vec<f64> {
    dates
        .iter()
        .map(|d| (*d - origin).num_days() as f64)
        .collect()
}

impl Forecaster for DecompositionForecaster {
    fn name(&self) -> &str {
        "prophet"
    }

    fn forecast(&mut self, train: &SeriesSlice<'_>, horizon: usize) -> Result<Vec<f64>> {
        if train.len() < 2 {
            return Err(BenchError::Forecast(format!(
                "Decomposition needs at least 2 observations, got {}",
                train.len()
            )));
        }
        let timestamps = train.timestamps();
        let origin = timestamps[0];

        let future = Self::future_index(train, horizon);
        if future.len() != horizon {
            return Err(BenchError::Forecast(
                "Could not extend the time index over the horizon".to_string(),
            ));
        }

        let days = days_since(origin, timestamps);
        let span = days.last().copied().filter(|s| *s > 0.0).unwrap_or(1.0);
        let scaled: Vec<f64> = days.iter().map(|d| d / span).collect();
        let changepoints = changepoint_grid(&scaled, self.n_changepoints, self.changepoint_range);

        let y_scale = train
            .values()
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };
        let target: Vec<f64> = train.values().iter().map(|v| v / y_scale).collect();

        let design = self.design(&days, span, &changepoints);
        let coefficients = ridge_regression(&design, &target, &self.penalties(changepoints.len()))?;
        debug!(
            changepoints = changepoints.len(),
            slope = coefficients[1],
            "fitted decomposition"
        );

        let future_design = self.design(&days_since(origin, &future), span, &changepoints);
        let forecast = predict(&future_design, &coefficients)
            .into_iter()
            .map(|v| v * y_scale)
            .collect();

        ensure_finite(self.name(), forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeSeries;
    use approx::assert_relative_eq;

    fn monthly(values: Vec<f64>) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        TimeSeries::from_start("value", Frequency::MonthStart, start, values).unwrap()
    }

    #[test]
    fn test_linear_trend_is_extended() {
        let series = monthly((0..36).map(|t| 100.0 + 2.0 * t as f64).collect());
        let mut model = DecompositionForecaster::new();

        let forecast = model.forecast(&series.as_slice(), 6).unwrap();
        assert_eq!(forecast.len(), 6);
        for (h, value) in forecast.iter().enumerate() {
            let expected = 100.0 + 2.0 * (36 + h) as f64;
            assert_relative_eq!(*value, expected, max_relative = 0.02);
        }
    }

    #[test]
    fn test_yearly_pattern_is_repeated() {
        let pattern = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0, 5.0, 8.0];
        let values: Vec<f64> = (0..48).map(|t| 50.0 + 4.0 * pattern[t % 12]).collect();
        let series = monthly(values);
        let mut model = DecompositionForecaster::new();

        let forecast = model.forecast(&series.as_slice(), 12).unwrap();
        let peak = forecast
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, v)| if *v > best.1 { (i, *v) } else { best });
        // June carries the largest seasonal value
        assert_eq!(peak.0, 5);
    }

    #[test]
    fn test_without_changepoints_or_seasonality_is_a_line() {
        let series = monthly((0..24).map(|t| 5.0 + t as f64).collect());
        let mut model = DecompositionForecaster::new()
            .with_changepoints(0, 0.8)
            .with_yearly_order(0)
            .with_prior_scales(0.05, 10.0);

        let forecast = model.forecast(&series.as_slice(), 3).unwrap();
        // a straight line in days, so month lengths show up as small wiggles
        for (h, value) in forecast.iter().enumerate() {
            assert_relative_eq!(*value, 5.0 + (24 + h) as f64, max_relative = 0.01);
        }
    }

    #[test]
    fn test_future_index_falls_back_to_month_start() {
        let start = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let series = TimeSeries::from_start("v", Frequency::Daily, start, vec![1.0, 2.0]).unwrap();

        let index = DecompositionForecaster::future_index(&series.as_slice(), 2);
        assert_eq!(
            index,
            vec![
                NaiveDate::from_ymd_opt(2021, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 5, 1).unwrap(),
            ]
        );

        let longer =
            TimeSeries::from_start("v", Frequency::Daily, start, vec![1.0, 2.0, 3.0]).unwrap();
        let index = DecompositionForecaster::future_index(&longer.as_slice(), 1);
        assert_eq!(index, vec![NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()]);
    }

    #[test]
    fn test_single_point_is_a_forecast_error() {
        let series = monthly(vec![1.0]);
        let mut model = DecompositionForecaster::new();
        assert!(matches!(
            model.forecast(&series.as_slice(), 3),
            Err(BenchError::Forecast(_))
        ));
    }
}
