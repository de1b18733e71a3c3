//! Seasonal ARIMA fitted by conditional sum of squares
//!
//! The training window is differenced with `(1 - B)^d (1 - B^s)^D`, a
//! multiplicative ARMA(p, q)(P, Q)s is fitted to the result by minimising the
//! conditional sum of squared innovations (pre-sample values taken as zero),
//! and the forecast is integrated back through the differencing polynomial.

use super::{ensure_finite, Forecaster};
use crate::data::SeriesSlice;
use crate::error::{BenchError, Result};
use argmin::core::{CostFunction, Error as ArgminError, Executor, State};
use argmin::solver::neldermead::NelderMead;
use series_math::differencing::{apply_polynomial, integrate};
use series_math::polynomial::{ar_polynomial, difference_polynomial, ma_polynomial};
use tracing::debug;

/// Coefficients must stay inside `(-BOUND, BOUND)`
const COEFFICIENT_BOUND: f64 = 0.99;
const LARGE_COST: f64 = 1e12;
const DEFAULT_MAX_ITERS: u64 = 500;
const SD_TOLERANCE: f64 = 1e-8;

/// Non-seasonal order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

/// Seasonal order `(P, D, Q, s)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl Order {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }
}

/// Statistical SARIMA forecaster
#[derive(Debug, Clone)]
pub struct ArimaForecaster {
    order: Order,
    seasonal: SeasonalOrder,
    max_iters: u64,
}

impl Default for ArimaForecaster {
    /// SARIMA(1,1,1)(1,1,1)12
    fn default() -> Self {
        Self::new(Order::new(1, 1, 1), SeasonalOrder::new(1, 1, 1, 12))
    }
}

impl ArimaForecaster {
    pub fn new(order: Order, seasonal: SeasonalOrder) -> Self {
        Self {
            order,
            seasonal,
            max_iters: DEFAULT_MAX_ITERS,
        }
    }

    /// Cap on Nelder-Mead iterations per window
    pub fn with_max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    fn include_mean(&self) -> bool {
        self.order.d + self.seasonal.d == 0
    }

    fn differencing(&self) -> Vec<f64> {
        difference_polynomial(self.order.d, self.seasonal.d, self.seasonal.period)
    }

    /// Fit the ARMA part on an already differenced series
    fn fit(&self, differenced: &[f64]) -> Result<ArmaParams> {
        let layout = ParamLayout::new(self.order, self.seasonal, self.include_mean());
        let problem = CssProblem {
            series: differenced.to_vec(),
            layout,
            period: self.seasonal.period,
        };

        let init = layout.initial(differenced);
        if layout.len() == 0 {
            return Ok(layout.unpack(&init));
        }

        let solver = NelderMead::new(layout.simplex(&init, differenced))
            .with_sd_tolerance(SD_TOLERANCE)
            .map_err(optimizer_error)?;
        let result = Executor::new(problem, solver)
            .configure(|state| state.max_iters(self.max_iters))
            .run()
            .map_err(optimizer_error)?;

        let best = result
            .state
            .get_best_param()
            .ok_or_else(|| BenchError::Forecast("Optimizer returned no parameters".to_string()))?;
        if result.state.get_best_cost() >= LARGE_COST {
            return Err(BenchError::Forecast(
                "No admissible SARIMA coefficients found".to_string(),
            ));
        }

        debug!(
            params = ?best,
            cost = result.state.get_best_cost(),
            iterations = result.state.get_iter(),
            "fitted sarima"
        );
        Ok(layout.unpack(best))
    }
}

impl Forecaster for ArimaForecaster {
    fn name(&self) -> &str {
        "sarima"
    }

    fn forecast(&mut self, train: &SeriesSlice<'_>, horizon: usize) -> Result<Vec<f64>> {
        let values = train.values();
        let diff_poly = self.differencing();
        let degree = diff_poly.len() - 1;

        if values.len() <= degree + 2 {
            return Err(BenchError::Forecast(format!(
                "SARIMA needs more than {} observations for its differencing, got {}",
                degree + 2,
                values.len()
            )));
        }
        if !series_math::all_finite(values) {
            return Err(BenchError::Forecast(
                "Training window contains non-finite values".to_string(),
            ));
        }

        let differenced = apply_polynomial(values, &diff_poly)?;
        let params = self.fit(&differenced)?;
        let future = params.forecast(&differenced, horizon, self.seasonal.period);
        let forecast = integrate(values, &future, &diff_poly)?;

        ensure_finite(self.name(), forecast)
    }
}

fn optimizer_error(err: ArgminError) -> BenchError {
    BenchError::Forecast(format!("SARIMA optimisation failed: {}", err))
}

/// Position of each coefficient group in the flat parameter vector
#[derive(Debug, Clone, Copy)]
struct ParamLayout {
    p: usize,
    seasonal_p: usize,
    q: usize,
    seasonal_q: usize,
    mean: bool,
}

impl ParamLayout {
    fn new(order: Order, seasonal: SeasonalOrder, mean: bool) -> Self {
        Self {
            p: order.p,
            seasonal_p: seasonal.p,
            q: order.q,
            seasonal_q: seasonal.q,
            mean,
        }
    }

    fn coefficients(&self) -> usize {
        self.p + self.seasonal_p + self.q + self.seasonal_q
    }

    fn len(&self) -> usize {
        self.coefficients() + usize::from(self.mean)
    }

    fn initial(&self, series: &[f64]) -> Vec<f64> {
        let mut init = vec![0.0; self.coefficients()];
        if self.mean {
            init.push(series_math::mean(series).unwrap_or(0.0));
        }
        init
    }

    fn simplex(&self, init: &[f64], series: &[f64]) -> Vec<Vec<f64>> {
        let mean_step = series_math::mean(series)
            .map(|m| 0.1 * m.abs())
            .unwrap_or(0.0)
            .max(1e-3);
        let mut vertices = vec![init.to_vec()];
        for i in 0..init.len() {
            let mut vertex = init.to_vec();
            vertex[i] += if i < self.coefficients() { 0.1 } else { mean_step };
            vertices.push(vertex);
        }
        vertices
    }

    fn admissible(&self, param: &[f64]) -> bool {
        param[..self.coefficients()]
            .iter()
            .all(|c| c.abs() < COEFFICIENT_BOUND)
    }

    fn unpack(&self, param: &[f64]) -> ArmaParams {
        let mut offset = 0;
        let mut take = |n: usize| {
            let group = param[offset..offset + n].to_vec();
            offset += n;
            group
        };
        let phi = take(self.p);
        let seasonal_phi = take(self.seasonal_p);
        let theta = take(self.q);
        let seasonal_theta = take(self.seasonal_q);
        let mean = if self.mean { take(1)[0] } else { 0.0 };

        ArmaParams {
            phi,
            seasonal_phi,
            theta,
            seasonal_theta,
            mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ArmaParams {
    phi: Vec<f64>,
    seasonal_phi: Vec<f64>,
    theta: Vec<f64>,
    seasonal_theta: Vec<f64>,
    mean: f64,
}

impl ArmaParams {
    fn polynomials(&self, period: usize) -> (Vec<f64>, Vec<f64>) {
        (
            ar_polynomial(&self.phi, &self.seasonal_phi, period),
            ma_polynomial(&self.theta, &self.seasonal_theta, period),
        )
    }

    /// Innovations `e_t` of `a(B) z_t = m(B) e_t` with zero pre-sample values
    fn residuals(&self, series: &[f64], period: usize) -> Vec<f64> {
        let (ar, ma) = self.polynomials(period);
        let z: Vec<f64> = series.iter().map(|x| x - self.mean).collect();
        let mut e = Vec::with_capacity(z.len());

        for t in 0..z.len() {
            let ar_part: f64 = ar
                .iter()
                .enumerate()
                .filter(|(k, _)| *k <= t)
                .map(|(k, c)| c * z[t - k])
                .sum();
            let ma_part: f64 = ma
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(k, _)| *k <= t)
                .map(|(k, c)| c * e[t - k])
                .sum();
            e.push(ar_part - ma_part);
        }
        e
    }

    /// Point forecast of the differenced series, future innovations set to zero
    fn forecast(&self, series: &[f64], horizon: usize, period: usize) -> Vec<f64> {
        let (ar, ma) = self.polynomials(period);
        let mut z: Vec<f64> = series.iter().map(|x| x - self.mean).collect();
        let mut e = self.residuals(series, period);
        let n = z.len();

        for t in n..n + horizon {
            let ar_part: f64 = ar
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(k, _)| *k <= t)
                .map(|(k, c)| c * z[t - k])
                .sum();
            let ma_part: f64 = ma
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(k, _)| *k <= t)
                .map(|(k, c)| c * e[t - k])
                .sum();
            z.push(ma_part - ar_part);
            e.push(0.0);
        }

        z[n..].iter().map(|v| v + self.mean).collect()
    }
}

/// Conditional sum of squares objective
struct CssProblem {
    series: Vec<f64>,
    layout: ParamLayout,
    period: usize,
}

impl CostFunction for CssProblem {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        if param.len() != self.layout.len() || !self.layout.admissible(param) {
            return Ok(LARGE_COST);
        }
        let sse: f64 = self
            .layout
            .unpack(param)
            .residuals(&self.series, self.period)
            .iter()
            .map(|e| e * e)
            .sum();
        if sse.is_finite() {
            Ok(sse)
        } else {
            Ok(LARGE_COST)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Frequency, TimeSeries};
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn monthly(values: Vec<f64>) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        TimeSeries::from_start("value", Frequency::MonthStart, start, values).unwrap()
    }

    fn trend_and_season(t: usize) -> f64 {
        let t = t as f64;
        10.0 + 0.5 * t + 5.0 * (2.0 * std::f64::consts::PI * t / 12.0).sin()
    }

    #[test]
    fn test_random_walk_repeats_last_value() {
        let series = monthly(vec![1.0, 3.0, 2.0, 5.0, 4.0, 7.0]);
        let mut model = ArimaForecaster::new(Order::new(0, 1, 0), SeasonalOrder::new(0, 0, 0, 12));

        let forecast = model.forecast(&series.as_slice(), 3).unwrap();
        assert_eq!(forecast, vec![7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_exact_seasonal_pattern_is_continued() {
        let values: Vec<f64> = (0..36).map(trend_and_season).collect();
        let series = monthly(values);
        let mut model = ArimaForecaster::default();

        let forecast = model.forecast(&series.as_slice(), 6).unwrap();
        assert_eq!(forecast.len(), 6);
        for (h, value) in forecast.iter().enumerate() {
            assert_abs_diff_eq!(*value, trend_and_season(36 + h), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_short_window_is_a_forecast_error() {
        let series = monthly((0..15).map(|t| t as f64).collect());
        let mut model = ArimaForecaster::default();

        let err = model.forecast(&series.as_slice(), 6).unwrap_err();
        assert!(matches!(err, BenchError::Forecast(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_ar_forecast_decays_toward_mean() {
        let params = ArmaParams {
            phi: vec![0.5],
            seasonal_phi: vec![],
            theta: vec![],
            seasonal_theta: vec![],
            mean: 0.0,
        };
        let forecast = params.forecast(&[4.0, 2.0], 2, 12);
        assert_abs_diff_eq!(forecast[0], 1.0);
        assert_abs_diff_eq!(forecast[1], 0.5);
    }

    #[test]
    fn test_fitted_ar_with_mean_stays_finite() {
        let mut values = vec![0.0; 60];
        let mut state = 0.3;
        for (t, v) in values.iter_mut().enumerate() {
            state = 0.6 * state + ((t * 7919) % 13) as f64 / 13.0 - 0.5;
            *v = 20.0 + state;
        }
        let series = monthly(values);
        let mut model = ArimaForecaster::new(Order::new(1, 0, 0), SeasonalOrder::new(0, 0, 0, 12))
            .with_max_iters(200);

        let forecast = model.forecast(&series.as_slice(), 4).unwrap();
        assert_eq!(forecast.len(), 4);
        assert!(forecast.iter().all(|v| (15.0..25.0).contains(v)));
    }

    #[test]
    fn test_inadmissible_coefficients_are_penalised() {
        let problem = CssProblem {
            series: vec![1.0, 2.0, 3.0],
            layout: ParamLayout::new(Order::new(1, 0, 0), SeasonalOrder::new(0, 0, 0, 12), false),
            period: 12,
        };
        assert_eq!(problem.cost(&vec![1.5]).unwrap(), LARGE_COST);
        assert!(problem.cost(&vec![0.5]).unwrap() < LARGE_COST);
    }
}
