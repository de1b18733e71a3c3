//! Rolling-origin backtest over a set of forecasters
//!
//! Each forecaster runs over every window of the splitter. Windows are
//! independent: a failed or malformed forecast is logged and skipped, and the
//! model keeps going. A model whose backend disappears mid-run stops early but
//! keeps what it already produced. Models without a single usable forecast
//! get no metrics row.

use crate::data::TimeSeries;
use crate::error::{BenchError, Result};
use crate::metrics::{horizon_breakdown, HorizonMetric, MetricSummary};
use crate::models::Forecaster;
use crate::splitter::{RollingOriginSplitter, WindowPair};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::{info, warn};

/// One forecast value next to the value it tried to predict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub model: String,
    pub date: NaiveDate,
    pub y_true: f64,
    pub y_pred: f64,
}

/// Everything one forecaster produced over the windows
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    pub model: String,
    pub predictions: Vec<PredictionRecord>,
    pub windows_succeeded: usize,
    pub windows_skipped: usize,
    /// Why the run stopped before the last window, if it did
    pub stopped: Option<String>,
}

impl ModelRun {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            predictions: Vec::new(),
            windows_succeeded: 0,
            windows_skipped: 0,
            stopped: None,
        }
    }

    /// Metrics over all windows, `None` when nothing was predicted
    pub fn summary(&self) -> Option<MetricSummary> {
        let y_true: Vec<f64> = self.predictions.iter().map(|p| p.y_true).collect();
        let y_pred: Vec<f64> = self.predictions.iter().map(|p| p.y_pred).collect();
        MetricSummary::from_pairs(&self.model, &y_true, &y_pred)
    }

    fn record(mut self, window: &WindowPair<'_>, forecast: Vec<f64>) -> Self {
        let test = window.test;
        self.predictions.extend(
            test.timestamps()
                .iter()
                .zip(test.values())
                .zip(forecast)
                .map(|((date, y_true), y_pred)| PredictionRecord {
                    model: self.model.clone(),
                    date: *date,
                    y_true: *y_true,
                    y_pred,
                }),
        );
        self.windows_succeeded += 1;
        self
    }

    fn skip(mut self) -> Self {
        self.windows_skipped += 1;
        self
    }
}

/// Result tables of a backtest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkReport {
    /// Long-form predictions, grouped by model in run order, windows in order
    pub predictions: Vec<PredictionRecord>,
    /// One row per model with at least one prediction, best sMAPE first
    pub metrics: Vec<MetricSummary>,
    pub horizon: usize,
}

impl BenchmarkReport {
    pub fn metrics_for(&self, model: &str) -> Option<&MetricSummary> {
        self.metrics.iter().find(|m| m.model == model)
    }

    pub fn predictions_for<'a>(
        &'a self,
        model: &'a str,
    ) -> impl Iterator<Item = &'a PredictionRecord> + 'a {
        self.predictions.iter().filter(move |p| p.model == model)
    }

    /// sMAPE per model and forecast step
    pub fn horizon_breakdown(&self) -> Vec<HorizonMetric> {
        horizon_breakdown(&self.predictions, self.horizon)
    }
}

/// Backtest orchestrator
#[derive(Debug, Clone, Copy)]
pub struct Benchmark {
    splitter: RollingOriginSplitter,
}

impl Benchmark {
    /// Fails with a configuration error when either size is zero
    pub fn new(horizon: usize, min_train_size: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(BenchError::Configuration(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        if min_train_size == 0 {
            return Err(BenchError::Configuration(
                "Minimum training size must be positive".to_string(),
            ));
        }
        Ok(Self {
            splitter: RollingOriginSplitter::new(horizon, min_train_size),
        })
    }

    pub fn splitter(&self) -> &RollingOriginSplitter {
        &self.splitter
    }

    pub fn horizon(&self) -> usize {
        self.splitter.horizon()
    }

    /// Run every forecaster over every window of `series`
    ///
    /// Fails only when the series is too short for a single window.
    pub fn run(
        &self,
        series: &TimeSeries,
        forecasters: &mut [Box<dyn Forecaster>],
    ) -> Result<BenchmarkReport> {
        let windows = self.splitter.window_count(series.len());
        if windows == 0 {
            return Err(BenchError::Configuration(format!(
                "Series of length {} yields no windows for horizon {} and min train size {}",
                series.len(),
                self.splitter.horizon(),
                self.splitter.min_train_size()
            )));
        }

        let mut report = BenchmarkReport {
            horizon: self.horizon(),
            ..BenchmarkReport::default()
        };

        for forecaster in forecasters.iter_mut() {
            let run = self.run_model(series, forecaster.as_mut());
            match run.summary() {
                Some(summary) => {
                    info!(
                        model = %run.model,
                        windows = run.windows_succeeded,
                        skipped = run.windows_skipped,
                        mae = summary.mae,
                        rmse = summary.rmse,
                        smape = summary.smape,
                        "model finished"
                    );
                    report.metrics.push(summary);
                }
                None => warn!(
                    model = %run.model,
                    skipped = run.windows_skipped,
                    "no successful forecasts; model omitted from metrics"
                ),
            }
            report.predictions.extend(run.predictions);
        }

        report
            .metrics
            .sort_by(|a, b| a.smape.total_cmp(&b.smape));
        Ok(report)
    }

    /// Run one forecaster over every window, skipping the ones that fail
    pub fn run_model(&self, series: &TimeSeries, forecaster: &mut dyn Forecaster) -> ModelRun {
        let horizon = self.splitter.horizon();
        let name = forecaster.name().to_string();
        info!(
            model = %name,
            windows = self.splitter.window_count(series.len()),
            "running model"
        );

        let flow = self
            .splitter
            .splits(series)
            .try_fold(ModelRun::new(&name), |run, window| {
                match forecaster.forecast(&window.train, horizon) {
                    Ok(forecast) if forecast.len() == window.test.len() => {
                        ControlFlow::Continue(run.record(&window, forecast))
                    }
                    Ok(forecast) => {
                        warn!(
                            model = %name,
                            window = window.index,
                            expected = window.test.len(),
                            got = forecast.len(),
                            "forecast length mismatch; skipping window"
                        );
                        ControlFlow::Continue(run.skip())
                    }
                    Err(BenchError::ModelUnavailable(reason)) => {
                        warn!(model = %name, window = window.index, %reason, "model unavailable; stopping");
                        ControlFlow::Break(ModelRun {
                            stopped: Some(reason),
                            ..run
                        })
                    }
                    Err(error) => {
                        warn!(model = %name, window = window.index, %error, "forecast failed; skipping window");
                        ControlFlow::Continue(run.skip())
                    }
                }
            });

        match flow {
            ControlFlow::Continue(run) | ControlFlow::Break(run) => run,
        }
    }
}
