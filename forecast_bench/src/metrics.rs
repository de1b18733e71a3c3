//! Metrics for evaluating forecast performance
//!
//! All functions take `(y_true, y_pred)` in that order and return `NaN` when
//! the inputs are empty or of different lengths.

use crate::benchmark::PredictionRecord;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Added to the sMAPE denominator so that `y_true == y_pred == 0` stays finite
pub const SMAPE_EPSILON: f64 = 1e-8;

fn paired(y_true: &[f64], y_pred: &[f64]) -> bool {
    !y_true.is_empty() && y_true.len() == y_pred.len()
}

/// Mean Absolute Error
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired(y_true, y_pred) {
        return f64::NAN;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Root Mean Squared Error
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired(y_true, y_pred) {
        return f64::NAN;
    }
    let mse = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;
    mse.sqrt()
}

/// sMAPE of a single (true, predicted) pair, in percent
pub fn smape_point(y_true: f64, y_pred: f64) -> f64 {
    let denom = (y_true.abs() + y_pred.abs()) / 2.0 + SMAPE_EPSILON;
    (y_true - y_pred).abs() / denom * 100.0
}

/// Row-wise sMAPE, in percent
pub fn smape_pointwise(y_true: &[f64], y_pred: &[f64]) -> Vec<f64> {
    if !paired(y_true, y_pred) {
        return Vec::new();
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| smape_point(t, p))
        .collect()
}

/// Symmetric Mean Absolute Percentage Error, in percent
pub fn smape(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if !paired(y_true, y_pred) {
        return f64::NAN;
    }
    smape_pointwise(y_true, y_pred).iter().sum::<f64>() / y_true.len() as f64
}

/// One row of the metrics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub model: String,
    pub mae: f64,
    pub rmse: f64,
    pub smape: f64,
    pub n_predictions: usize,
}

impl MetricSummary {
    /// Summarise every prediction of one model; `None` when there are none
    pub fn from_pairs(model: &str, y_true: &[f64], y_pred: &[f64]) -> Option<Self> {
        if !paired(y_true, y_pred) {
            return None;
        }
        Some(Self {
            model: model.to_string(),
            mae: mae(y_true, y_pred),
            rmse: rmse(y_true, y_pred),
            smape: smape(y_true, y_pred),
            n_predictions: y_true.len(),
        })
    }
}

impl std::fmt::Display for MetricSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Performance Metrics ({}):", self.model)?;
        writeln!(f, "  MAE:     {:.4}", self.mae)?;
        writeln!(f, "  RMSE:    {:.4}", self.rmse)?;
        writeln!(f, "  SMAPE:   {:.4}%", self.smape)?;
        writeln!(f, "  N:       {}", self.n_predictions)?;
        Ok(())
    }
}

/// sMAPE statistics of one model at one forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonMetric {
    pub model: String,
    /// Forecast step, `1..=horizon`
    pub horizon: usize,
    pub smape_mean: f64,
    /// Sample standard deviation; `NaN` with fewer than two rows
    pub smape_std: f64,
    pub n: usize,
}

/// Break row-wise sMAPE down by forecast step
///
/// Rows are assumed to be in window order, so the step of a row is its
/// position among its model's rows modulo `horizon`. Output is ordered by
/// model name, then step.
pub fn horizon_breakdown(predictions: &[PredictionRecord], horizon: usize) -> Vec<HorizonMetric> {
    if horizon == 0 {
        return Vec::new();
    }

    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    let mut buckets: BTreeMap<(&str, usize), Vec<f64>> = BTreeMap::new();

    for record in predictions {
        let count = seen.entry(record.model.as_str()).or_insert(0);
        let step = *count % horizon + 1;
        *count += 1;
        buckets
            .entry((record.model.as_str(), step))
            .or_default()
            .push(smape_point(record.y_true, record.y_pred));
    }

    buckets
        .into_iter()
        .map(|((model, step), rows)| HorizonMetric {
            model: model.to_string(),
            horizon: step,
            smape_mean: rows.iter().mean(),
            smape_std: rows.iter().std_dev(),
            n: rows.len(),
        })
        .collect()
}
