//! CSV output of the result tables

use crate::benchmark::{BenchmarkReport, PredictionRecord};
use crate::error::Result;
use crate::metrics::{HorizonMetric, MetricSummary};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const METRICS_HEADER: [&str; 5] = ["model", "mae", "rmse", "smape", "n_predictions"];
const PREDICTIONS_HEADER: [&str; 4] = ["model", "date", "y_true", "y_pred"];
const HORIZON_HEADER: [&str; 5] = ["model", "horizon", "smape_mean", "smape_std", "n"];

/// Where the three tables of one run are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub metrics: PathBuf,
    pub predictions: PathBuf,
    pub horizon: PathBuf,
}

/// `<prefix>_metrics.csv`, `<prefix>_predictions.csv` and `<prefix>_horizon.csv`
pub fn output_paths(prefix: &Path) -> OutputPaths {
    let with_suffix = |suffix: &str| {
        let mut name = prefix.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    };
    OutputPaths {
        metrics: with_suffix("_metrics.csv"),
        predictions: with_suffix("_predictions.csv"),
        horizon: with_suffix("_horizon.csv"),
    }
}

/// Serialise `rows` under `header`; the header is written even without rows
fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_metrics(path: &Path, metrics: &[MetricSummary]) -> Result<()> {
    write_table(path, &METRICS_HEADER, metrics)
}

pub fn write_predictions(path: &Path, predictions: &[PredictionRecord]) -> Result<()> {
    write_table(path, &PREDICTIONS_HEADER, predictions)
}

pub fn write_horizon(path: &Path, rows: &[HorizonMetric]) -> Result<()> {
    write_table(path, &HORIZON_HEADER, rows)
}

/// Staging path a table is written to before it is moved into place
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write every table of `report` next to `prefix`
///
/// The tables are staged first and only renamed into place once all three
/// were written, so a failed write leaves none of them behind.
pub fn write_report(prefix: &Path, report: &BenchmarkReport) -> Result<OutputPaths> {
    let paths = output_paths(prefix);
    let staged = OutputPaths {
        metrics: staging_path(&paths.metrics),
        predictions: staging_path(&paths.predictions),
        horizon: staging_path(&paths.horizon),
    };

    let written = write_metrics(&staged.metrics, &report.metrics)
        .and_then(|_| write_predictions(&staged.predictions, &report.predictions))
        .and_then(|_| write_horizon(&staged.horizon, &report.horizon_breakdown()));
    if let Err(e) = written {
        for path in [&staged.metrics, &staged.predictions, &staged.horizon] {
            if path.is_file() {
                let _ = fs::remove_file(path);
            }
        }
        return Err(e);
    }

    fs::rename(&staged.metrics, &paths.metrics)?;
    fs::rename(&staged.predictions, &paths.predictions)?;
    fs::rename(&staged.horizon, &paths.horizon)?;

    info!(
        metrics = %paths.metrics.display(),
        predictions = %paths.predictions.display(),
        horizon = %paths.horizon.display(),
        "wrote benchmark tables"
    );
    Ok(paths)
}
