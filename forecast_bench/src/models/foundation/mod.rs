//! Wrapper around a pretrained sequence-forecasting model
//!
//! The model is built lazily and rebuilt whenever the requested horizon
//! changes. Construction walks an ordered plan of (interface, checkpoint)
//! attempts and keeps every failure, so an unavailable model reports all of
//! them at once.

mod backend;
mod local;

pub use backend::{
    BackendError, BackendResult, FoundationBackend, HParams, LoadedModel, ModelConfig,
};
pub use local::{LocalCheckpointBackend, PatchLinearCheckpoint};

use super::{ensure_finite, Forecaster};
use crate::data::SeriesSlice;
use crate::error::{BenchError, Result};
use std::fmt;
use tracing::{debug, info};

/// Checkpoints tried in order when none are configured
pub const DEFAULT_CHECKPOINTS: [&str; 3] = [
    "google/timesfm-2.0-500m-pytorch",
    "google/timesfm-1.0-200m-pytorch",
    "google/timesfm-1.0-200m",
];

/// Longest history handed to the model
pub const DEFAULT_CONTEXT_LEN: usize = 512;

/// Construction interfaces, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    Config,
    HParams,
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interface::Config => f.write_str("config"),
            Interface::HParams => f.write_str("hparams"),
        }
    }
}

/// One failed construction attempt
#[derive(Debug, Clone, PartialEq)]
pub struct LoadAttempt {
    pub interface: Interface,
    pub checkpoint: String,
    pub error: BackendError,
}

impl fmt::Display for LoadAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.interface, self.checkpoint, self.error)
    }
}

#[derive(Debug)]
struct Compiled {
    horizon: usize,
    model: Box<dyn LoadedModel>,
}

/// Pretrained foundation-model forecaster
#[derive(Debug)]
pub struct PretrainedForecaster {
    backend: Box<dyn FoundationBackend>,
    checkpoints: Vec<String>,
    context_len: usize,
    compiled: Option<Compiled>,
}

impl PretrainedForecaster {
    pub fn new(backend: Box<dyn FoundationBackend>) -> Self {
        Self {
            backend,
            checkpoints: DEFAULT_CHECKPOINTS.iter().map(|c| c.to_string()).collect(),
            context_len: DEFAULT_CONTEXT_LEN,
            compiled: None,
        }
    }

    /// Replace the checkpoint priority list
    pub fn with_checkpoints<I, S>(mut self, checkpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checkpoints = checkpoints.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context_len(mut self, context_len: usize) -> Self {
        self.context_len = context_len.max(HParams::MIN_CONTEXT_LEN);
        self
    }

    pub fn checkpoints(&self) -> &[String] {
        &self.checkpoints
    }

    /// Horizon the cached model was built for
    pub fn compiled_horizon(&self) -> Option<usize> {
        self.compiled.as_ref().map(|c| c.horizon)
    }

    /// Every (interface, checkpoint) pair in the order it is attempted
    pub fn construction_plan(&self) -> Vec<(Interface, &str)> {
        [Interface::Config, Interface::HParams]
            .into_iter()
            .flat_map(|interface| {
                self.checkpoints
                    .iter()
                    .map(move |checkpoint| (interface, checkpoint.as_str()))
            })
            .collect()
    }

    /// Build the model for `horizon` now instead of on the first forecast
    ///
    /// Fails with [`BenchError::ModelUnavailable`] when no attempt succeeds.
    pub fn prepare(&mut self, horizon: usize) -> Result<()> {
        if self.compiled_horizon() == Some(horizon) {
            return Ok(());
        }
        let model = self.build(horizon)?;
        self.compiled = Some(Compiled { horizon, model });
        Ok(())
    }

    fn build(&self, horizon: usize) -> Result<Box<dyn LoadedModel>> {
        let mut failures = Vec::new();

        for (interface, checkpoint) in self.construction_plan() {
            let loaded = match interface {
                Interface::Config => self.backend.load_from_config(&ModelConfig {
                    checkpoint: checkpoint.to_string(),
                    context_len: self.context_len,
                    horizon_len: horizon,
                }),
                Interface::HParams => self
                    .backend
                    .load_from_hparams(&HParams::new(self.context_len, horizon), checkpoint),
            };

            match loaded {
                Ok(model) => {
                    info!(
                        backend = self.backend.name(),
                        %interface,
                        checkpoint,
                        horizon,
                        "loaded foundation model"
                    );
                    return Ok(model);
                }
                Err(error) => {
                    debug!(%interface, checkpoint, %error, "foundation model attempt failed");
                    failures.push(LoadAttempt {
                        interface,
                        checkpoint: checkpoint.to_string(),
                        error,
                    });
                }
            }
        }

        let detail = if failures.is_empty() {
            "no checkpoints configured".to_string()
        } else {
            failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        };
        Err(BenchError::ModelUnavailable(format!(
            "{} could not be built: {}",
            self.backend.name(),
            detail
        )))
    }
}

impl Forecaster for PretrainedForecaster {
    fn name(&self) -> &str {
        "timesfm"
    }

    fn forecast(&mut self, train: &SeriesSlice<'_>, horizon: usize) -> Result<Vec<f64>> {
        if train.is_empty() {
            return Err(BenchError::Forecast("Training window is empty".to_string()));
        }
        self.prepare(horizon)?;
        let compiled = self
            .compiled
            .as_ref()
            .ok_or_else(|| BenchError::ModelUnavailable("model was not built".to_string()))?;

        let values = train.values();
        let context = values[values.len().saturating_sub(self.context_len)..].to_vec();
        let inputs = [context];

        let outputs = match compiled.model.forecast_with_horizon(horizon, &inputs) {
            Err(BackendError::CallingConvention(reason)) => {
                debug!(%reason, "falling back to frequency-code calling convention");
                compiled
                    .model
                    .forecast_with_frequency(&inputs, &[train.frequency().frequency_code()])
            }
            other => other,
        }
        .map_err(|e| BenchError::Forecast(format!("timesfm inference: {}", e)))?;

        let mut forecast = outputs
            .into_iter()
            .next()
            .ok_or_else(|| BenchError::Forecast("timesfm returned no series".to_string()))?;
        if forecast.len() < horizon {
            return Err(BenchError::Forecast(format!(
                "timesfm returned {} values for horizon {}",
                forecast.len(),
                horizon
            )));
        }
        forecast.truncate(horizon);

        ensure_finite(self.name(), forecast)
    }
}
