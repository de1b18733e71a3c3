//! Interfaces a pretrained forecasting backend can expose
//!
//! Backends have shipped two construction interfaces (a configuration object,
//! and the older hyperparameters + checkpoint pair) and two inference calling
//! conventions (explicit horizon, and the older frequency-code list). Every
//! entry point has a default that reports it as unsupported, so a backend
//! only implements the ones it actually has.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Failure reported by a backend or a loaded model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// The construction interface does not exist on this backend
    #[error("interface not supported: {0}")]
    Unsupported(String),

    /// The checkpoint could not be loaded
    #[error("load failed: {0}")]
    Load(String),

    /// The model does not accept this calling convention
    #[error("calling convention mismatch: {0}")]
    CallingConvention(String),

    /// Inference ran and failed
    #[error("inference failed: {0}")]
    Inference(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Configuration object accepted by current backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub checkpoint: String,
    pub context_len: usize,
    pub horizon_len: usize,
}

/// Hyperparameters accepted by the legacy construction interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HParams {
    pub context_len: usize,
    pub horizon_len: usize,
    pub input_patch_len: usize,
    pub output_patch_len: usize,
    pub num_layers: usize,
    pub model_dims: usize,
}

impl HParams {
    pub const MIN_CONTEXT_LEN: usize = 32;

    pub fn new(context_len: usize, horizon_len: usize) -> Self {
        Self {
            context_len: context_len.max(Self::MIN_CONTEXT_LEN),
            horizon_len,
            input_patch_len: 32,
            output_patch_len: 128,
            num_layers: 20,
            model_dims: 1280,
        }
    }
}

/// Something that can build an inference-ready model
pub trait FoundationBackend: Debug {
    /// Short identifier used in diagnostics
    fn name(&self) -> &str;

    /// Configuration-object construction interface
    fn load_from_config(&self, config: &ModelConfig) -> BackendResult<Box<dyn LoadedModel>> {
        let _ = config;
        Err(BackendError::Unsupported(format!(
            "{} has no configuration interface",
            self.name()
        )))
    }

    /// Hyperparameter + checkpoint construction interface
    fn load_from_hparams(
        &self,
        hparams: &HParams,
        checkpoint: &str,
    ) -> BackendResult<Box<dyn LoadedModel>> {
        let _ = (hparams, checkpoint);
        Err(BackendError::Unsupported(format!(
            "{} has no hyperparameter interface",
            self.name()
        )))
    }
}

/// An inference-ready model
///
/// Both calling conventions take a batch of input series and return one
/// forecast buffer per input, which may be longer than requested.
pub trait LoadedModel: Debug {
    fn forecast_with_horizon(
        &self,
        horizon: usize,
        inputs: &[Vec<f64>],
    ) -> BackendResult<Vec<Vec<f64>>> {
        let _ = (horizon, inputs);
        Err(BackendError::CallingConvention(
            "explicit horizon not accepted".to_string(),
        ))
    }

    fn forecast_with_frequency(
        &self,
        inputs: &[Vec<f64>],
        frequency: &[u32],
    ) -> BackendResult<Vec<Vec<f64>>> {
        let _ = (inputs, frequency);
        Err(BackendError::CallingConvention(
            "frequency codes not accepted".to_string(),
        ))
    }
}
