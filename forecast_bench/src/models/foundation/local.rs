//! Backend that loads patch-linear checkpoints from a local directory
//!
//! A checkpoint maps the last `input_patch_len` normalised values to the next
//! `output_patch_len` normalised values with one dense layer. Checkpoint
//! `org/model` is stored as `<dir>/org__model.json`.

use super::backend::{
    BackendError, BackendResult, FoundationBackend, HParams, LoadedModel, ModelConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// First checkpoint format that supports the configuration interface
const CONFIG_API_VERSION: u32 = 2;

/// On-disk checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchLinearCheckpoint {
    pub api_version: u32,
    pub input_patch_len: usize,
    pub output_patch_len: usize,
    /// `output_patch_len` rows of `input_patch_len` weights
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl PatchLinearCheckpoint {
    /// A checkpoint that repeats the last observed value
    pub fn persistence(api_version: u32, input_patch_len: usize, output_patch_len: usize) -> Self {
        let mut row = vec![0.0; input_patch_len];
        if let Some(last) = row.last_mut() {
            *last = 1.0;
        }
        Self {
            api_version,
            input_patch_len,
            output_patch_len,
            weights: vec![row; output_patch_len],
            bias: vec![0.0; output_patch_len],
        }
    }

    /// Path of checkpoint `id` inside `dir`
    pub fn path_for(dir: &Path, id: &str) -> PathBuf {
        dir.join(format!("{}.json", id.replace('/', "__")))
    }

    pub fn save(&self, dir: &Path, id: &str) -> crate::error::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = Self::path_for(dir, id);
        fs::write(&path, serde_json::to_string(self)?)?;
        Ok(path)
    }

    fn validate(&self) -> BackendResult<()> {
        if self.input_patch_len == 0 || self.output_patch_len == 0 {
            return Err(BackendError::Load("patch lengths must be positive".to_string()));
        }
        if self.weights.len() != self.output_patch_len
            || self.weights.iter().any(|row| row.len() != self.input_patch_len)
            || self.bias.len() != self.output_patch_len
        {
            return Err(BackendError::Load(format!(
                "weights must be {}x{} with {} biases",
                self.output_patch_len, self.input_patch_len, self.output_patch_len
            )));
        }
        Ok(())
    }

    /// Apply the patch head to one normalised input patch
    fn project(&self, patch: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(patch).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

/// Reads checkpoints from a directory
#[derive(Debug, Clone)]
pub struct LocalCheckpointBackend {
    dir: PathBuf,
}

impl LocalCheckpointBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, id: &str) -> BackendResult<PatchLinearCheckpoint> {
        let path = PatchLinearCheckpoint::path_for(&self.dir, id);
        let raw = fs::read_to_string(&path)
            .map_err(|e| BackendError::Load(format!("{}: {}", path.display(), e)))?;
        let checkpoint: PatchLinearCheckpoint = serde_json::from_str(&raw)
            .map_err(|e| BackendError::Load(format!("{}: {}", path.display(), e)))?;
        checkpoint.validate()?;
        debug!(path = %path.display(), api_version = checkpoint.api_version, "read checkpoint");
        Ok(checkpoint)
    }
}

impl FoundationBackend for LocalCheckpointBackend {
    fn name(&self) -> &str {
        "local-checkpoint"
    }

    fn load_from_config(&self, config: &ModelConfig) -> BackendResult<Box<dyn LoadedModel>> {
        let checkpoint = self.read(&config.checkpoint)?;
        if checkpoint.api_version < CONFIG_API_VERSION {
            return Err(BackendError::Unsupported(format!(
                "checkpoint api_version {} predates the configuration interface",
                checkpoint.api_version
            )));
        }
        Ok(Box::new(PatchLinearModel {
            checkpoint,
            horizon_len: config.horizon_len,
        }))
    }

    fn load_from_hparams(
        &self,
        hparams: &HParams,
        checkpoint: &str,
    ) -> BackendResult<Box<dyn LoadedModel>> {
        let checkpoint = self.read(checkpoint)?;
        if checkpoint.input_patch_len != hparams.input_patch_len {
            return Err(BackendError::Load(format!(
                "checkpoint input_patch_len {} does not match hparams {}",
                checkpoint.input_patch_len, hparams.input_patch_len
            )));
        }
        Ok(Box::new(PatchLinearModel {
            checkpoint,
            horizon_len: hparams.horizon_len,
        }))
    }
}

/// A loaded patch-linear checkpoint compiled for a fixed horizon
#[derive(Debug)]
struct PatchLinearModel {
    checkpoint: PatchLinearCheckpoint,
    horizon_len: usize,
}

impl PatchLinearModel {
    fn modern(&self) -> bool {
        self.checkpoint.api_version >= CONFIG_API_VERSION
    }

    fn run(&self, inputs: &[Vec<f64>]) -> BackendResult<Vec<Vec<f64>>> {
        inputs.iter().map(|series| self.run_one(series)).collect()
    }

    /// Autoregressive patch decoding until the compiled horizon is covered
    fn run_one(&self, series: &[f64]) -> BackendResult<Vec<f64>> {
        let first = *series
            .first()
            .ok_or_else(|| BackendError::Inference("empty input series".to_string()))?;
        let patch_len = self.checkpoint.input_patch_len;

        let location = series_math::mean(series).unwrap_or(0.0);
        let variance =
            series.iter().map(|v| (v - location).powi(2)).sum::<f64>() / series.len() as f64;
        let scale = if variance.sqrt() > f64::EPSILON {
            variance.sqrt()
        } else {
            1.0
        };

        // left-pad short inputs with their first value
        let padding = patch_len.saturating_sub(series.len());
        let mut context: Vec<f64> = std::iter::repeat(first)
            .take(padding)
            .chain(series.iter().copied())
            .map(|v| (v - location) / scale)
            .collect();

        let mut output = Vec::new();
        while output.len() < self.horizon_len.max(1) {
            let patch = &context[context.len() - patch_len..];
            let block = self.checkpoint.project(patch);
            context.extend_from_slice(&block);
            output.extend(block);
        }

        Ok(output.into_iter().map(|v| v * scale + location).collect())
    }
}

impl LoadedModel for PatchLinearModel {
    fn forecast_with_horizon(
        &self,
        horizon: usize,
        inputs: &[Vec<f64>],
    ) -> BackendResult<Vec<Vec<f64>>> {
        if !self.modern() {
            return Err(BackendError::CallingConvention(format!(
                "api_version {} expects frequency codes",
                self.checkpoint.api_version
            )));
        }
        if horizon > self.horizon_len {
            return Err(BackendError::Inference(format!(
                "model compiled for horizon {}, asked for {}",
                self.horizon_len, horizon
            )));
        }
        self.run(inputs)
    }

    fn forecast_with_frequency(
        &self,
        inputs: &[Vec<f64>],
        frequency: &[u32],
    ) -> BackendResult<Vec<Vec<f64>>> {
        if self.modern() {
            return Err(BackendError::CallingConvention(
                "frequency codes were removed in api_version 2".to_string(),
            ));
        }
        if frequency.len() != inputs.len() {
            return Err(BackendError::Inference(format!(
                "{} frequency codes for {} inputs",
                frequency.len(),
                inputs.len()
            )));
        }
        self.run(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_checkpoint_path_flattens_slashes() {
        let path = PatchLinearCheckpoint::path_for(Path::new("/ckpt"), "google/timesfm-1.0-200m");
        assert_eq!(path, PathBuf::from("/ckpt/google__timesfm-1.0-200m.json"));
    }

    #[test]
    fn test_persistence_repeats_last_value() {
        let model = PatchLinearModel {
            checkpoint: PatchLinearCheckpoint::persistence(2, 4, 3),
            horizon_len: 5,
        };
        let output = model.run_one(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        // two blocks of three cover the horizon of five
        assert_eq!(output.len(), 6);
        for value in output {
            assert_abs_diff_eq!(value, 5.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_short_input_is_padded() {
        let model = PatchLinearModel {
            checkpoint: PatchLinearCheckpoint::persistence(1, 8, 2),
            horizon_len: 2,
        };
        let output = model.run_one(&[3.0, 7.0]).unwrap();
        assert_abs_diff_eq!(output[0], 7.0, epsilon = 1e-9);
        assert!(model.run_one(&[]).is_err());
    }

    #[test]
    fn test_legacy_checkpoint_rejects_modern_convention() {
        let model = PatchLinearModel {
            checkpoint: PatchLinearCheckpoint::persistence(1, 4, 4),
            horizon_len: 4,
        };
        assert!(matches!(
            model.forecast_with_horizon(4, &[vec![1.0; 4]]),
            Err(BackendError::CallingConvention(_))
        ));
        assert!(model.forecast_with_frequency(&[vec![1.0; 4]], &[1]).is_ok());
    }

    #[test]
    fn test_malformed_checkpoint_is_rejected() {
        let mut checkpoint = PatchLinearCheckpoint::persistence(2, 4, 4);
        checkpoint.bias.pop();
        assert!(matches!(checkpoint.validate(), Err(BackendError::Load(_))));
    }
}
