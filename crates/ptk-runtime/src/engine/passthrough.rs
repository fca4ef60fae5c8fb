use super::{Engine, EngineConfig, EngineError};
use crate::data::{Tensor, TensorView};
use std::path::Path;

/// An engine whose "model" is the identity: every input comes back as an
/// owned output tensor.
///
/// Useful to drive a task contract with tensors already in the model's output
/// format, e.g. precomputed logits.
#[derive(Debug, Clone)]
pub struct PassthroughEngine {
    inputs: Vec<String>,
    outputs: Vec<String>,
    loaded: bool,
    config: EngineConfig,
    calls: u64,
}

impl Default for PassthroughEngine {
    fn default() -> Self {
        Self::new(["input"], ["output"])
    }
}

impl PassthroughEngine {
    pub fn new<I, O>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            loaded: false,
            config: EngineConfig::default(),
            calls: 0,
        }
    }

    /// Marks the engine as loaded without a model file.
    pub fn loaded(mut self) -> Self {
        self.loaded = true;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Engine for PassthroughEngine {
    fn load(&mut self, model_path: &Path) -> Result<(), EngineError> {
        if model_path.as_os_str().is_empty() {
            return Err(EngineError::LoadFailed {
                path: model_path.to_path_buf(),
                reason: "empty model path".to_string(),
            });
        }
        log::debug!("Passthrough engine 'loaded' {}", model_path.display());
        self.loaded = true;
        Ok(())
    }

    fn infer(&mut self, inputs: &[TensorView<'_>]) -> Result<Vec<Tensor>, EngineError> {
        if !self.loaded {
            return Err(EngineError::NotLoaded);
        }
        if inputs.is_empty() {
            return Err(EngineError::InputMismatch("no input tensors".to_string()));
        }
        self.calls += 1;
        inputs
            .iter()
            .map(|view| Tensor::from_view(view).map_err(EngineError::from))
            .collect()
    }

    fn input_names(&self) -> Vec<String> {
        if self.loaded {
            self.inputs.clone()
        } else {
            Vec::new()
        }
    }

    fn output_names(&self) -> Vec<String> {
        if self.loaded {
            self.outputs.clone()
        } else {
            Vec::new()
        }
    }

    fn set_config(&mut self, config: EngineConfig) {
        if config.verbose {
            log::info!("Passthrough engine configured: {config:?}");
        }
        self.config = config;
    }
}
