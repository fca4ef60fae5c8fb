//! Inference engines: the narrow interface a task contract drives, plus the
//! engines that ship with the runtime.
#[cfg(feature = "burn")]
mod burn;
mod passthrough;
mod validation;

#[cfg(feature = "burn")]
pub use burn::{BurnEngine, ForwardModule};
pub use passthrough::PassthroughEngine;
pub use validation::{BenchmarkResult, benchmark, validate_model_names};

use crate::data::{Tensor, TensorView};
use crate::error::RuntimeError;
use crate::types::DeviceType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Model is not loaded")]
    NotLoaded,
    #[error("Failed to load model from {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },
    #[error("Unexpected inputs: {0}")]
    InputMismatch(String),
    #[error(transparent)]
    Tensor(#[from] RuntimeError),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EngineBackend {
    #[default]
    Passthrough,
    Burn,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Precision {
    #[default]
    Fp32,
    Fp16,
    Int8,
}

/// Backend-agnostic engine settings. Engines ignore what they do not support.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: EngineBackend,
    pub device: DeviceType,
    pub device_id: u32,
    pub precision: Precision,
    pub enable_dynamic_shapes: bool,
    pub verbose: bool,
}

/// The engine surface a task contract needs.
///
/// Inputs are borrowed for the duration of the call; outputs are owned so the
/// contract can decode them after the engine is free again.
pub trait Engine {
    fn load(&mut self, model_path: &Path) -> Result<(), EngineError>;

    fn infer(&mut self, inputs: &[TensorView<'_>]) -> Result<Vec<Tensor>, EngineError>;

    fn input_names(&self) -> Vec<String>;

    fn output_names(&self) -> Vec<String>;

    fn set_config(&mut self, _config: EngineConfig) {}
}
