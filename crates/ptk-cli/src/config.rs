use ptk_runtime::components::{PreprocessorConfig, SyntheticCameraConfig};
use ptk_runtime::core::RuntimeContextOptions;
use ptk_runtime::engine::EngineConfig;
use ptk_runtime::tasks::MaskFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, io};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ticks to run when `--ticks` is not given.
    pub ticks: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { ticks: 30 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub mask_format: MaskFormat,
    pub labels: Vec<String>,
    /// Loaded by the engine during `init`. Without it the engine is used as is.
    pub model_path: Option<PathBuf>,
    /// Adds a frame debugger on the camera output.
    pub debug_frames: bool,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            mask_format: MaskFormat::Logits,
            labels: vec!["red".into(), "green".into(), "blue".into()],
            model_path: None,
            debug_frames: false,
        }
    }
}

/// Everything `ptk run` needs, as read from a TOML file. Missing sections
/// and keys take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub runtime: RuntimeContextOptions,
    pub scheduler: SchedulerConfig,
    pub camera: SyntheticCameraConfig,
    pub preprocessor: PreprocessorConfig,
    pub engine: EngineConfig,
    pub task: TaskConfig,
}

impl AppConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// The file's configuration, or the defaults when no file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
