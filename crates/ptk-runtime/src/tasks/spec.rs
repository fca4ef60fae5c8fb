use super::output::TaskOutput;
use crate::data::TensorShape;
use crate::error::Result;
use crate::types::{DataType, TensorLayout};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoordinateSystem {
    /// Absolute pixel coordinates of the input image.
    #[default]
    ImagePixels,
    /// Coordinates scaled to `[0, 1]`.
    Normalized,
}

/// An input tensor the task expects. `-1` in the shape matches any size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    pub shape: TensorShape,
    pub dtype: DataType,
    pub layout: TensorLayout,
    /// Whether a leading batch dimension may be prepended to `shape`.
    pub allow_batch: bool,
}

impl InputSpec {
    /// An `[-1, -1, 3]` float HWC image, batchable.
    pub fn rgb_image(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: TensorShape::from([-1, -1, 3]),
            dtype: DataType::Float32,
            layout: TensorLayout::Hwc,
            allow_batch: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    pub semantic_meaning: String,
    pub dtype: DataType,
    pub coordinate_system: CoordinateSystem,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub classes: Vec<String>,
    pub min_confidence: f32,
    pub max_confidence: f32,
    pub requires_nms: bool,
}

type Validator = Box<dyn Fn(&TaskOutput) -> Result<()> + Send + Sync>;

/// A named predicate every valid output of a task satisfies.
pub struct Invariant {
    pub description: String,
    validator: Validator,
}

impl Invariant {
    pub fn new(
        description: impl Into<String>,
        validator: impl Fn(&TaskOutput) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            validator: Box::new(validator),
        }
    }

    pub fn check(&self, output: &TaskOutput) -> Result<()> {
        (self.validator)(output)
    }
}

impl fmt::Debug for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invariant")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Declarative description of a task. Built once by the contract's
/// constructor and never changed afterwards.
#[derive(Debug, Default)]
pub struct TaskSpec {
    pub name: String,
    pub description: String,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
    pub metadata: TaskMetadata,
    pub invariants: Vec<Invariant>,
}

impl TaskSpec {
    /// Runs every invariant in declaration order, stopping at the first failure.
    pub fn check_invariants(&self, output: &TaskOutput) -> Result<()> {
        for invariant in &self.invariants {
            invariant.check(output).inspect_err(|e| {
                log::debug!("{}: invariant '{}' failed: {e}", self.name, invariant.description)
            })?;
        }
        Ok(())
    }

    pub fn num_classes(&self) -> usize {
        self.metadata.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn invariants_short_circuit_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let spec = TaskSpec {
            name: "Test".into(),
            invariants: vec![
                Invariant::new("always fails", |_| {
                    Err(RuntimeError::failed_precondition("first"))
                }),
                Invariant::new("never reached", move |_| {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            ],
            ..Default::default()
        };

        let err = spec.check_invariants(&TaskOutput::default()).unwrap_err();
        assert_eq!(err.message(), "first");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rgb_image_input_has_wildcards() {
        let input = InputSpec::rgb_image("image");
        assert_eq!(input.shape.dims(), &[-1, -1, 3]);
        assert_eq!(input.shape.element_count(), None);
    }
}
