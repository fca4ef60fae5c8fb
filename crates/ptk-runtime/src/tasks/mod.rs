//! Task contracts: the fixed validate, pre-process, infer, post-process,
//! validate protocol wrapped around a pluggable [`Engine`].
mod detection;
mod output;
mod segmentation;
mod spec;

#[cfg(test)]
mod tests;

pub use detection::DetectionContract;
pub use output::{BoundingBox, Detection, IGNORE_LABEL, SegmentationMask, TaskOutput, TaskPayload};
pub use segmentation::{MaskFormat, SegmentationContract, SegmentationType};
pub use spec::{CoordinateSystem, InputSpec, Invariant, OutputSpec, TaskMetadata, TaskSpec};

use crate::data::{Frame, Tensor, TensorView};
use crate::engine::Engine;
use crate::error::{Result, RuntimeError};
use std::time::Instant;

/// What a contract consumes: one frame, borrowed for the call.
#[derive(Clone, Copy, Debug)]
pub struct TaskInput<'a> {
    pub frame: &'a Frame,
}

impl<'a> TaskInput<'a> {
    pub fn new(frame: &'a Frame) -> Self {
        Self { frame }
    }
}

/// Outcome of [`TaskContract::execute`]. The output is always returned, even
/// when `status` is an error; check `output.success` or `status` before using it.
#[derive(Debug)]
pub struct TaskResult {
    pub output: TaskOutput,
    pub status: Result<()>,
}

impl TaskResult {
    fn failed(error: RuntimeError) -> Self {
        Self {
            output: TaskOutput::default(),
            status: Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// The output if every step succeeded, the first error otherwise.
    pub fn into_result(self) -> Result<TaskOutput> {
        self.status.map(|_| self.output)
    }
}

/// One ML task's end-to-end contract against a generic engine.
///
/// Implementors provide the task-specific steps; [`TaskContract::execute`]
/// sequences them and should not normally be overridden.
pub trait TaskContract {
    fn spec(&self) -> &TaskSpec;

    /// Structural checks only. Fails with `InvalidArgument`.
    fn validate_input(&self, input: &TaskInput<'_>) -> Result<()>;

    /// Maps the frame onto the ordered tensors the engine expects.
    fn pre_process<'a>(&self, input: &TaskInput<'a>) -> Result<Vec<TensorView<'a>>>;

    /// Task and format specific decode of the engine outputs.
    fn post_process(&self, raw_outputs: &[TensorView<'_>], input: &TaskInput<'_>)
    -> Result<TaskOutput>;

    fn validate_output(&self, output: &TaskOutput) -> Result<()> {
        self.spec().check_invariants(output)
    }

    /// Pre-flight check, independent of any frame: a loaded engine reports
    /// at least one input and one output name.
    fn validate_model(&self, engine: &dyn Engine) -> Result<()> {
        if engine.input_names().is_empty() || engine.output_names().is_empty() {
            return Err(RuntimeError::failed_precondition(
                "Model has no inputs or outputs",
            ));
        }
        Ok(())
    }

    fn execute(&self, engine: &mut dyn Engine, input: &TaskInput<'_>) -> TaskResult {
        let (mut output, inference_time_ms) = match infer_and_decode(self, engine, input) {
            Ok(decoded) => decoded,
            Err(e) => return TaskResult::failed(e),
        };

        output.task_type = self.spec().name.clone();
        output.inference_time_ms = inference_time_ms;
        output.timestamp_ns = input.frame.timestamp_ns;
        output.frame_index = input.frame.frame_index;
        output.success = true;

        let status = self.validate_output(&output);
        if status.is_err() {
            output.success = false;
        }
        TaskResult { output, status }
    }
}

fn infer_and_decode<C: TaskContract + ?Sized>(
    contract: &C,
    engine: &mut dyn Engine,
    input: &TaskInput<'_>,
) -> Result<(TaskOutput, f32)> {
    contract.validate_input(input)?;
    let raw_inputs = contract.pre_process(input)?;

    let start = Instant::now();
    let raw_outputs = engine
        .infer(&raw_inputs)
        .map_err(|e| RuntimeError::internal(format!("Engine inference failed: {e}")))?;
    let inference_time_ms = start.elapsed().as_secs_f32() * 1000.0;

    let views = raw_outputs.iter().map(Tensor::view).collect::<Vec<_>>();
    let output = contract.post_process(&views, input)?;
    Ok((output, inference_time_ms))
}

/// Input check shared by the image tasks: a non-empty rank 3 (HWC) or rank 4
/// (NHWC) tensor with 3 channels.
pub fn validate_image_input(input: &TaskInput<'_>) -> Result<()> {
    let shape = input.frame.image.shape();
    if shape.num_elements() == 0 {
        return Err(RuntimeError::invalid_argument(
            "Input frame has no image data",
        ));
    }
    if shape.rank() != 3 && shape.rank() != 4 {
        return Err(RuntimeError::invalid_argument(format!(
            "Expected 3D (HWC) or 4D (NHWC) tensor, got shape {shape}"
        )));
    }
    let channels = shape.dim(shape.rank() - 1);
    if channels != 3 {
        return Err(RuntimeError::invalid_argument(format!(
            "Expected 3-channel image, got {channels} channels"
        )));
    }
    Ok(())
}

/// Single pass-through of the frame image.
pub fn image_passthrough<'a>(input: &TaskInput<'a>) -> Vec<TensorView<'a>> {
    vec![input.frame.image_view()]
}
