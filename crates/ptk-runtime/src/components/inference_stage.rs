use crate::core::{Component, ContextHandle, InputPort, OutputPort, Slot, require_initialized};
use crate::data::Frame;
use crate::engine::Engine;
use crate::error::{Result, RuntimeError};
use crate::tasks::{TaskContract, TaskInput, TaskOutput};
use std::path::PathBuf;

/// Runs a task contract against an engine once per tick.
///
/// The stage owns both: the engine is loaded during `init` when a model path
/// is configured, and the contract's `validate_model` gates `start`. Every
/// executed frame produces a [`TaskOutput`] on the output port, including
/// failed ones (`success == false`).
pub struct InferenceStage {
    engine: Box<dyn Engine>,
    contract: Box<dyn TaskContract>,
    model_path: Option<PathBuf>,
    input: InputPort<Frame>,
    output: OutputPort<TaskOutput>,
    ctx: Option<ContextHandle>,
    last_frame_index: Option<i64>,
    executed: u64,
    failures: u64,
}

impl InferenceStage {
    pub fn new(engine: Box<dyn Engine>, contract: Box<dyn TaskContract>) -> Self {
        Self {
            engine,
            contract,
            model_path: None,
            input: InputPort::new(),
            output: OutputPort::new(),
            ctx: None,
            last_frame_index: None,
            executed: 0,
            failures: 0,
        }
    }

    /// Loads the model from `path` during `init`.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn bind_input(&mut self, slot: &Slot<Frame>) -> Result<()> {
        self.input.bind(slot)
    }

    pub fn bind_output(&mut self, slot: &Slot<TaskOutput>) -> Result<()> {
        self.output.bind(slot)
    }

    pub fn contract(&self) -> &dyn TaskContract {
        self.contract.as_ref()
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn run_once(&mut self, ctx: &ContextHandle) {
        let (Some(frame), Some(mut output)) = (self.input.get(), self.output.get()) else {
            ctx.log_error("InferenceStage tick with unbound ports.");
            return;
        };
        if frame.image.is_empty() {
            log::debug!("InferenceStage: no frame available yet");
            return;
        }
        if self.last_frame_index == Some(frame.frame_index) {
            log::debug!("InferenceStage: frame {} already processed", frame.frame_index);
            return;
        }
        self.last_frame_index = Some(frame.frame_index);

        let result = self
            .contract
            .execute(self.engine.as_mut(), &TaskInput::new(&frame));
        self.executed += 1;
        if let Err(e) = &result.status {
            self.failures += 1;
            ctx.log_error(format!(
                "{} failed on frame {}: {e}",
                self.contract.spec().name,
                frame.frame_index
            ));
        }
        *output = result.output;
    }
}

impl Component for InferenceStage {
    fn name(&self) -> &str {
        "inference_stage"
    }

    fn init(&mut self, ctx: ContextHandle) -> Result<()> {
        require_initialized(&ctx, self.name())?;
        if let Some(path) = &self.model_path {
            self.engine
                .load(path)
                .map_err(|e| RuntimeError::failed_precondition(e.to_string()))?;
            ctx.log_info(format!("Loaded model {}", path.display()));
        }
        self.ctx = Some(ctx);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if !self.input.is_bound() || !self.output.is_bound() {
            return Err(RuntimeError::failed_precondition(
                "InferenceStage ports not bound",
            ));
        }
        self.contract.validate_model(self.engine.as_ref())?;
        self.last_frame_index = None;
        if let Some(ctx) = &self.ctx {
            ctx.log_info(format!(
                "InferenceStage started for task {}.",
                self.contract.spec().name
            ));
        }
        Ok(())
    }

    fn tick(&mut self) {
        let Some(ctx) = self.ctx.clone() else {
            return;
        };
        self.run_once(&ctx);
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(ctx) = &self.ctx {
            ctx.log_info(format!(
                "InferenceStage stopped: {} frames executed, {} failed.",
                self.executed, self.failures
            ));
        }
        Ok(())
    }
}
