use crate::core::{Component, ContextHandle, InputPort, Slot, require_initialized};
use crate::data::Frame;
use crate::error::{Result, RuntimeError};

/// Logs the size of every frame it sees.
#[derive(Debug, Default)]
pub struct FrameDebugger {
    input: InputPort<Frame>,
    ctx: Option<ContextHandle>,
    ticks: u64,
}

impl FrameDebugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_input(&mut self, slot: &Slot<Frame>) -> Result<()> {
        self.input.bind(slot)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One line describing the frame, or why it cannot be described.
    pub fn describe(&self, frame: &Frame) -> Result<String> {
        let shape = frame.image.shape();
        if shape.rank() != 3 {
            return Err(RuntimeError::invalid_argument(
                "FrameDebugger expected HxWxC image.",
            ));
        }
        Ok(format!(
            "FrameDebugger tick {}, size = {}x{}, channels = {}",
            self.ticks,
            shape.dim(1),
            shape.dim(0),
            shape.dim(2)
        ))
    }
}

impl Component for FrameDebugger {
    fn name(&self) -> &str {
        "frame_debugger"
    }

    fn init(&mut self, ctx: ContextHandle) -> Result<()> {
        require_initialized(&ctx, self.name())?;
        self.ctx = Some(ctx);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if !self.input.is_bound() {
            return Err(RuntimeError::failed_precondition(
                "FrameDebugger input not bound",
            ));
        }
        self.ticks = 0;
        Ok(())
    }

    fn tick(&mut self) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        let Some(frame) = self.input.get() else {
            ctx.log_error("FrameDebugger tick with unbound input.");
            return;
        };
        self.ticks += 1;
        match self.describe(&frame) {
            Ok(line) => ctx.log_info(line),
            Err(e) => ctx.log_error(e.message()),
        }
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(ctx) = &self.ctx {
            ctx.log_info(format!("FrameDebugger stopped after {} ticks.", self.ticks));
        }
        Ok(())
    }
}
