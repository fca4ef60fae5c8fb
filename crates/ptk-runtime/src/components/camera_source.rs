use super::camera::Camera;
use crate::core::{Component, ContextHandle, OutputPort, Slot, require_initialized};
use crate::data::Frame;
use crate::error::{Result, RuntimeError};

/// Publishes one captured frame per tick on its output port.
///
/// Frame indices count captures since `start`; timestamps come from the
/// runtime context clock.
pub struct CameraSource<C> {
    camera: C,
    output: OutputPort<Frame>,
    ctx: Option<ContextHandle>,
    next_index: i64,
    failures: u64,
}

impl<C: Camera> CameraSource<C> {
    pub fn new(camera: C) -> Self {
        Self {
            camera,
            output: OutputPort::new(),
            ctx: None,
            next_index: 0,
            failures: 0,
        }
    }

    pub fn bind_output(&mut self, slot: &Slot<Frame>) -> Result<()> {
        self.output.bind(slot)
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Frames published since the last `start`.
    pub fn frames_captured(&self) -> i64 {
        self.next_index
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn capture(&mut self, ctx: &ContextHandle) -> Result<()> {
        let mut frame = self
            .output
            .get()
            .ok_or_else(|| RuntimeError::failed_precondition("CameraSource output not bound"))?;
        self.camera.get_frame(&mut frame)?;
        frame.frame_index = self.next_index;
        frame.timestamp_ns = ctx.now_nanoseconds();
        self.next_index += 1;
        Ok(())
    }
}

impl<C: Camera> Component for CameraSource<C> {
    fn name(&self) -> &str {
        "camera_source"
    }

    fn init(&mut self, ctx: ContextHandle) -> Result<()> {
        require_initialized(&ctx, self.name())?;
        self.camera.init()?;
        self.ctx = Some(ctx);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if !self.output.is_bound() {
            return Err(RuntimeError::failed_precondition(
                "CameraSource output not bound",
            ));
        }
        self.camera.start()?;
        self.next_index = 0;
        if let Some(ctx) = &self.ctx {
            ctx.log_info("CameraSource started.");
        }
        Ok(())
    }

    fn tick(&mut self) {
        let Some(ctx) = self.ctx.clone() else {
            return;
        };
        self.camera.tick();
        if let Err(e) = self.capture(&ctx) {
            self.failures += 1;
            ctx.log_error(format!("CameraSource capture failed: {e}"));
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.camera.stop()?;
        if let Some(ctx) = &self.ctx {
            ctx.log_info(format!(
                "CameraSource stopped after {} frames.",
                self.next_index
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{SyntheticCamera, SyntheticCameraConfig};
    use crate::core::{RuntimeContext, RuntimeContextOptions};

    fn source() -> CameraSource<SyntheticCamera> {
        CameraSource::new(SyntheticCamera::new(SyntheticCameraConfig {
            width: 8,
            height: 6,
            camera_id: 1,
        }))
    }

    #[test]
    fn start_requires_bound_output() {
        let ctx = RuntimeContext::initialized_with(RuntimeContextOptions::default()).unwrap();
        let mut source = source();
        source.init(ctx).unwrap();
        let err = source.start().unwrap_err();
        assert!(matches!(err, RuntimeError::FailedPrecondition(_)));
        assert!(!source.camera().is_running());
    }

    #[test]
    fn stamps_index_and_timestamp() {
        let ctx = RuntimeContext::initialized_with(RuntimeContextOptions::default()).unwrap();
        let slot = Slot::new(Frame::default());
        let mut source = source();
        source.bind_output(&slot).unwrap();
        source.init(ctx).unwrap();
        source.start().unwrap();

        source.tick();
        let first = slot.borrow().timestamp_ns;
        source.tick();

        let frame = slot.borrow();
        assert_eq!(frame.frame_index, 1);
        assert!(frame.timestamp_ns >= first);
        assert_eq!(frame.camera_id, 1);
        assert_eq!(frame.image.shape().dims(), &[6, 8, 3]);
        assert_eq!(source.frames_captured(), 2);
        assert_eq!(source.failures(), 0);
    }

    #[test]
    fn tick_before_init_is_a_no_op() {
        let slot = Slot::new(Frame::default());
        let mut source = source();
        source.bind_output(&slot).unwrap();
        source.tick();
        assert!(slot.borrow().image.is_empty());
    }
}
