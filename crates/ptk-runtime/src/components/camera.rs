use crate::data::{Frame, Tensor};
use crate::error::{Result, RuntimeError};
use crate::types::{DataType, PixelFormat, TensorLayout};
use serde::{Deserialize, Serialize};

/// A frame source driven by [`CameraSource`](super::CameraSource).
///
/// `get_frame` fills the caller's frame in place so the image storage can be
/// reused from one capture to the next. Capture metadata (index, timestamp)
/// is stamped by the component, not the camera.
pub trait Camera {
    fn init(&mut self) -> Result<()>;

    fn start(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    fn get_frame(&mut self, frame: &mut Frame) -> Result<()>;

    /// Advances the device by one scheduler tick.
    fn tick(&mut self) {}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticCameraConfig {
    pub width: usize,
    pub height: usize,
    pub camera_id: i32,
}

impl Default for SyntheticCameraConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            camera_id: 0,
        }
    }
}

/// Deterministic RGB8 gradient frames.
///
/// Red ramps along x, green along y and blue moves by one step per tick, so
/// consecutive frames differ while every frame is reproducible.
#[derive(Debug, Default)]
pub struct SyntheticCamera {
    config: SyntheticCameraConfig,
    running: bool,
    phase: u8,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticCameraConfig) -> Self {
        Self {
            config,
            running: false,
            phase: 0,
        }
    }

    pub fn config(&self) -> &SyntheticCameraConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn ramp(position: usize, extent: usize) -> u8 {
        if extent <= 1 {
            return 0;
        }
        (position * 255 / (extent - 1)) as u8
    }
}

impl Camera for SyntheticCamera {
    fn init(&mut self) -> Result<()> {
        if self.config.width == 0 || self.config.height == 0 {
            return Err(RuntimeError::invalid_argument(format!(
                "SyntheticCamera: invalid size {}x{}",
                self.config.width, self.config.height
            )));
        }
        self.phase = 0;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }

    fn get_frame(&mut self, frame: &mut Frame) -> Result<()> {
        if !self.running {
            return Err(RuntimeError::failed_precondition(
                "SyntheticCamera is not running",
            ));
        }
        let SyntheticCameraConfig {
            width,
            height,
            camera_id,
        } = self.config;
        let shape = [height as i64, width as i64, 3];
        if frame.image.dtype() != DataType::Uint8 || frame.image.shape().dims() != shape {
            frame.image = Tensor::zeros(DataType::Uint8, shape)?;
        }

        let mut view = frame.image.view_mut();
        let pixels = view.as_mut_slice::<u8>()?;
        for (i, pixel) in pixels.chunks_exact_mut(3).enumerate() {
            let (y, x) = (i / width, i % width);
            pixel[0] = Self::ramp(x, width);
            pixel[1] = Self::ramp(y, height);
            pixel[2] = self.phase;
        }

        frame.pixel_format = PixelFormat::Rgb8;
        frame.layout = TensorLayout::Hwc;
        frame.camera_id = camera_id;
        Ok(())
    }

    fn tick(&mut self) {
        self.phase = self.phase.wrapping_add(1);
    }
}
