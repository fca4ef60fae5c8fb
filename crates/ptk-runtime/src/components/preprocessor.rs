use crate::core::{Component, ContextHandle, InputPort, OutputPort, Slot, require_initialized};
use crate::data::{Frame, Tensor};
use crate::error::{Result, RuntimeError};
use crate::operators::{
    NormalizationParams, add_batch_dim, bgr_to_rgb, cast_u8_to_f32, hwc_to_chw, normalize,
    rgb_to_bgr, rgb_to_gray,
};
use crate::types::{DataType, PixelFormat, TensorLayout};
use serde::{Deserialize, Serialize};

/// Steps applied after the `u8 -> f32` cast, in field order.
///
/// `to_gray` takes precedence over `swap_rb`: a BGR input is swapped back to
/// RGB before the luma weights are applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    pub swap_rb: bool,
    pub to_gray: bool,
    pub normalization: Option<NormalizationParams>,
    pub to_chw: bool,
    pub add_batch: bool,
}

/// Turns camera frames (`u8` HWC) into model-ready float tensors.
pub struct Preprocessor {
    config: PreprocessorConfig,
    input: InputPort<Frame>,
    output: OutputPort<Frame>,
    ctx: Option<ContextHandle>,
    processed: u64,
    failures: u64,
}

impl Preprocessor {
    pub fn new(config: PreprocessorConfig) -> Self {
        Self {
            config,
            input: InputPort::new(),
            output: OutputPort::new(),
            ctx: None,
            processed: 0,
            failures: 0,
        }
    }

    pub fn bind_input(&mut self, slot: &Slot<Frame>) -> Result<()> {
        self.input.bind(slot)
    }

    pub fn bind_output(&mut self, slot: &Slot<Frame>) -> Result<()> {
        self.output.bind(slot)
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Runs the configured steps on `input` and replaces `output`'s image.
    /// `output` is left untouched on error.
    pub fn process(&self, input: &Frame, output: &mut Frame) -> Result<()> {
        let src = input.image_view();
        let &[height, width, channels] = src.shape().dims() else {
            return Err(RuntimeError::invalid_argument(format!(
                "Preprocessor: expects an HxWxC frame, got shape {}",
                src.shape()
            )));
        };

        let mut image = Tensor::zeros(DataType::Float32, [height, width, channels])?;
        cast_u8_to_f32(&src, &mut image.view_mut())?;

        let mut pixel_format = input.pixel_format;
        if self.config.to_gray {
            if pixel_format == PixelFormat::Bgr8 {
                bgr_to_rgb(&mut image.view_mut())?;
            }
            let mut gray = Tensor::zeros(DataType::Float32, [height, width, 1])?;
            rgb_to_gray(&image.view(), &mut gray.view_mut())?;
            image = gray;
            pixel_format = PixelFormat::Gray8;
        } else if self.config.swap_rb {
            rgb_to_bgr(&mut image.view_mut())?;
            pixel_format = match pixel_format {
                PixelFormat::Rgb8 => PixelFormat::Bgr8,
                PixelFormat::Bgr8 => PixelFormat::Rgb8,
                other => other,
            };
        }

        if let Some(params) = &self.config.normalization {
            normalize(&mut image.view_mut(), params, TensorLayout::Hwc)?;
        }

        let mut layout = TensorLayout::Hwc;
        if self.config.to_chw {
            let channels = image.shape().dim(2);
            let mut chw = Tensor::zeros(DataType::Float32, [channels, height, width])?;
            hwc_to_chw(&image.view(), &mut chw.view_mut())?;
            image = chw;
            layout = TensorLayout::Chw;
        }

        if self.config.add_batch {
            let batched = add_batch_dim(&image.view())?.shape().clone();
            image.reshape(batched)?;
            layout = match layout {
                TensorLayout::Chw => TensorLayout::Nchw,
                _ => TensorLayout::Nhwc,
            };
        }

        output.image = image;
        output.layout = layout;
        output.copy_metadata_from(input);
        output.pixel_format = pixel_format;
        Ok(())
    }

    fn process_ports(&self) -> Result<()> {
        let (Some(input), Some(mut output)) = (self.input.get(), self.output.get()) else {
            return Err(RuntimeError::failed_precondition(
                "Preprocessor ports not bound",
            ));
        };
        if input.image.is_empty() {
            return Err(RuntimeError::invalid_argument(
                "Preprocessor: input frame has empty image tensor",
            ));
        }
        self.process(&input, &mut output)
    }
}

impl Component for Preprocessor {
    fn name(&self) -> &str {
        "preprocessor"
    }

    fn init(&mut self, ctx: ContextHandle) -> Result<()> {
        require_initialized(&ctx, self.name())?;
        self.ctx = Some(ctx);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if !self.input.is_bound() || !self.output.is_bound() {
            return Err(RuntimeError::failed_precondition(
                "Preprocessor ports not bound",
            ));
        }
        self.processed = 0;
        self.failures = 0;
        Ok(())
    }

    fn tick(&mut self) {
        let Some(ctx) = self.ctx.clone() else {
            return;
        };
        match self.process_ports() {
            Ok(()) => self.processed += 1,
            Err(e) => {
                self.failures += 1;
                ctx.log_error(e.message());
            }
        }
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(ctx) = &self.ctx {
            ctx.log_info(format!(
                "Preprocessor stopped: {} frames processed, {} failed.",
                self.processed, self.failures
            ));
        }
        Ok(())
    }
}
