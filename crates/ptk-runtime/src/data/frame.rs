use super::tensor::{Tensor, TensorView};
use crate::types::{PixelFormat, TensorLayout};

/// One captured (or preprocessed) image plus its capture metadata.
///
/// A frame is owned by the component that produces it, i.e. it lives in the
/// slot behind that component's output port. Downstream components only read it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub image: Tensor,
    pub pixel_format: PixelFormat,
    pub layout: TensorLayout,
    /// Capture time from the runtime context clock.
    pub timestamp_ns: i64,
    pub frame_index: i64,
    pub camera_id: i32,
}

impl Frame {
    pub fn new(image: Tensor, pixel_format: PixelFormat, layout: TensorLayout) -> Self {
        Self {
            image,
            pixel_format,
            layout,
            ..Default::default()
        }
    }

    pub fn image_view(&self) -> TensorView<'_> {
        self.image.view()
    }

    /// Copies the capture metadata, leaving the image and its layout untouched.
    pub fn copy_metadata_from(&mut self, other: &Frame) {
        self.pixel_format = other.pixel_format;
        self.timestamp_ns = other.timestamp_ns;
        self.frame_index = other.frame_index;
        self.camera_id = other.camera_id;
    }
}
