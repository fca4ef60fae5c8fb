use super::positive;
use crate::data::TensorViewMut;
use crate::error::{Result, RuntimeError};
use crate::types::{DataType, TensorLayout};
use serde::{Deserialize, Serialize};

/// Per-channel mean and standard deviation, one entry per channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, derive_new::new)]
pub struct NormalizationParams {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl NormalizationParams {
    /// ImageNet statistics scaled to `[0, 255]` pixel values.
    pub fn imagenet() -> Self {
        Self::new(
            vec![123.675, 116.28, 103.53],
            vec![58.395, 57.12, 57.375],
        )
    }

    pub fn num_channels(&self) -> usize {
        self.mean.len()
    }

    fn validate(&self, channels: usize) -> Result<()> {
        if self.mean.len() != self.std.len() {
            return Err(RuntimeError::invalid_argument(format!(
                "normalize: {} means for {} standard deviations",
                self.mean.len(),
                self.std.len()
            )));
        }
        if self.num_channels() == 0 || self.num_channels() != channels {
            return Err(RuntimeError::invalid_argument(format!(
                "normalize: parameters cover {} channels, tensor has {channels}",
                self.num_channels()
            )));
        }
        if let Some(c) = self.std.iter().position(|s| *s == 0.0) {
            return Err(RuntimeError::invalid_argument(format!(
                "normalize: std for channel {c} is zero"
            )));
        }
        Ok(())
    }
}

/// `(x - mean[c]) / std[c]` in place, on a float tensor in any of the four
/// supported layouts.
pub fn normalize(
    tensor: &mut TensorViewMut<'_>,
    params: &NormalizationParams,
    layout: TensorLayout,
) -> Result<()> {
    const OP: &str = "normalize";
    if tensor.is_empty() {
        return Err(RuntimeError::invalid_argument("normalize: empty tensor"));
    }
    if tensor.dtype() != DataType::Float32 {
        return Err(RuntimeError::invalid_argument(format!(
            "normalize: expects float32 tensor, got {}",
            tensor.dtype()
        )));
    }

    let shape = tensor.shape();
    let (expected_rank, channel_axis) = match layout {
        TensorLayout::Hwc => (3, 2),
        TensorLayout::Chw => (3, 0),
        TensorLayout::Nhwc => (4, 3),
        TensorLayout::Nchw => (4, 1),
        TensorLayout::Unknown => {
            return Err(RuntimeError::invalid_argument(
                "normalize: unsupported tensor layout",
            ));
        }
    };
    if shape.rank() != expected_rank {
        return Err(RuntimeError::invalid_argument(format!(
            "normalize: {layout} layout expects rank {expected_rank}, got shape {shape}"
        )));
    }
    let dims = shape
        .dims()
        .iter()
        .map(|d| positive(OP, *d))
        .collect::<Result<Vec<_>>>()?;

    let channels = dims[channel_axis];
    // elements between two channel changes
    let inner: usize = dims[channel_axis + 1..].iter().product();
    params.validate(channels)?;

    let data = tensor.as_mut_slice::<f32>()?;
    for (i, value) in data.iter_mut().enumerate() {
        let c = (i / inner) % channels;
        *value = (*value - params.mean[c]) / params.std[c];
    }
    Ok(())
}
