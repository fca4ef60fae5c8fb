use super::{dims3, ensure_dtype, ensure_non_empty};
use crate::data::{TensorView, TensorViewMut};
use crate::error::{Result, RuntimeError};
use crate::types::DataType;

const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

fn swap_red_blue(op: &str, tensor: &mut TensorViewMut<'_>) -> Result<()> {
    if tensor.is_empty() {
        return Err(RuntimeError::invalid_argument(format!(
            "{op}: empty tensor"
        )));
    }
    ensure_dtype(op, "tensor", tensor.dtype(), DataType::Float32)?;
    let [_, _, c] = dims3(op, tensor.shape())?;
    if c != 3 {
        return Err(RuntimeError::invalid_argument(format!(
            "{op}: expects a 3 channel HWC tensor, got {c} channels"
        )));
    }

    for pixel in tensor.as_mut_slice::<f32>()?.chunks_exact_mut(3) {
        pixel.swap(0, 2);
    }
    Ok(())
}

/// Swaps the first and last channel of an `[H, W, 3]` float tensor in place.
pub fn rgb_to_bgr(tensor: &mut TensorViewMut<'_>) -> Result<()> {
    swap_red_blue("rgb_to_bgr", tensor)
}

pub fn bgr_to_rgb(tensor: &mut TensorViewMut<'_>) -> Result<()> {
    swap_red_blue("bgr_to_rgb", tensor)
}

/// BT.601 luma of an `[H, W, 3]` RGB float tensor into `[H, W, 1]`.
pub fn rgb_to_gray(src: &TensorView<'_>, dst: &mut TensorViewMut<'_>) -> Result<()> {
    const OP: &str = "rgb_to_gray";
    ensure_non_empty(OP, src, dst)?;
    ensure_dtype(OP, "source", src.dtype(), DataType::Float32)?;
    ensure_dtype(OP, "destination", dst.dtype(), DataType::Float32)?;
    let [h, w, c] = dims3(OP, src.shape())?;
    if c != 3 {
        return Err(RuntimeError::invalid_argument(format!(
            "{OP}: source must have 3 channels, got {c}"
        )));
    }
    if dims3(OP, dst.shape())? != [h, w, 1] {
        return Err(RuntimeError::invalid_argument(format!(
            "{OP}: destination shape must be [{h}, {w}, 1]"
        )));
    }

    let input = src.as_slice::<f32>()?;
    let output = dst.as_mut_slice::<f32>()?;
    for (gray, rgb) in output.iter_mut().zip(input.chunks_exact(3)) {
        *gray = LUMA_R * rgb[0] + LUMA_G * rgb[1] + LUMA_B * rgb[2];
    }
    Ok(())
}
