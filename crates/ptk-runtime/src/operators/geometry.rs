use super::{dims3, ensure_non_empty};
use crate::data::{TensorShape, TensorView, TensorViewMut};
use crate::error::{Result, RuntimeError};

/// Prepends a batch dimension of 1. Only the shape changes; the returned view
/// shares the source bytes.
pub fn add_batch_dim<'a>(src: &TensorView<'a>) -> Result<TensorView<'a>> {
    if src.is_empty() {
        return Err(RuntimeError::invalid_argument("add_batch_dim: empty tensor"));
    }
    let mut dims = Vec::with_capacity(src.shape().rank() + 1);
    dims.push(1);
    dims.extend_from_slice(src.shape().dims());
    src.reshaped(TensorShape::new(dims))
}

/// Copies the centered `[crop_h, crop_w, C]` window of an `[H, W, C]` tensor.
/// The crop size is taken from the destination shape. Works for any dtype.
pub fn center_crop(src: &TensorView<'_>, dst: &mut TensorViewMut<'_>) -> Result<()> {
    const OP: &str = "center_crop";
    ensure_non_empty(OP, src, dst)?;
    if src.dtype() != dst.dtype() {
        return Err(RuntimeError::invalid_argument(format!(
            "{OP}: source is {}, destination is {}",
            src.dtype(),
            dst.dtype()
        )));
    }
    let [h, w, c] = dims3(OP, src.shape())?;
    let [crop_h, crop_w, crop_c] = dims3(OP, dst.shape())?;
    if crop_c != c || crop_h > h || crop_w > w {
        return Err(RuntimeError::invalid_argument(format!(
            "{OP}: cannot crop [{crop_h}, {crop_w}, {crop_c}] out of [{h}, {w}, {c}]"
        )));
    }

    let pixel = c * src.element_size();
    let src_bytes = src.buffer().data();
    let dst_len = crop_h * crop_w * pixel;
    if src_bytes.len() < h * w * pixel || dst.data_mut().len() < dst_len {
        return Err(RuntimeError::invalid_argument(format!(
            "{OP}: buffers are smaller than their shapes"
        )));
    }

    let top = (h - crop_h) / 2;
    let left = (w - crop_w) / 2;
    let row = crop_w * pixel;
    let out = dst.data_mut();
    for y in 0..crop_h {
        let start = ((top + y) * w + left) * pixel;
        out[y * row..(y + 1) * row].copy_from_slice(&src_bytes[start..start + row]);
    }
    Ok(())
}
