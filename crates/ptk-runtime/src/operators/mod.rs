//! Pixel kernels used by the preprocessor.
//!
//! Every operator checks dtype, rank and shape before touching memory and
//! reports problems as `InvalidArgument`. Sources are [`TensorView`]s and
//! destinations [`TensorViewMut`]s, so no operator allocates.
mod cast;
mod color;
mod geometry;
mod layout;
mod normalize;

pub use cast::{cast_f32_to_u8, cast_u8_to_f32};
pub use color::{bgr_to_rgb, rgb_to_bgr, rgb_to_gray};
pub use geometry::{add_batch_dim, center_crop};
pub use layout::{chw_to_hwc, hwc_to_chw};
pub use normalize::{NormalizationParams, normalize};

use crate::data::{TensorShape, TensorView, TensorViewMut};
use crate::error::{Result, RuntimeError};
use crate::types::DataType;

fn ensure_dtype(op: &str, what: &str, actual: DataType, expected: DataType) -> Result<()> {
    if actual != expected {
        return Err(RuntimeError::invalid_argument(format!(
            "{op}: expects {expected} {what}, got {actual}"
        )));
    }
    Ok(())
}

fn ensure_non_empty(op: &str, src: &TensorView<'_>, dst: &TensorViewMut<'_>) -> Result<()> {
    if src.is_empty() || dst.is_empty() {
        return Err(RuntimeError::invalid_argument(format!(
            "{op}: empty source or destination tensor"
        )));
    }
    Ok(())
}

/// The three dimensions of a rank-3 shape, all strictly positive.
fn dims3(op: &str, shape: &TensorShape) -> Result<[usize; 3]> {
    if shape.rank() != 3 {
        return Err(RuntimeError::invalid_argument(format!(
            "{op}: expects a rank 3 tensor, got shape {shape}"
        )));
    }
    let mut dims = [0usize; 3];
    for (i, dim) in dims.iter_mut().enumerate() {
        *dim = positive(op, shape.dim(i))?;
    }
    Ok(dims)
}

fn positive(op: &str, dim: i64) -> Result<usize> {
    match usize::try_from(dim) {
        Ok(d) if d > 0 => Ok(d),
        _ => Err(RuntimeError::invalid_argument(format!(
            "{op}: non positive dimension {dim}"
        ))),
    }
}
