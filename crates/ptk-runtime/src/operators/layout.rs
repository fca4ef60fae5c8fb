use super::{dims3, ensure_dtype, ensure_non_empty};
use crate::data::{TensorView, TensorViewMut};
use crate::error::{Result, RuntimeError};
use crate::types::DataType;

fn check(op: &str, src: &TensorView<'_>, dst: &TensorViewMut<'_>) -> Result<([usize; 3], [usize; 3])> {
    ensure_non_empty(op, src, dst)?;
    ensure_dtype(op, "source", src.dtype(), DataType::Float32)?;
    ensure_dtype(op, "destination", dst.dtype(), DataType::Float32)?;
    Ok((dims3(op, src.shape())?, dims3(op, dst.shape())?))
}

/// `[H, W, C]` to `[C, H, W]`.
pub fn hwc_to_chw(src: &TensorView<'_>, dst: &mut TensorViewMut<'_>) -> Result<()> {
    const OP: &str = "hwc_to_chw";
    let ([h, w, c], dst_dims) = check(OP, src, dst)?;
    if dst_dims != [c, h, w] {
        return Err(RuntimeError::invalid_argument(format!(
            "{OP}: destination shape must be [C,H,W] = [{c}, {h}, {w}]"
        )));
    }

    let input = src.as_slice::<f32>()?;
    let output = dst.as_mut_slice::<f32>()?;
    for y in 0..h {
        for x in 0..w {
            for ch in 0..c {
                output[(ch * h + y) * w + x] = input[(y * w + x) * c + ch];
            }
        }
    }
    Ok(())
}

/// `[C, H, W]` to `[H, W, C]`.
pub fn chw_to_hwc(src: &TensorView<'_>, dst: &mut TensorViewMut<'_>) -> Result<()> {
    const OP: &str = "chw_to_hwc";
    let ([c, h, w], dst_dims) = check(OP, src, dst)?;
    if dst_dims != [h, w, c] {
        return Err(RuntimeError::invalid_argument(format!(
            "{OP}: destination shape must be [H,W,C] = [{h}, {w}, {c}]"
        )));
    }

    let input = src.as_slice::<f32>()?;
    let output = dst.as_mut_slice::<f32>()?;
    for ch in 0..c {
        for y in 0..h {
            for x in 0..w {
                output[(y * w + x) * c + ch] = input[(ch * h + y) * w + x];
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_channels_to_the_front() {
        // 1x2 image, channels (r, g, b) = (1, 2, 3) and (4, 5, 6)
        let hwc = [1f32, 2., 3., 4., 5., 6.];
        let mut chw = [0f32; 6];
        hwc_to_chw(
            &TensorView::from_slice(&hwc, [1, 2, 3]),
            &mut TensorViewMut::from_slice(&mut chw, [3, 1, 2]),
        )
        .unwrap();
        assert_eq!(chw, [1., 4., 2., 5., 3., 6.]);

        let mut back = [0f32; 6];
        chw_to_hwc(
            &TensorView::from_slice(&chw, [3, 1, 2]),
            &mut TensorViewMut::from_slice(&mut back, [1, 2, 3]),
        )
        .unwrap();
        assert_eq!(back, hwc);
    }

    #[test]
    fn rejects_mismatched_destination() {
        let hwc = [0f32; 6];
        let mut dst = [0f32; 6];
        let err = hwc_to_chw(
            &TensorView::from_slice(&hwc, [1, 2, 3]),
            &mut TensorViewMut::from_slice(&mut dst, [1, 2, 3]),
        )
        .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_wrong_rank() {
        let hwc = [0f32; 6];
        let mut dst = [0f32; 6];
        assert!(
            hwc_to_chw(
                &TensorView::from_slice(&hwc, [6]),
                &mut TensorViewMut::from_slice(&mut dst, [3, 1, 2]),
            )
            .is_err()
        );
    }
}
