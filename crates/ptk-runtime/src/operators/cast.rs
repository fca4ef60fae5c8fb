use super::{ensure_dtype, ensure_non_empty};
use crate::data::{TensorView, TensorViewMut};
use crate::error::{Result, RuntimeError};
use crate::types::DataType;

fn ensure_same_count(op: &str, src: &TensorView<'_>, dst: &TensorViewMut<'_>) -> Result<()> {
    if src.num_elements() != dst.num_elements() {
        return Err(RuntimeError::invalid_argument(format!(
            "{op}: element count mismatch ({} vs {})",
            src.num_elements(),
            dst.num_elements()
        )));
    }
    Ok(())
}

/// Widens every byte to a float, `[0, 255]` in, `[0.0, 255.0]` out.
pub fn cast_u8_to_f32(src: &TensorView<'_>, dst: &mut TensorViewMut<'_>) -> Result<()> {
    const OP: &str = "cast_u8_to_f32";
    ensure_non_empty(OP, src, dst)?;
    ensure_dtype(OP, "source", src.dtype(), DataType::Uint8)?;
    ensure_dtype(OP, "destination", dst.dtype(), DataType::Float32)?;
    ensure_same_count(OP, src, dst)?;

    let input = src.as_slice::<u8>()?;
    let output = dst.as_mut_slice::<f32>()?;
    for (o, i) in output.iter_mut().zip(input) {
        *o = f32::from(*i);
    }
    Ok(())
}

/// Narrows floats back to bytes by truncating the fractional part. Values are
/// not clamped first; out of range inputs saturate at the `u8` bounds.
pub fn cast_f32_to_u8(src: &TensorView<'_>, dst: &mut TensorViewMut<'_>) -> Result<()> {
    const OP: &str = "cast_f32_to_u8";
    ensure_non_empty(OP, src, dst)?;
    ensure_dtype(OP, "source", src.dtype(), DataType::Float32)?;
    ensure_dtype(OP, "destination", dst.dtype(), DataType::Uint8)?;
    ensure_same_count(OP, src, dst)?;

    let input = src.as_slice::<f32>()?;
    let output = dst.as_mut_slice::<u8>()?;
    for (o, i) in output.iter_mut().zip(input) {
        *o = *i as u8;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_survive_a_round_trip() {
        let original: Vec<u8> = (0..=255).collect();
        let mut floats = vec![0f32; 256];
        let mut back = vec![0u8; 256];

        cast_u8_to_f32(
            &TensorView::from_slice(&original, [16, 16]),
            &mut TensorViewMut::from_slice(&mut floats, [16, 16]),
        )
        .unwrap();
        assert_eq!(floats[200], 200.0);

        cast_f32_to_u8(
            &TensorView::from_slice(&floats, [16, 16]),
            &mut TensorViewMut::from_slice(&mut back, [16, 16]),
        )
        .unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn narrowing_truncates() {
        let floats = [1.9f32, 254.99, 0.2];
        let mut bytes = [0u8; 3];
        cast_f32_to_u8(
            &TensorView::from_slice(&floats, [3]),
            &mut TensorViewMut::from_slice(&mut bytes, [3]),
        )
        .unwrap();
        assert_eq!(bytes, [1, 254, 0]);
    }

    #[test]
    fn rejects_wrong_dtype_and_count() {
        let bytes = [0u8; 4];
        let mut wrong = [0i32; 4];
        let err = cast_u8_to_f32(
            &TensorView::from_slice(&bytes, [4]),
            &mut TensorViewMut::from_slice(&mut wrong, [4]),
        )
        .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)));

        let mut short = [0f32; 3];
        assert!(
            cast_u8_to_f32(
                &TensorView::from_slice(&bytes, [4]),
                &mut TensorViewMut::from_slice(&mut short, [3]),
            )
            .is_err()
        );
    }

    #[test]
    fn rejects_empty_tensors() {
        let mut floats = [0f32; 1];
        let err = cast_u8_to_f32(
            &TensorView::default(),
            &mut TensorViewMut::from_slice(&mut floats, [1]),
        )
        .unwrap_err();
        assert!(err.message().contains("empty"));
    }
}
