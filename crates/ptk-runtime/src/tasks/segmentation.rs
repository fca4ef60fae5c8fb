use super::output::{IGNORE_LABEL, SegmentationMask, TaskOutput, TaskPayload};
use super::spec::{CoordinateSystem, InputSpec, Invariant, OutputSpec, TaskMetadata, TaskSpec};
use super::{TaskContract, TaskInput, image_passthrough, validate_image_input};
use crate::data::{Tensor, TensorView};
use crate::error::{Result, RuntimeError};
use crate::types::DataType;
use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SegmentationType {
    #[default]
    Instance,
    Semantic,
    Panoptic,
}

/// How the model encodes its mask output.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MaskFormat {
    /// `[H, W]` or `[B, H, W]` class ids, `uint8` or `int32`.
    #[default]
    ClassIds,
    /// `[H, W, C]` float32 per-class probabilities.
    Probabilities,
    /// `[H, W, C]` float32 per-class scores.
    Logits,
}

/// Per-pixel classification of an RGB image into a fixed label set.
#[derive(Debug)]
pub struct SegmentationContract {
    spec: TaskSpec,
    seg_type: SegmentationType,
    mask_format: MaskFormat,
}

impl SegmentationContract {
    pub fn new(
        class_labels: Vec<String>,
        seg_type: SegmentationType,
        mask_format: MaskFormat,
    ) -> Self {
        let (semantic_meaning, dtype) = match mask_format {
            MaskFormat::ClassIds => (
                "Class ID per pixel [H, W], values in [0, num_classes-1]",
                DataType::Uint8,
            ),
            MaskFormat::Probabilities => (
                "Probability maps [H, W, num_classes], values in [0.0, 1.0]",
                DataType::Float32,
            ),
            MaskFormat::Logits => (
                "Logit scores [H, W, num_classes], values in (-inf, +inf)",
                DataType::Float32,
            ),
        };

        let num_classes = class_labels.len();
        let spec = TaskSpec {
            name: "Segmentation".to_string(),
            description: "Segment objects in an image".to_string(),
            inputs: vec![InputSpec::rgb_image("image")],
            outputs: vec![OutputSpec {
                name: "segmentation mask".to_string(),
                semantic_meaning: semantic_meaning.to_string(),
                dtype,
                coordinate_system: CoordinateSystem::ImagePixels,
            }],
            metadata: TaskMetadata {
                classes: class_labels,
                min_confidence: 0.0,
                max_confidence: 1.0,
                requires_nms: false,
            },
            invariants: vec![
                Invariant::new("A segmentation mask must be present", |output| {
                    match output.segmentation() {
                        Some(_) => Ok(()),
                        None => Err(RuntimeError::failed_precondition(
                            "Segmentation mask is missing",
                        )),
                    }
                }),
                Invariant::new(
                    "Class IDs must be in valid range [0, num_classes-1] or 255 (ignore)",
                    move |output| {
                        let Some(mask) = output.segmentation() else {
                            return Ok(());
                        };
                        match mask
                            .mask
                            .iter()
                            .find(|id| usize::from(**id) >= num_classes && **id != IGNORE_LABEL)
                        {
                            Some(id) => Err(RuntimeError::failed_precondition(format!(
                                "Invalid class ID in mask: {id}"
                            ))),
                            None => Ok(()),
                        }
                    },
                ),
            ],
        };

        Self {
            spec,
            seg_type,
            mask_format,
        }
    }

    pub fn mask_format(&self) -> MaskFormat {
        self.mask_format
    }

    pub fn segmentation_type(&self) -> SegmentationType {
        self.seg_type
    }

    pub fn class_labels(&self) -> &[String] {
        &self.spec.metadata.classes
    }

    /// Shape checks every decoded mask has to pass.
    pub fn validate_mask_invariants(mask: &SegmentationMask) -> Result<()> {
        if mask.height == 0 || mask.width == 0 {
            return Err(RuntimeError::failed_precondition(format!(
                "Invalid mask dimensions {}x{}",
                mask.width, mask.height
            )));
        }
        if mask.mask.len() != mask.height * mask.width {
            return Err(RuntimeError::failed_precondition(format!(
                "Mask data size {} doesn't match dimensions {}x{}",
                mask.mask.len(),
                mask.width,
                mask.height
            )));
        }
        Ok(())
    }

    /// Per-pixel argmax of an `[H, W, C]` float32 score tensor. Ties keep the
    /// lowest class index.
    pub fn scores_to_class_ids(&self, scores: &TensorView<'_>) -> Result<Vec<u8>> {
        let (height, width, classes) = hwc_scores(scores)?;
        let values = scores.as_slice::<f32>()?;
        let mut class_ids = vec![0u8; height * width];
        for (pixel, id) in class_ids.iter_mut().enumerate() {
            let row = &values[pixel * classes..(pixel + 1) * classes];
            let mut best = 0;
            for c in 1..classes {
                if row[c] > row[best] {
                    best = c;
                }
            }
            // hwc_scores caps the class count below the ignore label
            *id = best as u8;
        }
        Ok(class_ids)
    }

    /// Numerically stable softmax over the channel axis of `[H, W, C]` logits.
    pub fn apply_softmax(&self, logits: &TensorView<'_>) -> Result<Tensor> {
        let (_, _, classes) = hwc_scores(logits)?;
        let mut probabilities = logits.as_slice::<f32>()?.to_vec();
        for row in probabilities.chunks_exact_mut(classes) {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0;
            for v in row.iter_mut() {
                *v = (*v - max).exp();
                sum += *v;
            }
            for v in row.iter_mut() {
                *v /= sum;
            }
        }
        Tensor::from_vec(probabilities, logits.shape().clone())
    }

    /// Nearest neighbour resize, e.g. back to the original frame size when the
    /// model downsamples.
    pub fn resize_mask(
        mask: &SegmentationMask,
        height: usize,
        width: usize,
    ) -> Result<SegmentationMask> {
        Self::validate_mask_invariants(mask)?;
        if height == 0 || width == 0 {
            return Err(RuntimeError::invalid_argument(format!(
                "Cannot resize mask to {width}x{height}"
            )));
        }
        let mut resized = Vec::with_capacity(height * width);
        for y in 0..height {
            let src_y = y * mask.height / height;
            for x in 0..width {
                let src_x = x * mask.width / width;
                resized.push(mask.mask[src_y * mask.width + src_x]);
            }
        }
        Ok(SegmentationMask {
            height,
            width,
            mask: resized,
            class_names: mask.class_names.clone(),
            dtype: DataType::Uint8,
        })
    }

    fn new_mask(&self, height: usize, width: usize, mask: Vec<u8>) -> TaskOutput {
        TaskOutput::with_payload(TaskPayload::Segmentation(SegmentationMask {
            height,
            width,
            mask,
            class_names: self.class_labels().to_vec(),
            dtype: DataType::Uint8,
        }))
    }

    fn parse_class_id_mask(&self, tensor: &TensorView<'_>) -> Result<TaskOutput> {
        let shape = tensor.shape();
        let (h, w) = match shape.rank() {
            2 => (shape.dim(0), shape.dim(1)),
            3 => {
                positive(shape.dim(0))?;
                (shape.dim(1), shape.dim(2))
            }
            _ => {
                return Err(RuntimeError::invalid_argument(format!(
                    "Expected 2D (H,W) or 3D (B,H,W) mask tensor, got shape {shape}"
                )));
            }
        };
        let (height, width) = (positive(h)?, positive(w)?);
        let pixels = height.checked_mul(width).ok_or_else(|| {
            RuntimeError::invalid_argument(format!("Mask shape {shape} is too large"))
        })?;

        let too_short = || {
            RuntimeError::invalid_argument(format!(
                "Mask tensor of shape {shape} holds fewer than {pixels} class IDs"
            ))
        };
        let mask = match tensor.dtype() {
            DataType::Uint8 => tensor
                .as_slice::<u8>()?
                .get(..pixels)
                .ok_or_else(too_short)?
                .to_vec(),
            DataType::Int32 => tensor
                .as_slice::<i32>()?
                .get(..pixels)
                .ok_or_else(too_short)?
                .iter()
                .map(|id| *id as u8)
                .collect(),
            other => {
                return Err(RuntimeError::invalid_argument(format!(
                    "Unsupported mask tensor dtype for class IDs: {other}"
                )));
            }
        };
        Ok(self.new_mask(height, width, mask))
    }

    fn parse_score_mask(&self, tensor: &TensorView<'_>) -> Result<TaskOutput> {
        let (height, width, _) = hwc_scores(tensor)?;
        let mask = self.scores_to_class_ids(tensor)?;
        Ok(self.new_mask(height, width, mask))
    }
}

fn positive(dim: i64) -> Result<usize> {
    match usize::try_from(dim) {
        Ok(d) if d > 0 => Ok(d),
        _ => Err(RuntimeError::invalid_argument(format!(
            "Mask dimension must be positive, got {dim}"
        ))),
    }
}

/// `(height, width, classes)` of an `[H, W, C]` float32 score tensor.
fn hwc_scores(tensor: &TensorView<'_>) -> Result<(usize, usize, usize)> {
    let shape = tensor.shape();
    if shape.rank() != 3 {
        return Err(RuntimeError::invalid_argument(format!(
            "Expected 3D (H,W,C) score tensor, got shape {shape}"
        )));
    }
    if tensor.dtype() != DataType::Float32 {
        return Err(RuntimeError::invalid_argument(format!(
            "Expected float32 scores, got {}",
            tensor.dtype()
        )));
    }
    let (height, width, classes) = (
        positive(shape.dim(0))?,
        positive(shape.dim(1))?,
        positive(shape.dim(2))?,
    );
    if classes > usize::from(IGNORE_LABEL) {
        return Err(RuntimeError::invalid_argument(format!(
            "{classes} classes cannot be encoded in a uint8 mask"
        )));
    }
    Ok((height, width, classes))
}

impl TaskContract for SegmentationContract {
    fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    fn validate_input(&self, input: &TaskInput<'_>) -> Result<()> {
        validate_image_input(input)
    }

    fn pre_process<'a>(&self, input: &TaskInput<'a>) -> Result<Vec<TensorView<'a>>> {
        Ok(image_passthrough(input))
    }

    fn post_process(
        &self,
        raw_outputs: &[TensorView<'_>],
        _input: &TaskInput<'_>,
    ) -> Result<TaskOutput> {
        let Some(first) = raw_outputs.first() else {
            return Err(RuntimeError::invalid_argument(
                "No output tensors from model",
            ));
        };
        match self.mask_format {
            MaskFormat::ClassIds => self.parse_class_id_mask(first),
            MaskFormat::Probabilities | MaskFormat::Logits => self.parse_score_mask(first),
        }
    }

    fn validate_output(&self, output: &TaskOutput) -> Result<()> {
        self.spec.check_invariants(output)?;
        match output.segmentation() {
            Some(mask) => Self::validate_mask_invariants(mask),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("class{i}")).collect()
    }

    fn contract(format: MaskFormat) -> SegmentationContract {
        SegmentationContract::new(labels(3), SegmentationType::Semantic, format)
    }

    fn mask_output(mask: Vec<u8>, height: usize, width: usize) -> TaskOutput {
        TaskOutput::with_payload(TaskPayload::Segmentation(SegmentationMask {
            height,
            width,
            mask,
            class_names: labels(3),
            dtype: DataType::Uint8,
        }))
    }

    #[test]
    fn logits_decode_to_argmax() {
        #[rustfmt::skip]
        let logits = [
            0.1f32, 5.0, -1.0,   0.0, 0.0, 9.0,
            2.0, 2.0, 1.0,       -3.0, -2.0, -1.0,
        ];
        let view = TensorView::from_slice(&logits, [2, 2, 3]);
        let ids = contract(MaskFormat::Logits)
            .scores_to_class_ids(&view)
            .unwrap();
        // ties keep the lowest index
        assert_eq!(ids, vec![1, 2, 0, 2]);
    }

    #[test]
    fn zero_classes_is_rejected() {
        let values: [f32; 0] = [];
        let view = TensorView::from_slice(&values, [2, 2, 0]);
        assert!(
            contract(MaskFormat::Logits)
                .scores_to_class_ids(&view)
                .is_err()
        );
    }

    #[rstest]
    #[case::zero(0, true)]
    #[case::last_class(2, true)]
    #[case::ignore(255, true)]
    #[case::first_invalid(3, false)]
    #[case::just_below_ignore(254, false)]
    fn class_id_range(#[case] id: u8, #[case] valid: bool) {
        let output = mask_output(vec![0, id], 1, 2);
        assert_eq!(
            contract(MaskFormat::ClassIds)
                .validate_output(&output)
                .is_ok(),
            valid
        );
    }

    #[test]
    fn without_labels_only_ignore_is_valid() {
        let contract =
            SegmentationContract::new(Vec::new(), SegmentationType::Semantic, MaskFormat::ClassIds);
        assert!(contract.validate_output(&mask_output(vec![255], 1, 1)).is_ok());
        assert!(contract.validate_output(&mask_output(vec![0], 1, 1)).is_err());
    }

    #[test]
    fn missing_mask_fails_validation() {
        let err = contract(MaskFormat::ClassIds)
            .validate_output(&TaskOutput::default())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::FailedPrecondition(_)));
    }

    #[test]
    fn mask_size_must_match_dimensions() {
        let err = contract(MaskFormat::ClassIds)
            .validate_output(&mask_output(vec![0, 1, 2], 2, 2))
            .unwrap_err();
        assert!(err.message().contains("doesn't match"));
    }

    #[test]
    fn int32_class_ids_are_narrowed() {
        let ids = [0i32, 1, 2, 255, 1, 0];
        let view = TensorView::from_slice(&ids, [1, 2, 3]);
        let output = contract(MaskFormat::ClassIds)
            .parse_class_id_mask(&view)
            .unwrap();
        let mask = output.segmentation().unwrap();
        assert_eq!((mask.height, mask.width), (2, 3));
        assert_eq!(mask.mask, vec![0, 1, 2, 255, 1, 0]);
    }

    #[test]
    fn float_class_ids_are_rejected() {
        let ids = [0f32; 4];
        let err = contract(MaskFormat::ClassIds)
            .parse_class_id_mask(&TensorView::from_slice(&ids, [2, 2]))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let ids = [0u8; 3];
        assert!(
            contract(MaskFormat::ClassIds)
                .parse_class_id_mask(&TensorView::from_slice(&ids, [2, 2]))
                .is_err()
        );
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let logits = [1f32, 2., 3., 1000., 1000., 1000.];
        let probabilities = contract(MaskFormat::Logits)
            .apply_softmax(&TensorView::from_slice(&logits, [1, 2, 3]))
            .unwrap();
        let values = probabilities.as_slice::<f32>().unwrap();
        assert!((values[..3].iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(values[2] > values[1] && values[1] > values[0]);
        assert!((values[3] - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn resize_uses_nearest_neighbour() {
        let mask = SegmentationMask {
            height: 2,
            width: 2,
            mask: vec![0, 1, 2, 255],
            class_names: labels(3),
            dtype: DataType::Uint8,
        };
        let resized = SegmentationContract::resize_mask(&mask, 4, 4).unwrap();
        assert_eq!(resized.mask[..4], [0, 0, 1, 1]);
        assert_eq!(resized.mask[12..], [2, 2, 255, 255]);

        let shrunk = SegmentationContract::resize_mask(&resized, 2, 2).unwrap();
        assert_eq!(shrunk.mask, mask.mask);
        assert!(SegmentationContract::resize_mask(&mask, 0, 2).is_err());
    }

    #[test]
    fn spec_describes_the_format() {
        let contract = contract(MaskFormat::Probabilities);
        let spec = contract.spec();
        assert_eq!(spec.name, "Segmentation");
        assert_eq!(spec.outputs[0].dtype, DataType::Float32);
        assert_eq!(spec.invariants.len(), 2);
        assert_eq!(contract.segmentation_type(), SegmentationType::Semantic);
        assert_eq!("logits".parse::<MaskFormat>().unwrap(), MaskFormat::Logits);
    }
}
