use super::*;
use crate::data::Frame;
use crate::engine::{EngineError, PassthroughEngine};
use crate::types::{DataType, PixelFormat, TensorLayout};
use rstest::rstest;
use std::path::Path;
use strum::IntoEnumIterator;

/// Returns the same canned outputs for every call.
struct CannedEngine {
    outputs: Vec<Tensor>,
}

impl Engine for CannedEngine {
    fn load(&mut self, _model_path: &Path) -> Result<(), EngineError> {
        Ok(())
    }

    fn infer(&mut self, _inputs: &[TensorView<'_>]) -> Result<Vec<Tensor>, EngineError> {
        Ok(self.outputs.clone())
    }

    fn input_names(&self) -> Vec<String> {
        vec!["image".into()]
    }

    fn output_names(&self) -> Vec<String> {
        (0..self.outputs.len()).map(|i| format!("out{i}")).collect()
    }
}

struct BrokenEngine;

impl Engine for BrokenEngine {
    fn load(&mut self, model_path: &Path) -> Result<(), EngineError> {
        Err(EngineError::LoadFailed {
            path: model_path.to_path_buf(),
            reason: "unsupported".into(),
        })
    }

    fn infer(&mut self, _inputs: &[TensorView<'_>]) -> Result<Vec<Tensor>, EngineError> {
        Err(EngineError::Backend(anyhow::anyhow!("device lost")))
    }

    fn input_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn output_names(&self) -> Vec<String> {
        Vec::new()
    }
}

fn rgb_labels() -> Vec<String> {
    vec!["red".into(), "green".into(), "blue".into()]
}

fn segmentation(format: MaskFormat) -> SegmentationContract {
    SegmentationContract::new(rgb_labels(), SegmentationType::Semantic, format)
}

/// A `[2, 2, 3]` float frame whose pixel (0, 0) holds `[0.1, 5.0, -1.0]`.
fn logit_frame() -> Frame {
    #[rustfmt::skip]
    let values = vec![
        0.1f32, 5.0, -1.0,   3.0, 0.0, 0.0,
        0.0, 0.0, 4.0,       0.2, 0.1, 0.0,
    ];
    let mut frame = Frame::new(
        Tensor::from_vec(values, [2, 2, 3]).unwrap(),
        PixelFormat::Rgb8,
        TensorLayout::Hwc,
    );
    frame.timestamp_ns = 1_000;
    frame.frame_index = 7;
    frame
}

#[test]
fn logits_pipeline_end_to_end() {
    let frame = logit_frame();
    let mut engine = PassthroughEngine::new(["image"], ["logits"]).loaded();
    let contract = segmentation(MaskFormat::Logits);
    contract.validate_model(&engine).unwrap();

    let result = contract.execute(&mut engine, &TaskInput::new(&frame));
    assert!(result.is_ok(), "{:?}", result.status);

    let output = result.output;
    assert!(output.success);
    assert_eq!(output.task_type, "Segmentation");
    assert_eq!(output.timestamp_ns, 1_000);
    assert_eq!(output.frame_index, 7);
    assert!(output.inference_time_ms >= 0.0);

    let mask = output.segmentation().unwrap();
    assert_eq!((mask.height, mask.width), (2, 2));
    assert_eq!(mask.at(0, 0), Some(1));
    assert_eq!(mask.mask, vec![1, 0, 2, 0]);
    assert_eq!(mask.class_names, rgb_labels());
    assert_eq!(mask.dtype, DataType::Uint8);
}

#[test]
fn probabilities_decode_like_logits() {
    let frame = logit_frame();
    let softmax = segmentation(MaskFormat::Logits)
        .apply_softmax(&frame.image_view())
        .unwrap();
    let probabilities = Frame::new(softmax, PixelFormat::Rgb8, TensorLayout::Hwc);

    let mut engine = PassthroughEngine::default().loaded();
    let from_logits = segmentation(MaskFormat::Logits)
        .execute(&mut engine, &TaskInput::new(&frame))
        .into_result()
        .unwrap();
    let from_probabilities = segmentation(MaskFormat::Probabilities)
        .execute(&mut engine, &TaskInput::new(&probabilities))
        .into_result()
        .unwrap();
    assert_eq!(
        from_logits.segmentation().unwrap().mask,
        from_probabilities.segmentation().unwrap().mask
    );
}

#[test]
fn empty_outputs_are_invalid_for_every_format() {
    let frame = logit_frame();
    for format in MaskFormat::iter() {
        let err = segmentation(format)
            .post_process(&[], &TaskInput::new(&frame))
            .unwrap_err();
        assert!(
            matches!(err, RuntimeError::InvalidArgument(_)),
            "{format}: {err}"
        );
    }
}

#[test]
fn class_ids_are_copied_byte_for_byte() {
    let ids: Vec<u8> = (0..16).map(|i| i % 3).collect();
    let frame = logit_frame();
    let output = segmentation(MaskFormat::ClassIds)
        .post_process(
            &[TensorView::from_slice(&ids, [4, 4])],
            &TaskInput::new(&frame),
        )
        .unwrap();
    let mask = output.segmentation().unwrap();
    assert_eq!((mask.height, mask.width), (4, 4));
    assert_eq!(mask.mask.len(), 16);
    assert_eq!(mask.mask, ids);
}

#[rstest]
#[case::empty_batch(&[], [0, 2, 2])]
#[case::overflowing_batch(&[0, 1, 2, 0], [i64::MAX, 2, 2])]
#[case::negative_batch(&[0, 1, 2, 0], [-1, 2, 2])]
#[case::buffer_too_short(&[0, 1, 2], [1, 2, 2])]
#[case::overflowing_plane(&[0, 1, 2, 0], [1, i64::MAX, i64::MAX])]
fn malformed_class_id_outputs_are_invalid(#[case] ids: &[u8], #[case] shape: [i64; 3]) {
    let frame = logit_frame();
    let err = segmentation(MaskFormat::ClassIds)
        .post_process(&[TensorView::from_slice(ids, shape)], &TaskInput::new(&frame))
        .unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidArgument(_)), "{err}");
}

#[test]
fn overflowing_rank_two_mask_is_invalid() {
    let frame = logit_frame();
    let ids = [0u8; 4];
    let err = segmentation(MaskFormat::ClassIds)
        .post_process(
            &[TensorView::from_slice(&ids, [i64::MAX, i64::MAX])],
            &TaskInput::new(&frame),
        )
        .unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidArgument(_)));
}

#[test]
fn overflowing_score_shape_is_invalid() {
    let frame = logit_frame();
    let scores = [0f32; 12];
    for format in [MaskFormat::Logits, MaskFormat::Probabilities] {
        let err = segmentation(format)
            .post_process(
                &[TensorView::from_slice(&scores, [i64::MAX, 2, 3])],
                &TaskInput::new(&frame),
            )
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)), "{format}: {err}");
    }
}

#[test]
fn batched_class_ids_use_trailing_dims() {
    let frame = logit_frame();
    let mut engine = CannedEngine {
        outputs: vec![Tensor::from_vec(vec![0u8, 1, 2, 255, 0, 1], [1, 2, 3]).unwrap()],
    };
    let output = segmentation(MaskFormat::ClassIds)
        .execute(&mut engine, &TaskInput::new(&frame))
        .into_result()
        .unwrap();
    let mask = output.segmentation().unwrap();
    assert_eq!((mask.height, mask.width), (2, 3));
}

#[test]
fn invalid_class_id_fails_validation_but_keeps_output() {
    let frame = logit_frame();
    let mut engine = CannedEngine {
        outputs: vec![Tensor::from_vec(vec![0u8, 1, 7, 2], [2, 2]).unwrap()],
    };
    let result = segmentation(MaskFormat::ClassIds).execute(&mut engine, &TaskInput::new(&frame));

    assert!(matches!(
        result.status,
        Err(RuntimeError::FailedPrecondition(_))
    ));
    assert!(!result.output.success);
    // The decoded mask and the stamped metadata are still there.
    assert_eq!(result.output.segmentation().unwrap().mask, vec![0, 1, 7, 2]);
    assert_eq!(result.output.frame_index, 7);
}

#[test]
fn engine_failure_is_internal_and_recoverable() {
    let frame = logit_frame();
    let contract = segmentation(MaskFormat::Logits);

    let result = contract.execute(&mut BrokenEngine, &TaskInput::new(&frame));
    let err = result.status.unwrap_err();
    assert!(matches!(err, RuntimeError::Internal(_)));
    assert!(err.message().starts_with("Engine inference failed: "));
    assert!(err.message().contains("device lost"));
    assert!(!result.output.success);

    // The same contract keeps working with a healthy engine.
    let mut engine = PassthroughEngine::default().loaded();
    assert!(contract.execute(&mut engine, &TaskInput::new(&frame)).is_ok());
}

#[rstest]
#[case::empty(Tensor::default())]
#[case::rank_two(Tensor::zeros(DataType::Float32, [4, 3]).unwrap())]
#[case::four_channels(Tensor::zeros(DataType::Float32, [2, 2, 4]).unwrap())]
#[case::batched_gray(Tensor::zeros(DataType::Float32, [1, 2, 2, 1]).unwrap())]
fn malformed_inputs_are_rejected(#[case] image: Tensor) {
    let frame = Frame::new(image, PixelFormat::Rgb8, TensorLayout::Hwc);
    let mut engine = PassthroughEngine::default().loaded();
    let result = segmentation(MaskFormat::Logits).execute(&mut engine, &TaskInput::new(&frame));
    assert!(matches!(
        result.status,
        Err(RuntimeError::InvalidArgument(_))
    ));
    assert_eq!(engine.calls(), 0);
}

#[test]
fn batched_rgb_input_is_accepted() {
    let frame = Frame::new(
        Tensor::zeros(DataType::Float32, [1, 2, 2, 3]).unwrap(),
        PixelFormat::Rgb8,
        TensorLayout::Nhwc,
    );
    segmentation(MaskFormat::Logits)
        .validate_input(&TaskInput::new(&frame))
        .unwrap();
}

#[test]
fn model_validation_requires_names() {
    let contract = segmentation(MaskFormat::ClassIds);
    let err = contract.validate_model(&BrokenEngine).unwrap_err();
    assert!(matches!(err, RuntimeError::FailedPrecondition(_)));
    assert!(
        contract
            .validate_model(&PassthroughEngine::default())
            .is_err()
    );
    assert!(
        contract
            .validate_model(&PassthroughEngine::default().loaded())
            .is_ok()
    );
}

#[test]
fn detection_end_to_end() {
    let frame = logit_frame();
    let mut engine = CannedEngine {
        outputs: vec![
            Tensor::from_vec(vec![0.1f32, 0.2, 0.4, 0.6, 0.0, 0.0, 1.0, 1.0], [2, 4]).unwrap(),
            Tensor::from_vec(vec![0i32, 1], [2]).unwrap(),
            Tensor::from_vec(vec![0.8f32, 0.1], [2]).unwrap(),
        ],
    };
    let contract = DetectionContract::with_min_confidence(
        vec!["cat".into(), "dog".into()],
        CoordinateSystem::Normalized,
        0.25,
    );
    contract.validate_model(&engine).unwrap();

    let output = contract
        .execute(&mut engine, &TaskInput::new(&frame))
        .into_result()
        .unwrap();
    assert_eq!(output.task_type, "ObjectDetection");
    let detections = output.detections().unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].label.as_deref(), Some("cat"));
    assert_eq!(detections[0].score, 0.8);
}

#[test]
fn contracts_are_usable_as_trait_objects() {
    let contracts: Vec<Box<dyn TaskContract>> = vec![
        Box::new(segmentation(MaskFormat::Logits)),
        Box::new(DetectionContract::new(
            rgb_labels(),
            CoordinateSystem::ImagePixels,
        )),
    ];
    let names = contracts
        .iter()
        .map(|c| c.spec().name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["Segmentation", "ObjectDetection"]);
}
