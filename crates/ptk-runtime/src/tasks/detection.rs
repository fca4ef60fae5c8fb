use super::output::{BoundingBox, Detection, TaskOutput, TaskPayload};
use super::spec::{CoordinateSystem, InputSpec, Invariant, OutputSpec, TaskMetadata, TaskSpec};
use super::{TaskContract, TaskInput, image_passthrough, validate_image_input};
use crate::data::TensorView;
use crate::error::{Result, RuntimeError};
use crate::types::DataType;

/// Object detection with XYXY boxes, one class id and one score per box.
///
/// The model is expected to return three tensors, in order: `[N, 4]` float32
/// boxes, `[N]` int32 class ids and `[N]` float32 scores. Detections scoring
/// below the task's `min_confidence` are dropped during decode.
#[derive(Debug)]
pub struct DetectionContract {
    spec: TaskSpec,
    coordinates: CoordinateSystem,
}

impl DetectionContract {
    pub fn new(class_labels: Vec<String>, coordinates: CoordinateSystem) -> Self {
        Self::with_min_confidence(class_labels, coordinates, 0.0)
    }

    pub fn with_min_confidence(
        class_labels: Vec<String>,
        coordinates: CoordinateSystem,
        min_confidence: f32,
    ) -> Self {
        let num_classes = class_labels.len();
        let max_confidence = 1.0;
        let spec = TaskSpec {
            name: "ObjectDetection".to_string(),
            description: "Detect objects with bounding boxes and class labels".to_string(),
            inputs: vec![InputSpec::rgb_image("image")],
            outputs: vec![
                OutputSpec {
                    name: "bounding_boxes".to_string(),
                    semantic_meaning: "bounding boxes in XYXY format".to_string(),
                    dtype: DataType::Float32,
                    coordinate_system: coordinates,
                },
                OutputSpec {
                    name: "class_ids".to_string(),
                    semantic_meaning: "class IDs for each detection".to_string(),
                    dtype: DataType::Int32,
                    coordinate_system: coordinates,
                },
                OutputSpec {
                    name: "scores".to_string(),
                    semantic_meaning: "confidence score for each detection".to_string(),
                    dtype: DataType::Float32,
                    coordinate_system: coordinates,
                },
            ],
            metadata: TaskMetadata {
                classes: class_labels,
                min_confidence,
                max_confidence,
                requires_nms: true,
            },
            invariants: vec![
                Invariant::new("Detections must be present", |output| {
                    output.detections().map(drop).ok_or_else(|| {
                        RuntimeError::failed_precondition("Detection result is missing")
                    })
                }),
                Invariant::new(
                    "Class IDs must be in valid range [0, num_classes-1]",
                    move |output| {
                        let bad = detections(output).find(|d| {
                            usize::try_from(d.class_id).map_or(true, |id| id >= num_classes)
                        });
                        match bad {
                            Some(d) => Err(RuntimeError::failed_precondition(format!(
                                "Invalid class ID in detections: {}",
                                d.class_id
                            ))),
                            None => Ok(()),
                        }
                    },
                ),
                Invariant::new("Scores must lie within the confidence range", move |output| {
                    let bad = detections(output)
                        .find(|d| !(min_confidence..=max_confidence).contains(&d.score));
                    match bad {
                        Some(d) => Err(RuntimeError::failed_precondition(format!(
                            "Score {} outside [{min_confidence}, {max_confidence}]",
                            d.score
                        ))),
                        None => Ok(()),
                    }
                }),
                Invariant::new("Boxes must be well formed", move |output| {
                    let bad = detections(output).find(|d| {
                        !d.bbox.is_well_formed()
                            || (coordinates == CoordinateSystem::Normalized
                                && !d.bbox.is_normalized())
                    });
                    match bad {
                        Some(d) => Err(RuntimeError::failed_precondition(format!(
                            "Malformed {coordinates} box {:?}",
                            d.bbox
                        ))),
                        None => Ok(()),
                    }
                }),
            ],
        };
        Self { spec, coordinates }
    }

    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinates
    }

    pub fn class_labels(&self) -> &[String] {
        &self.spec.metadata.classes
    }

    fn decode(
        &self,
        boxes: &TensorView<'_>,
        class_ids: &TensorView<'_>,
        scores: &TensorView<'_>,
    ) -> Result<Vec<Detection>> {
        let shape = boxes.shape();
        if shape.rank() != 2 || shape.dim(1) != 4 {
            return Err(RuntimeError::invalid_argument(format!(
                "Expected [N, 4] boxes, got shape {shape}"
            )));
        }
        let count = shape.dim(0);
        for (name, view) in [("class ids", class_ids), ("scores", scores)] {
            if view.num_elements() != count {
                return Err(RuntimeError::invalid_argument(format!(
                    "Expected {count} {name}, got shape {}",
                    view.shape()
                )));
            }
        }

        let boxes = boxes.as_slice::<f32>()?;
        let class_ids = class_ids.as_slice::<i32>()?;
        let scores = scores.as_slice::<f32>()?;
        let min_confidence = self.spec.metadata.min_confidence;

        Ok(boxes
            .chunks_exact(4)
            .zip(class_ids)
            .zip(scores)
            .filter(|(_, score)| **score >= min_confidence)
            .map(|((corners, class_id), score)| Detection {
                bbox: BoundingBox {
                    x_min: corners[0],
                    y_min: corners[1],
                    x_max: corners[2],
                    y_max: corners[3],
                },
                class_id: *class_id,
                score: *score,
                label: usize::try_from(*class_id)
                    .ok()
                    .and_then(|id| self.class_labels().get(id).cloned()),
            })
            .collect())
    }
}

fn detections(output: &TaskOutput) -> impl Iterator<Item = &Detection> {
    output.detections().unwrap_or_default().iter()
}

impl TaskContract for DetectionContract {
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
        let [boxes, class_ids, scores] = raw_outputs else {
            return Err(RuntimeError::invalid_argument(format!(
                "Expected boxes, class ids and scores, got {} output tensors",
                raw_outputs.len()
            )));
        };
        let detections = self.decode(boxes, class_ids, scores)?;
        Ok(TaskOutput::with_payload(TaskPayload::Detection(detections)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Frame;

    fn contract(coordinates: CoordinateSystem) -> DetectionContract {
        DetectionContract::with_min_confidence(
            vec!["person".into(), "car".into()],
            coordinates,
            0.5,
        )
    }

    fn detection(class_id: i32, score: f32, bbox: [f32; 4]) -> Detection {
        Detection {
            bbox: BoundingBox {
                x_min: bbox[0],
                y_min: bbox[1],
                x_max: bbox[2],
                y_max: bbox[3],
            },
            class_id,
            score,
            label: None,
        }
    }

    #[test]
    fn decodes_and_filters_by_confidence() {
        let boxes = [0f32, 0., 10., 10., 5., 5., 20., 30.];
        let class_ids = [1i32, 0];
        let scores = [0.9f32, 0.2];
        let frame = Frame::default();
        let output = contract(CoordinateSystem::ImagePixels)
            .post_process(
                &[
                    TensorView::from_slice(&boxes, [2, 4]),
                    TensorView::from_slice(&class_ids, [2]),
                    TensorView::from_slice(&scores, [2]),
                ],
                &TaskInput::new(&frame),
            )
            .unwrap();

        let detections = output.detections().unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label.as_deref(), Some("car"));
        assert_eq!(detections[0].bbox.width(), 10.0);
    }

    #[test]
    fn requires_three_consistent_outputs() {
        let boxes = [0f32; 8];
        let class_ids = [0i32; 3];
        let scores = [1f32; 2];
        let frame = Frame::default();
        let input = TaskInput::new(&frame);
        let contract = contract(CoordinateSystem::ImagePixels);

        let err = contract
            .post_process(&[TensorView::from_slice(&boxes, [2, 4])], &input)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidArgument(_)));

        let err = contract
            .post_process(
                &[
                    TensorView::from_slice(&boxes, [2, 4]),
                    TensorView::from_slice(&class_ids, [3]),
                    TensorView::from_slice(&scores, [2]),
                ],
                &input,
            )
            .unwrap_err();
        assert!(err.message().contains("class ids"));
    }

    #[test]
    fn invariants_check_ranges() {
        let contract = contract(CoordinateSystem::Normalized);
        let valid = TaskOutput::with_payload(TaskPayload::Detection(vec![detection(
            1,
            0.7,
            [0.1, 0.1, 0.5, 0.5],
        )]));
        contract.validate_output(&valid).unwrap();

        for bad in [
            detection(2, 0.7, [0.1, 0.1, 0.5, 0.5]),
            detection(-1, 0.7, [0.1, 0.1, 0.5, 0.5]),
            detection(0, 1.5, [0.1, 0.1, 0.5, 0.5]),
            detection(0, 0.7, [0.5, 0.1, 0.1, 0.5]),
            detection(0, 0.7, [0.1, 0.1, 1.5, 0.5]),
        ] {
            let output = TaskOutput::with_payload(TaskPayload::Detection(vec![bad.clone()]));
            assert!(contract.validate_output(&output).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn pixel_boxes_may_exceed_one() {
        let contract = contract(CoordinateSystem::ImagePixels);
        let output = TaskOutput::with_payload(TaskPayload::Detection(vec![detection(
            0,
            0.9,
            [10., 20., 300., 400.],
        )]));
        assert!(contract.validate_output(&output).is_ok());
        assert!(contract.validate_output(&TaskOutput::default()).is_err());
    }
}
