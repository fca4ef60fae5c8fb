use crate::types::DataType;
use serde::Serialize;

/// Mask value meaning "no class", accepted regardless of the label count.
pub const IGNORE_LABEL: u8 = 255;

/// Dense per-pixel class ids, row major.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SegmentationMask {
    pub height: usize,
    pub width: usize,
    pub mask: Vec<u8>,
    pub class_names: Vec<String>,
    pub dtype: DataType,
}

impl SegmentationMask {
    pub fn at(&self, y: usize, x: usize) -> Option<u8> {
        if y >= self.height || x >= self.width {
            return None;
        }
        self.mask.get(y * self.width + x).copied()
    }

    /// Name of the class at `(y, x)`, `None` for the ignore label or out of range.
    pub fn class_name_at(&self, y: usize, x: usize) -> Option<&str> {
        let id = self.at(y, x)?;
        self.class_names.get(usize::from(id)).map(String::as_str)
    }
}

/// Axis aligned box, corners in XYXY order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn is_well_formed(&self) -> bool {
        [self.x_min, self.y_min, self.x_max, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.x_min <= self.x_max
            && self.y_min <= self.y_max
    }

    pub fn is_normalized(&self) -> bool {
        [self.x_min, self.y_min, self.x_max, self.y_max]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: i32,
    pub score: f32,
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum TaskPayload {
    #[default]
    None,
    Segmentation(SegmentationMask),
    Detection(Vec<Detection>),
}

/// Result of one `execute` call. `success` is only true when every step,
/// output validation included, passed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TaskOutput {
    pub task_type: String,
    pub payload: TaskPayload,
    pub inference_time_ms: f32,
    pub timestamp_ns: i64,
    pub frame_index: i64,
    pub success: bool,
}

impl TaskOutput {
    pub fn with_payload(payload: TaskPayload) -> Self {
        Self {
            payload,
            ..Default::default()
        }
    }

    pub fn segmentation(&self) -> Option<&SegmentationMask> {
        match &self.payload {
            TaskPayload::Segmentation(mask) => Some(mask),
            _ => None,
        }
    }

    pub fn detections(&self) -> Option<&[Detection]> {
        match &self.payload {
            TaskPayload::Detection(detections) => Some(detections),
            _ => None,
        }
    }

    /// One line description for logs.
    pub fn summary(&self) -> String {
        let payload = match &self.payload {
            TaskPayload::None => "no result".to_string(),
            TaskPayload::Segmentation(m) => format!("{}x{} mask", m.width, m.height),
            TaskPayload::Detection(d) => format!("{} detections", d.len()),
        };
        format!(
            "{} frame {}: {payload} in {:.3} ms ({})",
            self.task_type,
            self.frame_index,
            self.inference_time_ms,
            if self.success { "ok" } else { "failed" }
        )
    }
}
