use serde::{Deserialize, Serialize};
use crate::common::PedBox;
use crate::detection_runners::ort_detector::nms::Nms;

/// COCO class index of "person", the only class this crate draws.
pub const PERSON_CLASS_ID: isize = 0;

#[derive(Default, Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PedDetection {
    pub class_id: isize,
    pub bbox: PedBox,
    pub label: Option<String>,
    pub confidence: f32,
}

impl Nms for PedDetection {
    /// Computes the intersection over union (IoU) between this bounding box and another.
    fn iou(&self, other: &Self) -> f32 {
        self.bbox.iou(&other.bbox)
    }

    /// Returns the confidence score of the bounding box.
    fn confidence(&self) -> f32 {
        self.confidence
    }

    fn class_id(&self) -> isize {
        self.class_id
    }
}

impl PedDetection {
    pub fn new(class_id: isize, bbox: PedBox, label: Option<String>, confidence: f32) -> Self {
        Self {
            class_id,
            bbox,
            label,
            confidence,
        }
    }

    /// Sets the bounding box's coordinates using `(x1, y1, x2, y2)` and calculates width and height.
    pub fn with_x1y1_x2y2(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = PedBox::default().with_x1y1_x2y2(x1, y1, x2, y2);
        self
    }

    /// Sets the bounding box's coordinates and dimensions using `(x, y, w, h)`.
    pub fn with_x1y1_wh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.bbox = PedBox::default().with_x1y1_wh(x, y, w, h);
        self
    }

    pub fn with_bbox(mut self, bbox: PedBox) -> Self {
        self.bbox = bbox;
        self
    }

    /// Sets the confidence score of the detection.
    pub fn with_confidence(mut self, conf: f32) -> Self {
        self.confidence = conf;
        self
    }

    /// Sets the class ID of the detection.
    pub fn with_class_id(mut self, class_id: isize) -> Self {
        self.class_id = class_id;
        self
    }

    /// Sets the optional name of the detection.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn is_person(&self) -> bool {
        self.class_id == PERSON_CLASS_ID
    }
}
