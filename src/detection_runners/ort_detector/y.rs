use crate::common::PedDetection;
use crate::detection_runners::ort_detector::nms::nms;

/// Container for the inference results of one image.
#[derive(Clone, PartialEq, Default)]
pub struct Y {
    detections: Option<Vec<PedDetection>>,
}

impl std::fmt::Debug for Y {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut f = f.debug_struct("Y");
        if let Some(x) = &self.detections {
            if !x.is_empty() {
                f.field("PedDetections", &x);
            }
        }
        f.finish()
    }
}

impl Y {
    /// Sets the `detections` field with the provided detections.
    pub fn with_detections(mut self, detections: &[PedDetection]) -> Self {
        self.detections = Some(detections.to_vec());
        self
    }

    /// Returns a reference to the detections, or `None` if nothing was set.
    pub fn detections(&self) -> Option<&Vec<PedDetection>> {
        self.detections.as_ref()
    }

    pub fn into_detections(self) -> Vec<PedDetection> {
        self.detections.unwrap_or_default()
    }

    pub fn apply_nms(mut self, iou_threshold: f32) -> Self {
        if let Some(detections) = &mut self.detections {
            nms(detections, iou_threshold);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class_id: isize, conf: f32, x1: f32) -> PedDetection {
        PedDetection::default()
            .with_class_id(class_id)
            .with_confidence(conf)
            .with_x1y1_x2y2(x1, 0., x1 + 100., 200.)
    }

    #[test]
    fn keeps_best_of_overlapping_same_class_pair() {
        let y = Y::default()
            .with_detections(&[det(0, 0.6, 5.), det(0, 0.9, 0.)])
            .apply_nms(0.7);
        let kept = y.into_detections();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn overlapping_boxes_of_different_classes_survive() {
        let y = Y::default()
            .with_detections(&[det(0, 0.9, 0.), det(2, 0.8, 0.)])
            .apply_nms(0.7);
        assert_eq!(y.into_detections().len(), 2);
    }

    #[test]
    fn distant_boxes_survive_sorted_by_confidence() {
        let y = Y::default()
            .with_detections(&[det(0, 0.3, 0.), det(0, 0.8, 500.)])
            .apply_nms(0.7);
        let kept = y.into_detections();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.8);
    }

    #[test]
    fn empty_result() {
        assert!(Y::default().apply_nms(0.5).into_detections().is_empty());
    }
}
