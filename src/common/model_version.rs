//! Output layouts of the YOLO exports the detector understands.

use ndarray::{ArrayView, Axis, IxDyn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVersion {
    YoloV5,
    YoloV6,
    YoloV7,
    #[default] YoloV8,
    YoloV9,
    YoloV10,
    YoloV11,
}

impl ModelVersion {
    pub fn name(&self) -> &'static str {
        match self {
            Self::YoloV5 => "YoloV5",
            Self::YoloV6 => "YoloV6",
            Self::YoloV7 => "YoloV7",
            Self::YoloV8 => "YoloV8",
            Self::YoloV9 => "YoloV9",
            Self::YoloV10 => "YoloV10",
            Self::YoloV11 => "YoloV11",
        }
    }

    /// Accepts `yolov8`, `v8` or `8`. Unknown strings give `None`.
    pub fn parse(version: &str) -> Option<ModelVersion> {
        let version = version.to_lowercase();
        let digits = version.trim_start_matches("yolo").trim_start_matches('v');
        match digits {
            "5" => Some(ModelVersion::YoloV5),
            "6" => Some(ModelVersion::YoloV6),
            "7" => Some(ModelVersion::YoloV7),
            "8" => Some(ModelVersion::YoloV8),
            "9" => Some(ModelVersion::YoloV9),
            "10" => Some(ModelVersion::YoloV10),
            "11" => Some(ModelVersion::YoloV11),
            _ => None,
        }
    }

    pub fn layout(&self) -> YoloPreds {
        match self {
            ModelVersion::YoloV5 | ModelVersion::YoloV6 | ModelVersion::YoloV7 => YoloPreds::n_a_cxcywh_confclss(),
            ModelVersion::YoloV8 | ModelVersion::YoloV9 | ModelVersion::YoloV11 => YoloPreds::n_cxcywh_clss_a(),
            ModelVersion::YoloV10 => YoloPreds::n_a_xyxy_confcls().apply_nms(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxType {
    /// 1
    Cxcywh,

    /// 3 Tlbr
    Xyxy,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum ClssType {
    Clss,
    ConfCls,
    ConfClss,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnchorsPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoloPreds {
    pub clss: ClssType,
    pub bbox: Option<BoxType>,
    pub anchors: Option<AnchorsPosition>,
    pub apply_nms: bool,
}

impl Default for YoloPreds {
    fn default() -> Self {
        Self {
            clss: ClssType::Clss,
            bbox: None,
            anchors: None,
            apply_nms: true,
        }
    }
}

/// Per-image views into one prediction tensor: boxes, optional class ids,
/// class scores and optional objectness.
pub type PredSlices<'a> = (
    ArrayView<'a, f32, IxDyn>,
    Option<ArrayView<'a, f32, IxDyn>>,
    ArrayView<'a, f32, IxDyn>,
    Option<ArrayView<'a, f32, IxDyn>>,
);

impl YoloPreds {
    pub fn apply_nms(mut self, x: bool) -> Self {
        self.apply_nms = x;
        self
    }

    pub fn n_a_cxcywh_confclss() -> Self {
        // YOLOv5 | YOLOv6 | YOLOv7 : NACxcywhConfClss
        Self {
            bbox: Some(BoxType::Cxcywh),
            clss: ClssType::ConfClss,
            anchors: Some(AnchorsPosition::Before),
            ..Default::default()
        }
    }

    pub fn n_cxcywh_clss_a() -> Self {
        // YOLOv8 | YOLOv9 | YOLOv11 : NCxcywhClssA
        Self {
            bbox: Some(BoxType::Cxcywh),
            clss: ClssType::Clss,
            anchors: Some(AnchorsPosition::After),
            ..Default::default()
        }
    }

    pub fn n_a_xyxy_confcls() -> Self {
        // YOLOv10 : NAXyxyConfCls
        Self {
            bbox: Some(BoxType::Xyxy),
            clss: ClssType::ConfCls,
            anchors: Some(AnchorsPosition::Before),
            ..Default::default()
        }
    }

    pub fn box_type(&self) -> Option<&BoxType> {
        self.bbox.as_ref()
    }

    pub fn is_anchors_first(&self) -> bool {
        matches!(self.anchors, Some(AnchorsPosition::Before))
    }

    /// Splits one image's predictions (2-D, anchors on either axis) into its parts.
    pub fn parse_preds<'a>(&self, x: ArrayView<'a, f32, IxDyn>, nc: usize) -> PredSlices<'a> {
        let x = if self.is_anchors_first() {
            x
        } else {
            x.reversed_axes()
        };

        let (slice_bboxes, xs) = x.split_at(Axis(1), 4);

        let (slice_id, slice_clss, slice_confs) = match self.clss {
            ClssType::ConfClss => {
                let (confs, xs) = xs.split_at(Axis(1), 1);
                let (clss, _) = xs.split_at(Axis(1), nc);
                (None, clss, Some(confs))
            }
            ClssType::ConfCls => {
                let (clss, xs) = xs.split_at(Axis(1), 1);
                let (ids, _) = xs.split_at(Axis(1), 1);
                (Some(ids), clss, None)
            }
            ClssType::Clss => {
                let (clss, _) = xs.split_at(Axis(1), nc);
                (None, clss, None)
            }
        };

        (slice_bboxes, slice_id, slice_clss, slice_confs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    #[test]
    fn parses_version_strings() {
        assert_eq!(ModelVersion::parse("yolov8"), Some(ModelVersion::YoloV8));
        assert_eq!(ModelVersion::parse("V11"), Some(ModelVersion::YoloV11));
        assert_eq!(ModelVersion::parse("10"), Some(ModelVersion::YoloV10));
        assert_eq!(ModelVersion::parse("yolox"), None);
    }

    #[test]
    fn yolov8_layout_transposes_anchors() {
        // 4 box rows + 2 classes, 3 anchors
        let preds = Array::from_shape_vec(
            (6, 3),
            vec![
                10., 20., 30., // cx
                11., 21., 31., // cy
                5., 6., 7.,    // w
                8., 9., 10.,   // h
                0.9, 0.1, 0.2, // class 0
                0.0, 0.8, 0.3, // class 1
            ],
        )
        .unwrap()
        .into_dyn();

        let (bboxes, ids, clss, confs) = ModelVersion::YoloV8.layout().parse_preds(preds.view(), 2);
        assert!(ids.is_none());
        assert!(confs.is_none());
        assert_eq!(bboxes.shape(), &[3, 4]);
        assert_eq!(clss.shape(), &[3, 2]);
        assert_eq!(bboxes[[1, 0]], 20.);
        assert_eq!(clss[[1, 1]], 0.8);
    }
}
