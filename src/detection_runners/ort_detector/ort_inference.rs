//! YOLO detector on top of [`OrtEngine`]: letterbox in, boxes in image coordinates out.

use anyhow::Result;
use image::RgbImage;
use ndarray::{s, ArrayView, Axis, IxDyn};
use rayon::prelude::*;
use regex::Regex;

use crate::common::{BoxType, ClssType, ModelVersion, PedBox, PedDetection, YoloPreds};
use crate::data::{ConfigOrt, Xs, Y, CROSS_MARK};
use crate::detection_runners::inference_process::InferenceProcess;
use crate::detection_runners::ort_detector::image_ops::{letterbox_ratio, preprocess};
use crate::detection_runners::ort_detector::OrtEngine;

#[derive(Debug)]
pub struct PedOrtYOLO {
    engine: OrtEngine,
    nc: usize,
    height: u32,
    width: u32,
    batch: usize,
    conf: f32,
    iou: f32,
    names: Vec<String>,
    layout: YoloPreds,
    version: ModelVersion,
    profile: bool,
}

impl InferenceProcess for PedOrtYOLO {
    type Input = RgbImage;

    fn new(options: ConfigOrt) -> Result<Self> {
        let engine = OrtEngine::new(&options)?;
        let (height, width) = (engine.model_height(), engine.model_width());
        let batch = engine.fixed_batch().unwrap_or(options.batch_size).max(1);

        let version = options.yolo_version;
        let layout = version.layout();

        let names = resolve_names(Self::fetch_names(&engine), options.names, options.nc)?;
        let nc = names.len();
        let iou = options.iou.unwrap_or(0.7);

        log::info!(
            "YOLO Version: {} | Classes: {} | Person label: {} | conf {} | iou {}",
            version.name(),
            nc,
            names.first().map(String::as_str).unwrap_or("-"),
            options.conf,
            iou,
        );

        Ok(Self {
            engine,
            nc,
            height,
            width,
            batch,
            conf: options.conf,
            iou,
            names,
            layout,
            version,
            profile: options.profile,
        })
    }

    fn preprocess(&self, xs: &[Self::Input]) -> Result<Xs> {
        let x = preprocess(xs, self.height, self.width)?;
        Ok(Xs::from(x))
    }

    fn inference(&mut self, xs: Xs) -> Result<Xs> {
        self.engine.run(xs)
    }

    fn postprocess(&self, xs: Xs, xs0: &[Self::Input]) -> Result<Vec<Y>> {
        if xs.is_empty() {
            anyhow::bail!("{CROSS_MARK} Model produced no outputs");
        }
        let preds = &xs[0];
        if preds.ndim() != 3 {
            anyhow::bail!("{CROSS_MARK} Expected a 3-D prediction tensor, got shape {:?}", preds.shape());
        }
        if preds.shape()[0] != xs0.len() {
            anyhow::bail!(
                "{CROSS_MARK} Prediction batch {} does not match {} input images",
                preds.shape()[0],
                xs0.len()
            );
        }

        // one row per anchor after parse_preds; check the row is wide enough for the layout
        let row = if self.layout.is_anchors_first() { preds.shape()[2] } else { preds.shape()[1] };
        let needed = match self.layout.clss {
            ClssType::Clss => 4 + self.nc,
            ClssType::ConfClss => 5 + self.nc,
            ClssType::ConfCls => 6,
        };
        if row < needed {
            anyhow::bail!(
                "{CROSS_MARK} Prediction rows have {row} values, {} layout with {} classes needs {needed}",
                self.version.name(),
                self.nc
            );
        }

        let ys: Vec<Y> = preds
            .axis_iter(Axis(0))
            .into_par_iter()
            .enumerate()
            .map(|(idx, preds)| {
                let (image_width, image_height) = xs0[idx].dimensions();
                let ratio = letterbox_ratio(image_width, image_height, self.width, self.height);
                decode_image(preds, &self.layout, &self.names, self.conf, self.iou, ratio, (image_width, image_height))
            })
            .collect();

        Ok(ys)
    }
}

impl PedOrtYOLO {
    /// Runs the full pipeline over any number of images, respecting the model's batch size.
    pub fn run_batched(&mut self, xs: &[RgbImage]) -> Result<Vec<Y>> {
        let mut ys = Vec::with_capacity(xs.len());
        for chunk in xs.chunks(self.batch) {
            ys.extend(self.forward(chunk, self.profile)?);
        }
        Ok(ys)
    }

    /// Runs `n` inferences on a blank frame so the first real request is not slow.
    pub fn warmup(&mut self, n: usize) -> Result<()> {
        let blank = RgbImage::new(self.width, self.height);
        for _ in 0..n {
            self.run(std::slice::from_ref(&blank))?;
        }
        log::debug!("Warmup done ({n} runs)");
        Ok(())
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn engine(&self) -> &OrtEngine {
        &self.engine
    }

    fn fetch_names(engine: &OrtEngine) -> Option<Vec<String>> {
        // fetch class names from onnx metadata
        // String format: `{0: 'person', 1: 'bicycle', 2: 'sports ball', ..., 27: "yellow_lady's_slipper"}`
        let names = engine.try_fetch("names")?;
        let names = parse_names(&names);
        if names.is_empty() {
            None
        } else {
            Some(names)
        }
    }

    fn n2s(n: usize) -> Vec<String> {
        (0..n).map(|x| format!("# {}", x)).collect::<Vec<String>>()
    }
}

/// Class names from the ONNX metadata, else the labels file, else `# {i}` placeholders for `nc` classes.
/// When both sources exist they must agree on the class count.
pub fn resolve_names(
    exported: Option<Vec<String>>,
    labels: Option<Vec<String>>,
    nc: Option<usize>,
) -> Result<Vec<String>> {
    let names = match (exported, labels) {
        (Some(exported), Some(labels)) => {
            if exported.len() != labels.len() {
                anyhow::bail!(
                    "{CROSS_MARK} The lengths of parsed class names: {} and user-defined class names: {} do not match.",
                    exported.len(),
                    labels.len(),
                );
            }
            exported
        }
        (Some(exported), None) => exported,
        (None, Some(labels)) => labels,
        (None, None) => match nc {
            Some(nc) => PedOrtYOLO::n2s(nc),
            None => anyhow::bail!(
                "{CROSS_MARK} Unable to obtain the number of classes. Provide a labels file or set the class count."
            ),
        },
    };
    if names.is_empty() {
        anyhow::bail!("{CROSS_MARK} Model reports zero classes");
    }
    Ok(names)
}

/// Turns one image's raw predictions into detections in source pixels.
///
/// `ratio` is the letterbox scale used in preprocessing and `source` the original
/// `(width, height)`. Scores below `conf` are dropped; NMS runs when the layout asks for it.
pub fn decode_image(
    preds: ArrayView<f32, IxDyn>,
    layout: &YoloPreds,
    names: &[String],
    conf: f32,
    iou: f32,
    ratio: f32,
    source: (u32, u32),
) -> Y {
    let (image_width, image_height) = source;
    let (slice_bboxes, slice_id, slice_clss, slice_confs) = layout.parse_preds(preds, names.len());

    let y_bboxes = slice_bboxes
        .axis_iter(Axis(0))
        .into_par_iter()
        .enumerate()
        .filter_map(|(i, bbox)| {
            let (class_id, confidence) = match &slice_id {
                Some(ids) => (ids[[i, 0]] as usize, slice_clss[[i, 0]]),
                None => {
                    let (class_id, &confidence) = slice_clss
                        .slice(s![i, ..])
                        .into_iter()
                        .enumerate()
                        .max_by(|a, b| a.1.total_cmp(b.1))?;

                    match &slice_confs {
                        None => (class_id, confidence),
                        Some(slice_confs) => (class_id, confidence * slice_confs[[i, 0]]),
                    }
                }
            };

            if confidence < conf {
                return None;
            }

            // the letterbox pads right and bottom only
            let (a, b, c, d) = (bbox[0] / ratio, bbox[1] / ratio, bbox[2] / ratio, bbox[3] / ratio);
            let pbox = match layout.box_type()? {
                BoxType::Cxcywh => PedBox::default().with_cxcy_wh(a, b, c, d),
                BoxType::Xyxy => PedBox::new(a, b, c, d),
            }
            .clamp_to(image_width as f32, image_height as f32);

            if pbox.width() <= 0. || pbox.height() <= 0. {
                return None;
            }

            let label = names.get(class_id).cloned().unwrap_or_else(|| format!("# {class_id}"));
            Some(
                PedDetection::default()
                    .with_bbox(pbox)
                    .with_confidence(confidence)
                    .with_class_id(class_id as isize)
                    .with_label(&label),
            )
        })
        .collect::<Vec<_>>();

    let mut y = Y::default();
    if !y_bboxes.is_empty() {
        y = y.with_detections(&y_bboxes);
        if layout.apply_nms {
            y = y.apply_nms(iou);
        }
    }
    y
}

/// Extracts the quoted class names from an exported `names` metadata entry.
pub fn parse_names(raw: &str) -> Vec<String> {
    let re = match Regex::new(r#"(['"])([-()\w '"]+)(['"])"#) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    re.captures_iter(raw)
        .map(|x| x.extract())
        .map(|(_, [_, name, _])| name.to_string())
        .collect()
}
