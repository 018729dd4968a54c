use std::time::Instant;

use image::RgbImage;

use crate::common::PedDetection;
use crate::detection_runners::PedOrtYOLO;
use crate::utils;

/// Anything that turns a frame into detections. The ONNX detector is the real one;
/// the pipeline and the web server only depend on this seam.
pub trait Detect: Send {
    fn detect(&mut self, image: &RgbImage) -> anyhow::Result<Vec<PedDetection>>;
}

impl Detect for PedOrtYOLO {
    fn detect(&mut self, image: &RgbImage) -> anyhow::Result<Vec<PedDetection>> {
        detector_onnx(self, image, None)
    }
}

/// Runs one frame through the model. With `wanted` set, other classes are dropped.
pub fn detector_onnx(yolo: &mut PedOrtYOLO, image: &RgbImage, wanted: Option<&[u16]>) -> anyhow::Result<Vec<PedDetection>> {
    let detect_time = Instant::now();

    let ys = yolo.run_batched(std::slice::from_ref(image))?;
    let mut _detect_elapsed = detect_time.elapsed();

    let detections: Vec<PedDetection> = ys
        .into_iter()
        .flat_map(|y| y.into_detections())
        .filter(|d| match wanted {
            None => true,
            Some(ids) => u16::try_from(d.class_id).is_ok_and(|id| ids.contains(&id)),
        })
        .collect();

    _detect_elapsed = utils::trace("TIME", "Label filter", detect_time, _detect_elapsed);
    log::debug!(
        "{} detection(s) on {}x{} frame in {:.2?}",
        detections.len(),
        image.width(),
        image.height(),
        detect_time.elapsed()
    );

    Ok(detections)
}
