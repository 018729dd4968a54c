mod utils;
pub mod annotate;
pub mod args;
pub mod common;
pub mod data;
pub mod detection_runners;
pub mod detectors;
pub mod pipeline;
pub mod theme;
pub mod web;
#[cfg(feature = "viewer")]
pub mod viewer;

use std::time::Instant;

use crate::common::{ModelConfig, PedDetection, PedImage};
use crate::data::ConfigOrt;
use crate::detection_runners::inference_process::InferenceProcess;
use crate::detectors::detector_onnx;

pub use crate::detection_runners::PedOrtYOLO;
pub use crate::detectors::Detect;

/// Loads the weights, builds the ONNX Runtime session and runs a warmup pass.
pub fn init_detector(model_details: &ModelConfig) -> anyhow::Result<PedOrtYOLO> {
    model_details.validate()?;
    let weights = model_details.resolve_weights()?;
    let weights = weights.to_string_lossy();

    let ort_options = ConfigOrt::from_model_config(model_details, &weights)?;
    let dry_runs = ort_options.num_dry_run;

    log::info!("Initializing ORT session with ({}) execution provider", model_details.inference_device);
    log::debug!("Model config:\n{model_details}");

    let mut yolo = PedOrtYOLO::new(ort_options)?;
    yolo.warmup(dry_runs)?;
    log::info!("Detector ready on {} with batch size {}", yolo.engine().device(), yolo.batch());
    Ok(yolo)
}

/// Runs one frame, keeping only the classes `ped_image` asks for.
pub fn run_detection(yolo: &mut PedOrtYOLO, ped_image: &PedImage) -> anyhow::Result<Vec<PedDetection>> {
    let now = Instant::now();

    let detections = detector_onnx(yolo, &ped_image.image, ped_image.wanted_labels.as_deref())?;

    log::info!("Processing time: {:?}", now.elapsed());

    Ok(detections)
}
