//! Runs the real ONNX model. Skipped unless `PED_DETECT_MODEL` points at exported weights;
//! `PED_DETECT_ORT_LIB` (or `ORT_DYLIB_PATH`) locates ONNX Runtime and `PED_DETECT_IMAGE`
//! supplies a street photo.

use std::time::Instant;

use image::{Rgb, RgbImage};
use ped_detect::annotate::{annotate_persons, AnnotateStyle};
use ped_detect::common::{InferenceDevice, ModelConfig, PedImage};
use ped_detect::Detect;

fn model_details() -> Option<ModelConfig> {
    let weights_path = std::env::var("PED_DETECT_MODEL").ok()?;
    Some(ModelConfig {
        weights_path,
        ort_lib_path: std::env::var("PED_DETECT_ORT_LIB").unwrap_or_default(),
        inference_device: InferenceDevice::CPU,
        ..Default::default()
    })
}

#[test]
fn blank_frame_has_no_pedestrians() {
    let Some(model_details) = model_details() else {
        eprintln!("PED_DETECT_MODEL not set, skipping");
        return;
    };

    let mut yolo = ped_detect::init_detector(&model_details).unwrap();
    let blank = RgbImage::from_pixel(960, 540, Rgb([114, 114, 114]));

    let detections = yolo.detect(&blank).unwrap();
    assert!(detections.iter().all(|d| !d.is_person()), "{detections:?}");
}

#[test]
fn detections_stay_inside_the_frame() {
    let Some(model_details) = model_details() else {
        eprintln!("PED_DETECT_MODEL not set, skipping");
        return;
    };
    let Ok(image_path) = std::env::var("PED_DETECT_IMAGE") else {
        eprintln!("PED_DETECT_IMAGE not set, skipping");
        return;
    };

    let image = image::open(&image_path).unwrap().to_rgb8();
    let (width, height) = image.dimensions();
    let ped_image = PedImage::persons_only(image.clone());

    let mut yolo = ped_detect::init_detector(&model_details).unwrap();

    let loop_count = 3;
    let now = Instant::now();
    let mut result = Vec::new();
    for count in 0..loop_count {
        result = ped_detect::run_detection(&mut yolo, &ped_image).unwrap();
        println!("{}th detection: {} person(s) after {:.2?}", count, result.len(), now.elapsed());
    }

    for det in &result {
        assert!(det.is_person());
        assert!(det.confidence >= model_details.conf_threshold);
        assert!(det.bbox.x1 >= 0. && det.bbox.y1 >= 0.);
        assert!(det.bbox.x2 <= width as f32 && det.bbox.y2 <= height as f32);
        assert!(det.bbox.width() > 0. && det.bbox.height() > 0.);
    }

    let mut img = image;
    let drawn = annotate_persons(&mut img, &result, &AnnotateStyle::discover());
    assert!(drawn <= result.len());

    let out = tempfile::tempdir().unwrap();
    img.save(out.path().join("test_output.jpg")).unwrap();
}
