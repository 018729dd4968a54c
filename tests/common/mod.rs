#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage};
use ped_detect::common::PedDetection;
use ped_detect::Detect;

pub const BOUNDARY: &str = "ped-detect-test-boundary";

/// Returns the same detections for every frame and counts calls.
#[derive(Clone, Default)]
pub struct StubDetector {
    pub detections: Vec<PedDetection>,
    pub calls: Arc<AtomicUsize>,
}

impl StubDetector {
    pub fn new(detections: Vec<PedDetection>) -> Self {
        Self { detections, calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Detect for StubDetector {
    fn detect(&mut self, _image: &RgbImage) -> anyhow::Result<Vec<PedDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detections.clone())
    }
}

pub struct FailingDetector;

impl Detect for FailingDetector {
    fn detect(&mut self, _image: &RgbImage) -> anyhow::Result<Vec<PedDetection>> {
        anyhow::bail!("inference exploded")
    }
}

pub fn person(conf: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> PedDetection {
    PedDetection::default()
        .with_class_id(0)
        .with_label("person")
        .with_confidence(conf)
        .with_x1y1_x2y2(x1, y1, x2, y2)
}

pub fn car(conf: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> PedDetection {
    PedDetection::default()
        .with_class_id(2)
        .with_label("car")
        .with_confidence(conf)
        .with_x1y1_x2y2(x1, y1, x2, y2)
}

pub fn black(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([0, 0, 0]))
}

pub fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// One-field multipart body.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
