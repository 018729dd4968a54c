mod common;

use image::RgbImage;
use ped_detect::annotate::AnnotateStyle;
use ped_detect::pipeline::{
    detect_on_image, run_frames, Annotated, FrameSink, ImageFileSink, SinkChain, SinkControl,
};

use common::{black, car, person, FailingDetector, StubDetector};

/// Keeps what it was shown and asks to quit after `quit_after` frames.
#[derive(Default)]
struct RecordingSink {
    persons: Vec<usize>,
    quit_after: Option<usize>,
    finished: bool,
}

impl FrameSink for RecordingSink {
    fn show(&mut self, frame: &Annotated) -> anyhow::Result<SinkControl> {
        self.persons.push(frame.persons);
        match self.quit_after {
            Some(n) if self.persons.len() >= n => Ok(SinkControl::Quit),
            _ => Ok(SinkControl::Continue),
        }
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.finished = true;
        Ok(())
    }
}

fn frames(n: usize) -> impl Iterator<Item = anyhow::Result<RgbImage>> {
    (0..n).map(|_| Ok(black(80, 60)))
}

#[test]
fn runs_until_frames_run_out() {
    let mut detector = StubDetector::new(vec![person(0.9, 5., 5., 30., 50.), car(0.9, 40., 5., 70., 30.)]);
    let mut sink = RecordingSink::default();

    let stats = run_frames(&mut detector, frames(4), &mut sink, &AnnotateStyle::default()).unwrap();

    assert_eq!(stats.frames, 4);
    assert_eq!(stats.persons, 4);
    assert!(!stats.quit_early);
    assert_eq!(sink.persons, vec![1, 1, 1, 1]);
    assert!(sink.finished);
    assert_eq!(detector.calls(), 4);
}

#[test]
fn sink_can_stop_the_loop() {
    let mut detector = StubDetector::new(vec![]);
    let mut sink = RecordingSink { quit_after: Some(2), ..Default::default() };

    let stats = run_frames(&mut detector, frames(10), &mut sink, &AnnotateStyle::default()).unwrap();

    assert_eq!(stats.frames, 2);
    assert!(stats.quit_early);
    assert!(sink.finished);
    assert_eq!(detector.calls(), 2);
}

#[test]
fn frame_read_errors_abort() {
    let mut detector = StubDetector::new(vec![]);
    let mut sink = RecordingSink::default();
    let frames = vec![Ok(black(10, 10)), Err(anyhow::anyhow!("corrupt frame"))];

    let err = run_frames(&mut detector, frames, &mut sink, &AnnotateStyle::default()).unwrap_err();
    assert!(format!("{err:#}").contains("corrupt frame"));
    assert_eq!(sink.persons.len(), 1);
}

#[test]
fn detector_errors_propagate() {
    let mut sink = RecordingSink::default();
    assert!(run_frames(&mut FailingDetector, frames(1), &mut sink, &AnnotateStyle::default()).is_err());
}

#[test]
fn still_image_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("street.png");
    black(120, 90).save(&input).unwrap();

    let mut detector = StubDetector::new(vec![person(0.66, 10., 10., 60., 80.)]);
    let annotated = detect_on_image(&mut detector, &input, &AnnotateStyle::default()).unwrap();
    assert_eq!(annotated.persons, 1);
    assert_eq!(annotated.person_detections().count(), 1);

    let output = dir.path().join("out").join("detected_pedestrians.jpg");
    let mut sink = SinkChain::new().with_sink(Box::new(ImageFileSink::new(&output)));
    assert_eq!(sink.show(&annotated).unwrap(), SinkControl::Continue);
    sink.finish().unwrap();

    let written = image::open(&output).unwrap();
    assert_eq!((written.width(), written.height()), (120, 90));
}

#[test]
fn empty_chain_falls_back_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let fallback = dir.path().join("detected_pedestrians.jpg");

    let mut detector = StubDetector::new(vec![person(0.8, 5., 5., 40., 50.)]);
    let mut sink = SinkChain::new().or_fallback(&fallback);
    assert!(!sink.is_empty());

    let stats = run_frames(&mut detector, frames(2), &mut sink, &AnnotateStyle::default()).unwrap();
    assert_eq!(stats.frames, 2);
    assert!(fallback.is_file());
    assert!(dir.path().join("detected_pedestrians_000001.jpg").is_file());
}

#[test]
fn fallback_is_ignored_when_a_sink_exists() {
    let dir = tempfile::tempdir().unwrap();
    let fallback = dir.path().join("fallback.jpg");

    let mut sink = SinkChain::new()
        .with_sink(Box::new(RecordingSink::default()))
        .or_fallback(&fallback);
    let mut detector = StubDetector::new(vec![]);
    run_frames(&mut detector, frames(1), &mut sink, &AnnotateStyle::default()).unwrap();
    assert!(!fallback.exists());
}

#[test]
fn missing_image_is_an_error() {
    let mut detector = StubDetector::new(vec![]);
    let err = detect_on_image(&mut detector, std::path::Path::new("/nonexistent/image.jpg"), &AnnotateStyle::default())
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/image.jpg"));
    assert_eq!(detector.calls(), 0);
}
