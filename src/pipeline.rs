//! Frame loop shared by the CLI and the web server: infer, annotate, hand over.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use image::RgbImage;

use crate::annotate::{annotate_persons, encode_jpeg, AnnotateStyle, JPEG_QUALITY};
use crate::common::PedDetection;
use crate::data::TimeCalc;
use crate::detectors::Detect;
use crate::utils;

/// An annotated frame and what was found on it.
#[derive(Debug, Clone)]
pub struct Annotated {
    pub image: RgbImage,
    pub detections: Vec<PedDetection>,
    pub persons: usize,
}

impl Annotated {
    /// Person detections only.
    pub fn person_detections(&self) -> impl Iterator<Item = &PedDetection> {
        self.detections.iter().filter(|d| d.is_person())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkControl {
    Continue,
    Quit,
}

/// Destination of annotated frames.
pub trait FrameSink {
    fn show(&mut self, frame: &Annotated) -> anyhow::Result<SinkControl>;

    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct FrameStats {
    pub frames: usize,
    pub persons: usize,
    pub quit_early: bool,
    pub per_frame: TimeCalc,
}

impl FrameStats {
    pub fn fps(&self) -> f32 {
        let avg = self.per_frame.avg().as_secs_f32();
        if avg > 0. { 1. / avg } else { 0. }
    }
}

/// Infers on one frame and draws the person boxes onto it.
pub fn annotate_frame<D: Detect + ?Sized>(detector: &mut D, mut frame: RgbImage, style: &AnnotateStyle) -> anyhow::Result<Annotated> {
    let detections = detector.detect(&frame)?;
    let persons = annotate_persons(&mut frame, &detections, style);
    Ok(Annotated { image: frame, detections, persons })
}

pub fn detect_on_image<D: Detect + ?Sized>(detector: &mut D, path: &Path, style: &AnnotateStyle) -> anyhow::Result<Annotated> {
    let frame = image::open(path)
        .with_context(|| format!("failed to read image {}", path.display()))?
        .to_rgb8();
    let annotated = annotate_frame(detector, frame, style)?;
    log::info!("{}: {} person(s)", path.display(), annotated.persons);
    Ok(annotated)
}

/// Blocking frame loop. Stops when `frames` runs dry or the sink returns [`SinkControl::Quit`].
/// The sink is finished either way.
pub fn run_frames<D, I, S>(detector: &mut D, frames: I, sink: &mut S, style: &AnnotateStyle) -> anyhow::Result<FrameStats>
where
    D: Detect + ?Sized,
    I: IntoIterator<Item = anyhow::Result<RgbImage>>,
    S: FrameSink + ?Sized,
{
    let mut stats = FrameStats::default();
    let started = Instant::now();

    for frame in frames {
        let t_frame = Instant::now();
        let frame = frame.with_context(|| format!("failed to read frame {}", stats.frames))?;

        let annotated = annotate_frame(detector, frame, style)?;
        stats.frames += 1;
        stats.persons += annotated.persons;

        let control = sink.show(&annotated)?;
        stats.per_frame.add_or_push(0, t_frame.elapsed());
        utils::trace("FRAME", "annotated", started, t_frame.duration_since(started));

        if control == SinkControl::Quit {
            stats.quit_early = true;
            break;
        }
    }

    sink.finish()?;
    log::info!(
        "Processed {} frame(s), {} person box(es), {:.1} fps",
        stats.frames,
        stats.persons,
        stats.fps()
    );
    Ok(stats)
}

/// Fans each frame out to several sinks. Quits as soon as one of them asks to.
#[derive(Default)]
pub struct SinkChain {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl SinkChain {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// With no sinks at all, frames are written to `path` instead of being dropped.
    pub fn or_fallback<P: Into<PathBuf>>(self, path: P) -> Self {
        if !self.is_empty() {
            return self;
        }
        let path = path.into();
        log::info!("No window or output requested, saving to {}", path.display());
        self.with_sink(Box::new(ImageFileSink::new(path)))
    }
}

impl FrameSink for SinkChain {
    fn show(&mut self, frame: &Annotated) -> anyhow::Result<SinkControl> {
        let mut control = SinkControl::Continue;
        for sink in self.sinks.iter_mut() {
            if sink.show(frame)? == SinkControl::Quit {
                control = SinkControl::Quit;
            }
        }
        Ok(control)
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.finish()?;
        }
        Ok(())
    }
}

/// Writes annotated frames to disk. The first frame goes to `path`,
/// later ones to `<stem>_<n>.<ext>` next to it.
#[derive(Debug)]
pub struct ImageFileSink {
    path: PathBuf,
    written: Vec<PathBuf>,
}

impl ImageFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), written: Vec::new() }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn frame_path(&self, n: usize) -> PathBuf {
        if n == 0 {
            return self.path.clone();
        }
        let stem = self.path.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
        let name = match self.path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}_{n:06}.{ext}"),
            None => format!("{stem}_{n:06}"),
        };
        self.path.with_file_name(name)
    }
}

impl FrameSink for ImageFileSink {
    fn show(&mut self, frame: &Annotated) -> anyhow::Result<SinkControl> {
        let path = self.frame_path(self.written.len());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let is_jpeg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
        if is_jpeg {
            let bytes = encode_jpeg(&frame.image, JPEG_QUALITY).context("Image encoding error!")?;
            std::fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        } else {
            frame.image
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        log::debug!("Saved annotated frame to {}", path.display());
        self.written.push(path);
        Ok(SinkControl::Continue)
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        if let Some(first) = self.written.first() {
            log::info!("Wrote {} annotated frame(s) starting at {}", self.written.len(), first.display());
        }
        Ok(())
    }
}
