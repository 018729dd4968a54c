//! OpenCV window output and video decoding, behind the `viewer` feature.

use std::path::Path;

use anyhow::{bail, Context};
use image::RgbImage;
use opencv::{core::Mat, highgui, imgproc, prelude::*, videoio};

use crate::pipeline::{Annotated, FrameSink, SinkControl};

pub const WINDOW_TITLE: &str = "Pedestrian Detection - YOLOv8";

const KEY_Q: i32 = 113;
const KEY_ESC: i32 = 27;

/// Decoded frames of a video file, converted to RGB.
pub struct VideoFrames {
    capture: videoio::VideoCapture,
    frame: Mat,
    done: bool,
}

impl VideoFrames {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let source = path.to_str().context("Video path is not valid UTF-8")?;
        let capture = videoio::VideoCapture::from_file(source, videoio::CAP_ANY)
            .with_context(|| format!("Failed to open video {}", path.display()))?;
        if !capture.is_opened()? {
            bail!("Failed to open video {}", path.display());
        }

        let fps = capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.);
        let frames = capture.get(videoio::CAP_PROP_FRAME_COUNT).unwrap_or(0.);
        log::info!("Opened {} ({} frames at {:.1} fps)", path.display(), frames as i64, fps);

        Ok(Self { capture, frame: Mat::default(), done: false })
    }

    fn read_rgb(&mut self) -> anyhow::Result<Option<RgbImage>> {
        if !self.capture.read(&mut self.frame)? || self.frame.empty() {
            return Ok(None);
        }
        mat_to_rgb(&self.frame).map(Some)
    }

    pub fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            log::warn!("Failed to release video capture: {e}");
        }
        self.done = true;
    }
}

impl Iterator for VideoFrames {
    type Item = anyhow::Result<RgbImage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_rgb() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.release();
                None
            }
            Err(e) => {
                self.release();
                Some(Err(e))
            }
        }
    }
}

impl Drop for VideoFrames {
    fn drop(&mut self) {
        if !self.done {
            self.release();
        }
    }
}

fn mat_to_rgb(bgr: &Mat) -> anyhow::Result<RgbImage> {
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(bgr, &mut rgb, imgproc::COLOR_BGR2RGB)?;
    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    let data = rgb.data_bytes()?.to_vec();
    RgbImage::from_vec(width, height, data).context("Frame buffer has an unexpected size")
}

fn rgb_to_mat(image: &RgbImage) -> anyhow::Result<Mat> {
    let flat = Mat::from_slice(image.as_raw())?;
    let rgb = flat.reshape(3, image.height() as i32)?;
    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&*rgb, &mut bgr, imgproc::COLOR_RGB2BGR)?;
    Ok(bgr)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Video: poll for 1 ms per frame, `q` quits.
    Frame,
    /// Still image: block until any key.
    AnyKey,
}

/// Shows annotated frames in a HighGUI window.
pub struct WindowSink {
    title: String,
    mode: WaitMode,
}

impl WindowSink {
    pub fn new(mode: WaitMode) -> anyhow::Result<Self> {
        highgui::named_window(WINDOW_TITLE, highgui::WINDOW_AUTOSIZE)
            .context("Failed to open display window")?;
        Ok(Self { title: WINDOW_TITLE.to_string(), mode })
    }
}

impl FrameSink for WindowSink {
    fn show(&mut self, frame: &Annotated) -> anyhow::Result<SinkControl> {
        let bgr = rgb_to_mat(&frame.image)?;
        highgui::imshow(&self.title, &bgr)?;

        match self.mode {
            WaitMode::Frame => {
                let key = highgui::wait_key(1)?;
                if key == KEY_Q || key == KEY_ESC {
                    log::info!("Stopped by user");
                    return Ok(SinkControl::Quit);
                }
                Ok(SinkControl::Continue)
            }
            WaitMode::AnyKey => {
                highgui::wait_key(0)?;
                Ok(SinkControl::Continue)
            }
        }
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        highgui::destroy_all_windows()?;
        Ok(())
    }
}
