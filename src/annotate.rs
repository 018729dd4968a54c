//! Drawing person boxes and confidence labels onto frames.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageResult, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::common::PedDetection;

/// Environment variable pointing at a TrueType font for box labels.
pub const FONT_ENV: &str = "PED_DETECT_FONT";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub const BOX_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_THICKNESS: u32 = 2;
pub const LABEL_PX: f32 = 16.0;
/// Gap between the label baseline and the top edge of the box.
pub const LABEL_OFFSET: i32 = 10;
/// Quality used for every JPEG this crate writes.
pub const JPEG_QUALITY: u8 = 95;

#[derive(Clone, Debug)]
pub struct LabelFont {
    font: FontArc,
}

impl LabelFont {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| anyhow::anyhow!("invalid font {}: {e}", path.display()))?;
        Ok(Self { font })
    }

    /// `PED_DETECT_FONT` first, then a few common system fonts.
    pub fn discover() -> Option<Self> {
        let from_env = std::env::var_os(FONT_ENV).map(PathBuf::from);
        let candidates = from_env
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            if !path.is_file() {
                continue;
            }
            match Self::load(&path) {
                Ok(font) => {
                    log::debug!("Using label font {}", path.display());
                    return Some(font);
                }
                Err(e) => log::warn!("{e:#}"),
            }
        }
        log::warn!("No usable font found, boxes will be drawn without labels (set {FONT_ENV} to fix)");
        None
    }
}

#[derive(Clone, Debug)]
pub struct AnnotateStyle {
    pub colour: Rgb<u8>,
    pub thickness: u32,
    pub label_px: f32,
    pub font: Option<LabelFont>,
}

impl Default for AnnotateStyle {
    fn default() -> Self {
        Self {
            colour: BOX_COLOUR,
            thickness: BOX_THICKNESS,
            label_px: LABEL_PX,
            font: None,
        }
    }
}

impl AnnotateStyle {
    pub fn with_font(mut self, font: Option<LabelFont>) -> Self {
        self.font = font;
        self
    }

    /// Default style with whatever font [`LabelFont::discover`] finds.
    pub fn discover() -> Self {
        Self::default().with_font(LabelFont::discover())
    }
}

/// Text drawn above each box, e.g. `Person 0.87`.
pub fn person_label(confidence: f32) -> String {
    format!("Person {:.2}", confidence)
}

/// Draws every person detection onto `image`. Other classes are ignored.
/// Returns how many boxes were drawn.
pub fn annotate_persons(image: &mut RgbImage, detections: &[PedDetection], style: &AnnotateStyle) -> usize {
    let (img_w, img_h) = image.dimensions();
    let mut drawn = 0;

    for det in detections.iter().filter(|d| d.is_person()) {
        let bbox = det.bbox.clamp_to(img_w as f32, img_h as f32);
        let (x1, y1, x2, y2) = bbox.as_x1y1_x2y2_i32();
        let (w, h) = ((x2 - x1).max(0) as u32, (y2 - y1).max(0) as u32);
        if w == 0 || h == 0 {
            continue;
        }

        for t in 0..style.thickness {
            let ti = t as i32;
            if w <= 2 * t || h <= 2 * t {
                break;
            }
            let rect = Rect::at(x1 + ti, y1 + ti).of_size(w - 2 * t, h - 2 * t);
            draw_hollow_rect_mut(image, rect, style.colour);
        }

        if let Some(font) = &style.font {
            let label = person_label(det.confidence);
            let scale = PxScale::from(style.label_px);
            let (_, text_h) = text_size(scale, &font.font, &label);
            let text_y = (y1 - LABEL_OFFSET - text_h as i32).max(0);
            draw_text_mut(image, style.colour, x1, text_y, scale, &font.font, &label);
        }

        drawn += 1;
    }

    drawn
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(image)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_has_two_decimals() {
        assert_eq!(person_label(0.8765), "Person 0.88");
        assert_eq!(person_label(1.0), "Person 1.00");
    }

    #[test]
    fn missing_font_is_an_error() {
        assert!(LabelFont::load("/nonexistent/font.ttf").is_err());
    }
}
