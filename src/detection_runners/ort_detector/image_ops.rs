//! Functions to preprocess images.

use anyhow::{bail, Result};
use fast_image_resize::{
    images::{CroppedImageMut, Image as FirImage},
    pixels::PixelType,
    FilterType, ResizeAlg, ResizeOptions, Resizer,
};
use image::RgbImage;
use ndarray::Array;
use rayon::prelude::*;
use crate::data::X;

/// Gray used by YOLO letterboxing.
pub const LETTERBOX_FILL: u8 = 114;

/// Scale that fits a `w0 x h0` image inside `target_w x target_h` without distortion.
pub fn letterbox_ratio(w0: u32, h0: u32, target_w: u32, target_h: u32) -> f32 {
    (target_w as f32 / w0 as f32).min(target_h as f32 / h0 as f32)
}

/// Main preprocessing entry point: letterbox every image to `target_w x target_h`,
/// scale to `[0, 1]` and stack into one NCHW batch.
pub fn preprocess(xs: &[RgbImage], target_h: u32, target_w: u32) -> Result<X> {
    if xs.is_empty() {
        bail!("No images to preprocess");
    }

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

    let image_tensors: Vec<Vec<f32>> = xs
        .par_iter()
        .map(|img| {
            let mut resizer = Resizer::new();
            let resized = letterbox_image(img, target_h, target_w, LETTERBOX_FILL, &mut resizer, &options)?;
            nchw_normalize_flat(&resized)
        })
        .collect::<Result<_>>()?;

    // Stack into one batch manually
    let channels = 3;
    let height = target_h as usize;
    let width = target_w as usize;
    let image_size = channels * height * width;

    let mut batch_flat: Vec<f32> = Vec::with_capacity(xs.len() * image_size);
    for img in image_tensors.iter() {
        batch_flat.extend_from_slice(img);
    }

    let batch = Array::from_shape_vec(
        (xs.len(), channels, height, width),
        batch_flat,
    )?.into_dyn();

    Ok(X::from(batch))
}

/// Resizes into the top-left corner of a gray canvas, so boxes map back with `1 / ratio` alone.
fn letterbox_image<'a>(
    img: &RgbImage,
    target_h: u32,
    target_w: u32,
    bg: u8,
    resizer: &mut Resizer,
    resize_options: &ResizeOptions,
) -> Result<FirImage<'a>> {
    let (w0, h0) = img.dimensions();
    if w0 == 0 || h0 == 0 {
        bail!("Cannot letterbox an empty image ({w0}x{h0})");
    }
    let scale = letterbox_ratio(w0, h0, target_w, target_h);
    let new_w = ((w0 as f32 * scale).round() as u32).clamp(1, target_w);
    let new_h = ((h0 as f32 * scale).round() as u32).clamp(1, target_h);

    let mut padded = FirImage::from_vec_u8(
        target_w,
        target_h,
        vec![bg; (target_w * target_h * 3) as usize],
        PixelType::U8x3,
    )?;

    {
        let mut cropped = CroppedImageMut::new(&mut padded, 0, 0, new_w, new_h)?;
        resizer.resize(img, &mut cropped, resize_options)?;
    }

    Ok(padded)
}

fn nchw_normalize_flat(img: &FirImage) -> Result<Vec<f32>> {
    let buf = img.buffer();
    let w = img.width() as usize;
    let h = img.height() as usize;

    if buf.len() != w * h * 3 {
        bail!("Unexpected buffer size: got {}, expected {}", buf.len(), w * h * 3);
    }

    let mut out = vec![0.0f32; buf.len()];
    let hw = w * h;

    for i in 0..hw {
        out[i] = buf[3 * i] as f32 / 255.0;              // R
        out[i + hw] = buf[3 * i + 1] as f32 / 255.0;     // G
        out[i + 2 * hw] = buf[3 * i + 2] as f32 / 255.0; // B
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn wide_image_is_padded_below() {
        let img = RgbImage::from_pixel(64, 32, Rgb([255, 0, 0]));
        let x = preprocess(&[img], 32, 32).unwrap();
        assert_eq!(x.shape(), &[1, 3, 32, 32]);

        // top half is the red image, bottom half the letterbox gray
        assert!(x[[0, 0, 4, 4]] > 0.99);
        assert!(x[[0, 1, 4, 4]] < 0.01);
        let gray = LETTERBOX_FILL as f32 / 255.0;
        assert!((x[[0, 0, 28, 4]] - gray).abs() < 1e-6);
        assert!((x[[0, 2, 28, 30]] - gray).abs() < 1e-6);
    }

    #[test]
    fn batches_multiple_images() {
        let a = RgbImage::from_pixel(10, 20, Rgb([0, 0, 0]));
        let b = RgbImage::from_pixel(30, 30, Rgb([255, 255, 255]));
        let x = preprocess(&[a, b], 16, 16).unwrap();
        assert_eq!(x.shape(), &[2, 3, 16, 16]);
        assert!(x[[1, 1, 8, 8]] > 0.99);
    }

    #[test]
    fn ratio_picks_limiting_side() {
        assert_eq!(letterbox_ratio(1280, 720, 640, 640), 0.5);
        assert_eq!(letterbox_ratio(320, 640, 640, 640), 1.0);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(preprocess(&[], 32, 32).is_err());
        assert!(preprocess(&[RgbImage::new(0, 0)], 32, 32).is_err());
    }
}
