//! Image preprocessing for the CLIP vision tower.
//!
//! CLIP ViT-B/32 expects:
//! - Centered square crop of the shortest edge, resized to 224×224 (bicubic)
//! - Channel order: RGB
//! - Normalization: (pixel/255 - mean) / std with the CLIP per-channel constants
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

use crate::error::{TaggingError, TaggingResult};

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP normalization mean (per-channel).
#[allow(clippy::excessive_precision)]
const NORM_MEAN: [f32; CHANNELS] = [0.48145466, 0.4578275, 0.40821073];

/// CLIP normalization std (per-channel).
#[allow(clippy::excessive_precision)]
const NORM_STD: [f32; CHANNELS] = [0.26862954, 0.26130258, 0.27577711];

/// Preprocess an image for CLIP inference.
///
/// Works for any width, height and color mode; only zero-sized images are
/// rejected.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> TaggingResult<Array4<f32>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TaggingError::invalid_image(
            "image",
            format!("cannot resize a {width}x{height} image"),
        ));
    }

    // Crop before resizing so the intermediate buffer never exceeds the square.
    let (left, top, side) = center_square(width, height);
    let rgb = image
        .crop_imm(left, top, side, side)
        .resize_exact(
            image_size,
            image_size,
            image::imageops::FilterType::CatmullRom,
        )
        .to_rgb8();

    let size = image_size as usize;
    let tensor = Array4::from_shape_fn((1, CHANNELS, size, size), |(_, c, y, x)| {
        let value = rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
        (value - NORM_MEAN[c]) / NORM_STD[c]
    });

    Ok(tensor)
}

/// Offset and side of the largest centered square.
fn center_square(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    ((width - side) / 2, (height - side) / 2, side)
}
