//! Image decoding with content-based format detection and validation.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::TaggingError;

use super::validate::Validator;

/// Image decoder with configurable limits.
pub struct ImageDecoder {
    limits: LimitsConfig,
    validator: Validator,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Upload size in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            limits,
        }
    }

    /// Decode an uploaded image from memory.
    ///
    /// Every failure is reported as [`TaggingError::InvalidImage`] naming `name`.
    pub fn decode_bytes(&self, bytes: &[u8], name: &str) -> Result<DecodedImage, TaggingError> {
        self.validator.validate(bytes, name)?;

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| {
                TaggingError::invalid_image(name, format!("Cannot detect image format: {e}"))
            })?;
        let format = reader
            .format()
            .ok_or_else(|| TaggingError::invalid_image(name, "Unsupported image format"))?;
        let image = reader
            .decode()
            .map_err(|e| TaggingError::invalid_image(name, e.to_string()))?;

        let (width, height) = image.dimensions();
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(TaggingError::invalid_image(
                name,
                format!(
                    "Image too large ({}x{} > {})",
                    width, height, self.limits.max_image_dimension
                ),
            ));
        }
        if width == 0 || height == 0 {
            return Err(TaggingError::invalid_image(name, "Image has no pixels"));
        }

        tracing::debug!(
            "Decoded {} as {:?} ({}x{}, {} bytes)",
            name,
            format,
            width,
            height,
            bytes.len()
        );

        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size: bytes.len() as u64,
        })
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}
