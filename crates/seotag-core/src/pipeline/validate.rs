//! Upload validation before decoding.

use crate::config::LimitsConfig;
use crate::error::TaggingError;

/// Validates uploaded bytes before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Perform quick validation before full decode.
    ///
    /// Checks:
    /// - The upload is not empty
    /// - The size is within limits
    /// - The header has valid image magic bytes
    pub fn validate(&self, bytes: &[u8], name: &str) -> Result<(), TaggingError> {
        if bytes.is_empty() {
            return Err(TaggingError::invalid_image(name, "Upload is empty"));
        }

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if bytes.len() as u64 > max_bytes {
            return Err(TaggingError::invalid_image(
                name,
                format!(
                    "File too large ({}MB > {}MB)",
                    bytes.len() as u64 / (1024 * 1024),
                    self.limits.max_file_size_mb
                ),
            ));
        }

        if bytes.len() < 4 {
            return Err(TaggingError::invalid_image(
                name,
                "File too small to be a valid image",
            ));
        }

        if !Self::is_valid_image_header(bytes) {
            return Err(TaggingError::invalid_image(
                name,
                "Unrecognized image format (invalid magic bytes)",
            ));
        }

        Ok(())
    }

    /// Check if the header bytes match known image formats.
    fn is_valid_image_header(header: &[u8]) -> bool {
        if header.len() < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return true;
        }

        // PNG: 89 50 4E 47
        if header.starts_with(&[0x89, b'P', b'N', b'G']) {
            return true;
        }

        // GIF: GIF8
        if header.starts_with(b"GIF8") {
            return true;
        }

        // WebP: RIFF....WEBP
        if header.starts_with(b"RIFF") {
            return header.len() < 12 || &header[8..12] == b"WEBP";
        }

        // BMP: BM
        if header.starts_with(b"BM") {
            return true;
        }

        // TIFF: II*\0 (little-endian) or MM\0* (big-endian)
        header.starts_with(&[b'I', b'I', 0x2A, 0x00])
            || header.starts_with(&[b'M', b'M', 0x00, 0x2A])
    }
}
