//! CLIP image embedding.
//!
//! Converts a decoded image into an L2-normalized vector in CLIP's joint
//! image/text space, using the vision tower running locally via ONNX Runtime.
//!
//! # Usage
//!
//! ```rust,ignore
//! use seotag_core::embedding::ImageEncoder;
//! use seotag_core::Config;
//!
//! let config = Config::default();
//! let encoder = ImageEncoder::load(&config.embedding, &config.model_dir())?;
//! let embedding = encoder.embed(&image)?;
//! // embedding is a Vec<f32> with 512 elements
//! ```

pub(crate) mod clip;
pub mod preprocess;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::EmbeddingConfig;
use crate::error::TaggingError;

use self::clip::ClipVisionSession;
use self::preprocess::preprocess;

/// The vision tower ONNX model filename.
pub const VISION_MODEL_FILENAME: &str = "vision_model.onnx";

/// Engine for generating image embeddings via the CLIP vision tower.
pub struct ImageEncoder {
    session: ClipVisionSession,
    image_size: u32,
}

impl ImageEncoder {
    /// Load the vision tower from the model directory.
    ///
    /// Expects the ONNX model at `{model_dir}/{model_name}/vision_model.onnx`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, TaggingError> {
        let model_path = Self::model_path(config, model_dir);

        if !model_path.exists() {
            return Err(TaggingError::ModelUnavailable {
                path: model_path,
                message: "Model not found. Run `seotag models download` first.".to_string(),
            });
        }

        tracing::info!("Loading CLIP vision tower from {:?}", model_path);
        let session = ClipVisionSession::load(&model_path)?;
        tracing::info!("CLIP vision tower loaded successfully");

        Ok(Self {
            session,
            image_size: config.image_size,
        })
    }

    /// Get the square image input size for this model.
    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Generate an L2-normalized embedding vector for an image.
    pub fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>, TaggingError> {
        let tensor = preprocess(image, self.image_size)?;
        self.session.embed(&tensor)
    }

    /// Check whether the model file exists on disk.
    pub fn model_exists(config: &EmbeddingConfig, model_dir: &Path) -> bool {
        Self::model_path(config, model_dir).exists()
    }

    /// Get the expected model file path.
    pub fn model_path(config: &EmbeddingConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model).join(VISION_MODEL_FILENAME)
    }
}
