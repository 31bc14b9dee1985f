//! CLIP vision tower session management and inference.
//!
//! Loads the CLIP vision encoder exported to ONNX and runs it to produce the
//! projected `image_embeds` vector shared with the text tower.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::TaggingError;

/// Output holding the cross-modal projection. `last_hidden_state` is not
/// aligned with the text tower and must not be used for scoring.
const IMAGE_EMBEDS_OUTPUT: &str = "image_embeds";

/// Wraps an ONNX Runtime session for the CLIP vision tower.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct ClipVisionSession {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl ClipVisionSession {
    /// Load the vision tower from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, TaggingError> {
        let session = Session::builder()
            .map_err(|e| TaggingError::ModelUnavailable {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| TaggingError::ModelUnavailable {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "Loaded CLIP vision tower from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Run inference on a preprocessed image tensor and return the embedding.
    ///
    /// Input shape: \[1, 3, image_size, image_size\] (NCHW, CLIP-normalized).
    /// Output: L2-normalized embedding (512 floats for ViT-B/32).
    pub fn embed(&self, preprocessed: &Array4<f32>) -> Result<Vec<f32>, TaggingError> {
        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| TaggingError::Inference {
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| TaggingError::Inference {
            message: format!("Vision session lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| TaggingError::Inference {
            message: format!("ONNX inference failed: {e}"),
        })?;

        let image_embeds = outputs
            .iter()
            .find(|(name, _)| *name == IMAGE_EMBEDS_OUTPUT)
            .ok_or_else(|| TaggingError::Inference {
                message: format!("Vision tower did not produce {IMAGE_EMBEDS_OUTPUT}"),
            })?;

        let (shape, data) =
            image_embeds
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| TaggingError::Inference {
                    message: format!("Failed to extract {IMAGE_EMBEDS_OUTPUT} tensor: {e}"),
                })?;

        // image_embeds is [1, dim]; take the single row.
        let mut raw = match shape.len() {
            1 => data.to_vec(),
            2 => {
                let dim = shape[1] as usize;
                data[..dim].to_vec()
            }
            _ => {
                return Err(TaggingError::Inference {
                    message: format!("Unexpected {IMAGE_EMBEDS_OUTPUT} shape: {:?}", shape),
                });
            }
        };

        crate::math::l2_normalize_in_place(&mut raw);
        Ok(raw)
    }
}
