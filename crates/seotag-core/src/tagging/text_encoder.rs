//! CLIP text tower for generating candidate embeddings.
//!
//! Loads the CLIP text ONNX model and tokenizer, and encodes strings into
//! vectors in the same space as the vision tower.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::error::TaggingError;

/// The text tower ONNX model filename.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";

/// The tokenizer filename.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// CLIP context length.
const MAX_LENGTH: usize = 77;

/// CLIP pads with the end-of-text token.
const FALLBACK_PAD_ID: u32 = 49407;

/// Projected text output, aligned with `image_embeds`.
const TEXT_EMBEDS_OUTPUT: &str = "text_embeds";

/// CLIP text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the vision tower.
pub struct ClipTextEncoder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    pad_id: u32,
    takes_attention_mask: bool,
}

impl ClipTextEncoder {
    /// Load the text encoder from a model variant directory.
    ///
    /// Expects `text_model.onnx` and `tokenizer.json` in `model_dir`.
    pub fn new(model_dir: &Path) -> Result<Self, TaggingError> {
        let text_model_path = model_dir.join(TEXT_MODEL_FILENAME);
        let tokenizer_path = model_dir.join(TOKENIZER_FILENAME);

        for path in [&text_model_path, &tokenizer_path] {
            if !path.exists() {
                return Err(TaggingError::ModelUnavailable {
                    path: path.clone(),
                    message: "Not found. Run `seotag models download` first.".to_string(),
                });
            }
        }

        let session = Session::builder()
            .map_err(|e| {
                unavailable(
                    &text_model_path,
                    format!("Failed to create ONNX session builder: {e}"),
                )
            })?
            .commit_from_file(&text_model_path)
            .map_err(|e| {
                unavailable(
                    &text_model_path,
                    format!("Failed to load text encoder model: {e}"),
                )
            })?;

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            unavailable(&tokenizer_path, format!("Failed to load tokenizer: {e}"))
        })?;

        let pad_id = tokenizer
            .token_to_id("<|endoftext|>")
            .unwrap_or(FALLBACK_PAD_ID);

        let takes_attention_mask = session
            .inputs()
            .iter()
            .any(|i| i.name() == "attention_mask");

        tracing::debug!(
            "Loaded CLIP text encoder (inputs: {:?}, outputs: {:?})",
            session
                .inputs()
                .iter()
                .map(|i| i.name())
                .collect::<Vec<_>>(),
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            pad_id,
            takes_attention_mask,
        })
    }

    /// Encode a batch of text strings to L2-normalized embeddings.
    ///
    /// Sequences are padded to the longest in the batch (capped at 77 tokens).
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, TaggingError> {
        let batch_size = texts.len();
        if batch_size == 0 {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| TaggingError::Inference {
                message: format!("Tokenization failed: {e}"),
            })?;

        let ids: Vec<&[u32]> = encodings.iter().map(|e| e.get_ids()).collect();
        let (input_ids, attention_mask, seq_len) = pad_batch(&ids, self.pad_id);
        let shape = vec![batch_size as i64, seq_len as i64];

        let input_ids_value =
            Value::from_array((shape.clone(), input_ids)).map_err(|e| TaggingError::Inference {
                message: format!("Failed to create input_ids tensor: {e}"),
            })?;

        let mut session = self.session.lock().map_err(|e| TaggingError::Inference {
            message: format!("Text encoder lock poisoned: {e}"),
        })?;

        let outputs = if self.takes_attention_mask {
            let mask_value =
                Value::from_array((shape, attention_mask)).map_err(|e| TaggingError::Inference {
                    message: format!("Failed to create attention_mask tensor: {e}"),
                })?;
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => mask_value
            ])
        } else {
            session.run(ort::inputs!["input_ids" => input_ids_value])
        }
        .map_err(|e| TaggingError::Inference {
            message: format!("Text encoder inference failed: {e}"),
        })?;

        let text_embeds = outputs
            .iter()
            .find(|(name, _)| *name == TEXT_EMBEDS_OUTPUT)
            .ok_or_else(|| TaggingError::Inference {
                message: format!("Text encoder did not produce {TEXT_EMBEDS_OUTPUT}"),
            })?;

        let (_shape, data) =
            text_embeds
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| TaggingError::Inference {
                    message: format!("Failed to extract {TEXT_EMBEDS_OUTPUT}: {e}"),
                })?;

        split_embeddings(data, batch_size)
    }

    /// Check whether the text encoder model files exist.
    pub fn model_exists(model_dir: &Path) -> bool {
        model_dir.join(TEXT_MODEL_FILENAME).exists() && model_dir.join(TOKENIZER_FILENAME).exists()
    }
}

fn unavailable(path: &Path, message: String) -> TaggingError {
    TaggingError::ModelUnavailable {
        path: PathBuf::from(path),
        message,
    }
}

/// Split a flat `[batch, dim]` output into L2-normalized rows.
fn split_embeddings(data: &[f32], batch_size: usize) -> Result<Vec<Vec<f32>>, TaggingError> {
    if batch_size == 0 || data.is_empty() || data.len() % batch_size != 0 {
        return Err(TaggingError::Inference {
            message: format!(
                "{TEXT_EMBEDS_OUTPUT} has {} values, not a non-empty multiple of batch size {}",
                data.len(),
                batch_size
            ),
        });
    }
    let embedding_dim = data.len() / batch_size;
    Ok(data
        .chunks(embedding_dim)
        .map(crate::math::l2_normalize)
        .collect())
}

/// Right-pad token id sequences to a common length.
///
/// Sequences longer than the context are cut and end with `pad_id`, which is
/// CLIP's end-of-text token; the text tower pools at that position.
///
/// Returns flat `input_ids`, the matching `attention_mask`, and the sequence length.
fn pad_batch(ids: &[&[u32]], pad_id: u32) -> (Vec<i64>, Vec<i64>, usize) {
    let seq_len = ids
        .iter()
        .map(|s| s.len())
        .max()
        .unwrap_or(0)
        .clamp(1, MAX_LENGTH);

    let mut input_ids = vec![pad_id as i64; ids.len() * seq_len];
    let mut attention_mask = vec![0i64; ids.len() * seq_len];
    for (i, seq) in ids.iter().enumerate() {
        for (j, &id) in seq.iter().take(seq_len).enumerate() {
            input_ids[i * seq_len + j] = id as i64;
            attention_mask[i * seq_len + j] = 1;
        }
        if seq.len() > seq_len {
            input_ids[i * seq_len + seq_len - 1] = pad_id as i64;
        }
    }
    (input_ids, attention_mask, seq_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_batch_pads_to_longest() {
        let a: &[u32] = &[49406, 320, 49407];
        let b: &[u32] = &[49406, 49407];
        let (ids, mask, len) = pad_batch(&[a, b], 49407);
        assert_eq!(len, 3);
        assert_eq!(ids, vec![49406, 320, 49407, 49406, 49407, 49407]);
        assert_eq!(mask, vec![1, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn test_pad_batch_truncates_to_context_length() {
        let long: Vec<u32> = (0..100).collect();
        let (ids, mask, len) = pad_batch(&[&long], 49407);
        assert_eq!(len, MAX_LENGTH);
        assert_eq!(ids.len(), MAX_LENGTH);
        assert!(mask.iter().all(|&m| m == 1));
        assert_eq!(ids[MAX_LENGTH - 2], (MAX_LENGTH - 2) as i64);
        assert_eq!(ids[MAX_LENGTH - 1], 49407);
    }

    #[test]
    fn test_pad_batch_keeps_short_sequences_intact() {
        let short: &[u32] = &[49406, 320, 49407];
        let long: Vec<u32> = (0..90).collect();
        let (ids, _, len) = pad_batch(&[short, &long], 49407);
        assert_eq!(len, MAX_LENGTH);
        assert_eq!(&ids[..3], &[49406, 320, 49407]);
        assert_eq!(ids[2 * MAX_LENGTH - 1], 49407);
    }

    #[test]
    fn test_split_embeddings() {
        let rows = split_embeddings(&[3.0, 4.0, 0.0, 2.0], 2).unwrap();
        assert_eq!(rows.len(), 2);
        assert!((rows[0][0] - 0.6).abs() < 1e-6);
        assert!((rows[1][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_split_embeddings_rejects_bad_output() {
        assert!(matches!(
            split_embeddings(&[], 2),
            Err(TaggingError::Inference { .. })
        ));
        assert!(matches!(
            split_embeddings(&[1.0, 2.0, 3.0], 2),
            Err(TaggingError::Inference { .. })
        ));
    }

    #[test]
    fn test_missing_files_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!ClipTextEncoder::model_exists(dir.path()));
        let err = ClipTextEncoder::new(dir.path()).err().unwrap();
        assert!(matches!(err, TaggingError::ModelUnavailable { .. }));
    }
}
