//! Pre-computed candidate embeddings for fast scoring.
//!
//! The label bank stores a flat N×D matrix of text embeddings, one row per
//! candidate, so an image can be scored with N dot products and no text tower
//! call. Banks are cached on disk as raw little-endian f32 with a `.meta`
//! sidecar describing what they were built from.

use std::path::Path;

use crate::error::TaggingError;

use super::text_encoder::ClipTextEncoder;

/// Pre-computed candidate embeddings.
///
/// Stores a single flat matrix (N × D, row-major).
#[derive(Debug, Clone)]
pub struct LabelBank {
    matrix: Vec<f32>,
    embedding_dim: usize,
    term_count: usize,
    /// Fingerprint of the candidate list the rows belong to.
    fingerprint: String,
}

impl LabelBank {
    /// Build a label bank from already-normalized rows.
    pub fn from_rows(
        rows: Vec<Vec<f32>>,
        fingerprint: impl Into<String>,
    ) -> Result<Self, TaggingError> {
        let term_count = rows.len();
        let embedding_dim = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != embedding_dim) {
            return Err(TaggingError::Inference {
                message: format!(
                    "Label bank row {} has {} dims, expected {}",
                    bad,
                    rows[bad].len(),
                    embedding_dim
                ),
            });
        }
        Ok(Self {
            matrix: rows.into_iter().flatten().collect(),
            embedding_dim,
            term_count,
            fingerprint: fingerprint.into(),
        })
    }

    /// Encode every prompt and build the label bank.
    ///
    /// `prompts` are index-aligned with the candidates identified by
    /// `fingerprint`. Batches many prompts per ONNX call.
    pub fn encode_all(
        prompts: &[String],
        fingerprint: &str,
        text_encoder: &ClipTextEncoder,
        batch_size: usize,
    ) -> Result<Self, TaggingError> {
        tracing::info!("Encoding {} candidate tags...", prompts.len());

        let mut rows: Vec<Vec<f32>> = Vec::with_capacity(prompts.len());
        for chunk in prompts.chunks(batch_size.max(1)) {
            rows.extend(text_encoder.encode_batch(chunk)?);
            tracing::debug!("  Encoded {}/{} candidates", rows.len(), prompts.len());
        }

        let bank = Self::from_rows(rows, fingerprint)?;
        tracing::info!(
            "Label bank ready: {} terms x {} dims ({:.1} KB)",
            bank.term_count,
            bank.embedding_dim,
            (bank.term_count * bank.embedding_dim * 4) as f64 / 1_000.0
        );
        Ok(bank)
    }

    /// Save label bank to disk as raw f32 binary for fast reload.
    ///
    /// Also writes a `.meta` sidecar with `cache_key` for cache invalidation.
    pub fn save(&self, path: &Path, cache_key: &str) -> Result<(), TaggingError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| cache_error(path, e))?;
        }

        let bytes: Vec<u8> = self.matrix.iter().flat_map(|f| f.to_le_bytes()).collect();
        std::fs::write(path, &bytes).map_err(|e| cache_error(path, e))?;

        let meta_path = path.with_extension("meta");
        let meta = format!(
            "cache_key={}\nterm_count={}\nembedding_dim={}\n",
            cache_key, self.term_count, self.embedding_dim
        );
        std::fs::write(&meta_path, meta).map_err(|e| cache_error(&meta_path, e))?;

        tracing::info!("Saved label bank to {:?} ({} bytes)", path, bytes.len());
        Ok(())
    }

    /// Load a cached label bank if its `.meta` sidecar matches `cache_key`.
    ///
    /// Returns `Ok(None)` for a missing or stale cache.
    pub fn load_cached(
        path: &Path,
        cache_key: &str,
        fingerprint: &str,
    ) -> Result<Option<Self>, TaggingError> {
        let meta_path = path.with_extension("meta");
        let Ok(meta) = std::fs::read_to_string(&meta_path) else {
            return Ok(None);
        };

        let field = |key: &str| {
            meta.lines()
                .find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
                .map(str::to_string)
        };
        if field("cache_key").as_deref() != Some(cache_key) {
            tracing::debug!("Label bank cache at {:?} is stale", path);
            return Ok(None);
        }
        let (Some(term_count), Some(embedding_dim)) = (
            field("term_count").and_then(|v| v.parse::<usize>().ok()),
            field("embedding_dim").and_then(|v| v.parse::<usize>().ok()),
        ) else {
            return Ok(None);
        };

        let bytes = std::fs::read(path).map_err(|e| cache_error(path, e))?;
        let expected_len = term_count * embedding_dim * 4;
        if bytes.len() != expected_len {
            tracing::warn!(
                "Label bank size mismatch: expected {} bytes ({} terms), got {} bytes",
                expected_len,
                term_count,
                bytes.len()
            );
            return Ok(None);
        }

        let matrix: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        tracing::info!("Loaded label bank: {} terms from {:?}", term_count, path);

        Ok(Some(Self {
            matrix,
            embedding_dim,
            term_count,
            fingerprint: fingerprint.to_string(),
        }))
    }

    /// Cosine similarity of `image_embedding` against every row.
    ///
    /// Both sides are L2-normalized, so the dot product is the cosine.
    pub fn similarities(&self, image_embedding: &[f32]) -> Result<Vec<f32>, TaggingError> {
        if image_embedding.len() != self.embedding_dim {
            return Err(TaggingError::Inference {
                message: format!(
                    "Image embedding has {} dims but label bank has {}",
                    image_embedding.len(),
                    self.embedding_dim
                ),
            });
        }
        Ok(self
            .matrix
            .chunks_exact(self.embedding_dim.max(1))
            .map(|row| crate::math::dot(image_embedding, row))
            .collect())
    }

    /// Get the flat matrix.
    pub fn matrix(&self) -> &[f32] {
        &self.matrix
    }

    /// Get the embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Get the number of terms in the bank.
    pub fn term_count(&self) -> usize {
        self.term_count
    }

    /// Fingerprint of the candidates this bank was built for.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn cache_error(path: &Path, e: std::io::Error) -> TaggingError {
    TaggingError::Inference {
        message: format!("Label bank cache I/O failed for {:?}: {}", path, e),
    }
}
