//! Scoring an image against candidate tags.
//!
//! [`ClipScorer`] embeds the image with the vision tower and each candidate
//! with the text tower, scales the cosine similarities by CLIP's learned
//! temperature and applies a softmax. The result is a probability distribution
//! over the candidates, index-aligned with them.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::OnceLock;

use image::DynamicImage;

use crate::config::{Config, TaggingConfig};
use crate::embedding::ImageEncoder;
use crate::error::{TaggingError, TaggingResult};
use crate::types::ScoreVector;

use super::label_bank::LabelBank;
use super::text_encoder::ClipTextEncoder;
use super::vocabulary::{fingerprint, CandidateSet};

/// Candidates per text tower call.
const TEXT_BATCH_SIZE: usize = 64;

/// Cached label bank filename inside the cache directory.
const LABEL_BANK_FILENAME: &str = "label_bank.bin";

/// Ranks candidate strings by semantic similarity to an image.
pub trait EmbeddingScorer: Send + Sync {
    /// Score `image` against every candidate.
    ///
    /// The returned vector has one non-negative entry per candidate and sums to 1.
    fn score(&self, image: &DynamicImage, candidates: &[String]) -> TaggingResult<ScoreVector>;

    /// Warm any per-candidate state ahead of the first `score` call.
    fn prepare(&self, _candidates: &CandidateSet) -> TaggingResult<()> {
        Ok(())
    }
}

impl<T: EmbeddingScorer + ?Sized> EmbeddingScorer for &T {
    fn score(&self, image: &DynamicImage, candidates: &[String]) -> TaggingResult<ScoreVector> {
        (**self).score(image, candidates)
    }

    fn prepare(&self, candidates: &CandidateSet) -> TaggingResult<()> {
        (**self).prepare(candidates)
    }
}

/// Reject empty candidate lists and blank candidates.
pub fn validate_candidates(candidates: &[String]) -> TaggingResult<()> {
    if candidates.is_empty() {
        return Err(TaggingError::EmptyCandidateSet);
    }
    if let Some(index) = candidates.iter().position(|c| c.trim().is_empty()) {
        return Err(TaggingError::EmptyCandidate { index });
    }
    Ok(())
}

/// CLIP-backed scorer over ONNX Runtime.
pub struct ClipScorer {
    image_encoder: ImageEncoder,
    text_encoder: ClipTextEncoder,
    tagging: TaggingConfig,
    model: String,
    cache_dir: PathBuf,
    bank: OnceLock<LabelBank>,
}

impl ClipScorer {
    /// Load both CLIP towers and the tokenizer.
    ///
    /// Fails with [`TaggingError::ModelUnavailable`] if any file is missing or
    /// cannot be loaded.
    pub fn load(config: &Config) -> TaggingResult<Self> {
        let image_encoder = ImageEncoder::load(&config.embedding, &config.model_dir())?;
        let text_encoder = ClipTextEncoder::new(&config.model_variant_dir())?;

        Ok(Self {
            image_encoder,
            text_encoder,
            tagging: config.tagging.clone(),
            model: config.embedding.model.clone(),
            cache_dir: config.cache_dir(),
            bank: OnceLock::new(),
        })
    }

    fn cache_key(&self, candidates_fingerprint: &str) -> String {
        label_bank_key(
            candidates_fingerprint,
            &self.model,
            &self.tagging.prompt_template,
        )
    }

    fn encode_candidates(
        &self,
        candidates: &[String],
        candidates_fingerprint: &str,
    ) -> TaggingResult<LabelBank> {
        let prompts: Vec<String> = candidates
            .iter()
            .map(|c| self.tagging.prompt_for(c))
            .collect();
        LabelBank::encode_all(
            &prompts,
            candidates_fingerprint,
            &self.text_encoder,
            TEXT_BATCH_SIZE,
        )
    }

    /// Encode `candidates` once and keep the label bank for later calls.
    ///
    /// Reuses (and refreshes) the on-disk cache when `cache_label_bank` is set.
    fn prepare_bank(&self, candidates: &CandidateSet) -> TaggingResult<()> {
        validate_candidates(candidates.tags())?;
        let candidates_fingerprint = candidates.fingerprint();

        if let Some(existing) = self.bank.get() {
            if existing.fingerprint() != candidates_fingerprint {
                tracing::warn!(
                    "Label bank already prepared for a different candidate set; \
                     other candidates will be encoded per request"
                );
            }
            return Ok(());
        }

        let cache_path = self.cache_dir.join(LABEL_BANK_FILENAME);
        let cache_key = self.cache_key(&candidates_fingerprint);

        let cached = if self.tagging.cache_label_bank {
            LabelBank::load_cached(&cache_path, &cache_key, &candidates_fingerprint)
                .unwrap_or_else(|e| {
                    tracing::warn!("Ignoring unreadable label bank cache: {e}");
                    None
                })
                .filter(|bank| bank.term_count() == candidates.len())
        } else {
            None
        };

        let bank = match cached {
            Some(bank) => bank,
            None => {
                let bank = self.encode_candidates(candidates.tags(), &candidates_fingerprint)?;
                if self.tagging.cache_label_bank {
                    if let Err(e) = bank.save(&cache_path, &cache_key) {
                        tracing::warn!("Failed to cache label bank: {e}");
                    }
                }
                bank
            }
        };

        let _ = self.bank.set(bank);
        Ok(())
    }

    fn bank_for<'a>(&'a self, candidates: &[String]) -> TaggingResult<Cow<'a, LabelBank>> {
        let candidates_fingerprint = fingerprint(candidates);
        match matching_bank(self.bank.get(), &candidates_fingerprint) {
            Some(bank) => Ok(Cow::Borrowed(bank)),
            None => {
                tracing::debug!("Encoding {} candidates on demand", candidates.len());
                Ok(Cow::Owned(
                    self.encode_candidates(candidates, &candidates_fingerprint)?,
                ))
            }
        }
    }
}

/// Key for the on-disk label bank: candidates, model and prompt template.
fn label_bank_key(candidates_fingerprint: &str, model: &str, prompt_template: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in [candidates_fingerprint, model, prompt_template] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// The prepared bank, if it was built for exactly these candidates.
fn matching_bank<'a>(
    prepared: Option<&'a LabelBank>,
    candidates_fingerprint: &str,
) -> Option<&'a LabelBank> {
    prepared.filter(|bank| bank.fingerprint() == candidates_fingerprint)
}

/// Scale cosine similarities by `logit_scale` and softmax them.
fn score_against_bank(
    bank: &LabelBank,
    image_embedding: &[f32],
    candidate_count: usize,
    logit_scale: f32,
) -> TaggingResult<ScoreVector> {
    let similarities = bank.similarities(image_embedding)?;
    if similarities.len() != candidate_count {
        return Err(TaggingError::ScoreLengthMismatch {
            scores: similarities.len(),
            candidates: candidate_count,
        });
    }

    let logits: Vec<f32> = similarities
        .iter()
        .map(|cosine| logit_scale * cosine)
        .collect();
    Ok(ScoreVector::from_logits(&logits))
}

impl EmbeddingScorer for ClipScorer {
    fn score(&self, image: &DynamicImage, candidates: &[String]) -> TaggingResult<ScoreVector> {
        validate_candidates(candidates)?;

        let image_embedding = self.image_encoder.embed(image)?;
        let bank = self.bank_for(candidates)?;
        score_against_bank(
            &bank,
            &image_embedding,
            candidates.len(),
            self.tagging.logit_scale,
        )
    }

    fn prepare(&self, candidates: &CandidateSet) -> TaggingResult<()> {
        self.prepare_bank(candidates)
    }
}

static SHARED: OnceLock<ClipScorer> = OnceLock::new();

/// Process-wide CLIP scorer, loaded on first access.
///
/// Weights are read-only once loaded and live until process exit. Later calls
/// return the same instance regardless of `config`.
pub fn shared(config: &Config) -> TaggingResult<&'static ClipScorer> {
    if let Some(scorer) = SHARED.get() {
        return Ok(scorer);
    }
    let scorer = ClipScorer::load(config)?;
    Ok(SHARED.get_or_init(|| scorer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bank(fingerprint: &str) -> LabelBank {
        // cat, dog, cat again, and a tree halfway between cat and dog.
        let h = std::f32::consts::FRAC_1_SQRT_2;
        LabelBank::from_rows(
            vec![
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, 0.0],
                vec![h, h],
            ],
            fingerprint,
        )
        .unwrap()
    }

    #[test]
    fn test_score_against_bank_is_scaled_softmax() {
        let bank = unit_bank("f");
        let scores = score_against_bank(&bank, &[1.0, 0.0], 4, 100.0).unwrap();

        assert_eq!(scores.len(), 4);
        assert!((scores.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(scores[0], scores[2]);
        assert!(scores[0] > scores[3] && scores[3] > scores[1]);

        // softmax([100, 0, 100, 100/sqrt2]) at index 0
        let tree = (100.0 * std::f32::consts::FRAC_1_SQRT_2 - 100.0).exp();
        let expected = 1.0 / (2.0 + tree + (-100.0f32).exp());
        assert!((scores[0] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_logit_scale_sharpens_distribution() {
        let bank = unit_bank("f");
        let soft = score_against_bank(&bank, &[1.0, 0.0], 4, 1.0).unwrap();
        let sharp = score_against_bank(&bank, &[1.0, 0.0], 4, 100.0).unwrap();
        assert!(sharp[0] > soft[0]);
        assert!(sharp[1] < soft[1]);
    }

    #[test]
    fn test_score_against_bank_checks_lengths() {
        let bank = unit_bank("f");
        assert!(matches!(
            score_against_bank(&bank, &[1.0, 0.0], 3, 100.0),
            Err(TaggingError::ScoreLengthMismatch {
                scores: 4,
                candidates: 3
            })
        ));
        assert!(matches!(
            score_against_bank(&bank, &[1.0, 0.0, 0.0], 4, 100.0),
            Err(TaggingError::Inference { .. })
        ));
    }

    #[test]
    fn test_matching_bank_falls_back_on_other_candidates() {
        let tags: Vec<String> = ["cat", "dog", "cat", "tree"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let bank = unit_bank(&fingerprint(&tags));

        assert!(matching_bank(Some(&bank), &fingerprint(&tags)).is_some());
        assert!(matching_bank(Some(&bank), &fingerprint(&tags[..2])).is_none());
        assert!(matching_bank(None, &fingerprint(&tags)).is_none());
    }

    #[test]
    fn test_label_bank_key_covers_every_input() {
        let base = label_bank_key("abc", "clip-vit-base-patch32", "{tag}");
        assert_eq!(base, label_bank_key("abc", "clip-vit-base-patch32", "{tag}"));
        assert_ne!(base, label_bank_key("abd", "clip-vit-base-patch32", "{tag}"));
        assert_ne!(base, label_bank_key("abc", "clip-vit-large-patch14", "{tag}"));
        assert_ne!(base, label_bank_key("abc", "clip-vit-base-patch32", "a photo of {tag}"));
        assert_ne!(
            label_bank_key("ab", "c", "{tag}"),
            label_bank_key("a", "bc", "{tag}")
        );
    }

    #[test]
    fn test_validate_candidates() {
        assert!(validate_candidates(&["cat".to_string()]).is_ok());
        assert!(matches!(
            validate_candidates(&[]),
            Err(TaggingError::EmptyCandidateSet)
        ));
        assert!(matches!(
            validate_candidates(&["cat".to_string(), " ".to_string()]),
            Err(TaggingError::EmptyCandidate { index: 1 })
        ));
    }

    #[test]
    fn test_shared_without_models_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.general.model_dir = dir.path().to_path_buf();
        assert!(matches!(
            shared(&config),
            Err(TaggingError::ModelUnavailable { .. })
        ));
    }
}
