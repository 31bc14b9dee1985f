//! Vocabulary → scorer → selector, wired together.

use image::DynamicImage;

use crate::config::{Config, LimitsConfig};
use crate::error::{Result, TaggingError, TaggingResult};
use crate::pipeline::decode::{format_to_string, ImageDecoder};
use crate::tagging::scorer::EmbeddingScorer;
use crate::tagging::selector::rank_top_k;
use crate::tagging::vocabulary::{CandidateSet, TagVocabulary};
use crate::types::{Tag, TagReport};

/// Suggests SEO tags for images against a fixed vocabulary.
///
/// The candidate set is flattened once at construction and reused for every
/// request.
pub struct SeoTagger<S> {
    scorer: S,
    vocabulary: TagVocabulary,
    candidates: CandidateSet,
    top_k: usize,
    decoder: ImageDecoder,
}

impl<S: EmbeddingScorer> SeoTagger<S> {
    /// Create a tagger and let the scorer warm its per-candidate state.
    pub fn new(scorer: S, vocabulary: TagVocabulary, top_k: usize) -> TaggingResult<Self> {
        Self::with_limits(scorer, vocabulary, top_k, LimitsConfig::default())
    }

    /// Create a tagger from configuration: top-k and limits from `config`.
    pub fn from_config(
        scorer: S,
        vocabulary: TagVocabulary,
        config: &Config,
    ) -> TaggingResult<Self> {
        Self::with_limits(
            scorer,
            vocabulary,
            config.tagging.top_k,
            config.limits.clone(),
        )
    }

    fn with_limits(
        scorer: S,
        vocabulary: TagVocabulary,
        top_k: usize,
        limits: LimitsConfig,
    ) -> TaggingResult<Self> {
        if top_k == 0 {
            return Err(TaggingError::InvalidTopK);
        }
        let candidates = vocabulary.candidates();
        scorer.prepare(&candidates)?;

        tracing::debug!(
            "Tagger ready: {} categories, {} candidates, top_k={}",
            vocabulary.categories().len(),
            candidates.len(),
            top_k
        );

        Ok(Self {
            scorer,
            vocabulary,
            candidates,
            top_k,
            decoder: ImageDecoder::new(limits),
        })
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocabulary
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Suggest the top tags for a decoded image, best first.
    pub fn suggest(&self, image: &DynamicImage) -> TaggingResult<Vec<Tag>> {
        self.suggest_k(image, self.top_k)
    }

    /// Suggest the top `k` tags for a decoded image, best first.
    pub fn suggest_k(&self, image: &DynamicImage, k: usize) -> TaggingResult<Vec<Tag>> {
        let scores = self.scorer.score(image, self.candidates.tags())?;
        if scores.len() != self.candidates.len() {
            return Err(TaggingError::ScoreLengthMismatch {
                scores: scores.len(),
                candidates: self.candidates.len(),
            });
        }

        let tags = rank_top_k(&scores, k)?
            .into_iter()
            .map(|(idx, confidence)| Tag {
                name: self.candidates.tags()[idx].clone(),
                confidence,
                category: self.candidates.category_of(idx).map(str::to_string),
            })
            .collect();
        Ok(tags)
    }

    /// Decode an uploaded image and suggest tags for it.
    pub fn suggest_bytes(&self, bytes: &[u8], name: &str) -> Result<TagReport> {
        self.suggest_bytes_k(bytes, name, self.top_k)
    }

    /// Decode an uploaded image and suggest `k` tags for it.
    pub fn suggest_bytes_k(&self, bytes: &[u8], name: &str, k: usize) -> Result<TagReport> {
        let decoded = self.decoder.decode_bytes(bytes, name)?;
        let tags = self.suggest_k(&decoded.image, k)?;

        tracing::debug!(
            "Suggested {} tags for {}: {:?}",
            tags.len(),
            name,
            tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
        );

        Ok(TagReport {
            file_name: name.to_string(),
            stored_path: None,
            width: decoded.width,
            height: decoded.height,
            format: format_to_string(decoded.format),
            tags,
        })
    }
}
