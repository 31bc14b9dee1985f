//! Categorized tag vocabulary and its flattened candidate set.
//!
//! A vocabulary is an ordered list of categories, each holding an ordered list
//! of tags. Flattening walks categories in declaration order, then tags within
//! each category, and keeps duplicates: "sunset" listed twice is scored twice.
//!
//! Vocabulary files are TOML with one `[[category]]` table per category, which
//! keeps the declaration order that a plain table would lose:
//!
//! ```toml
//! [[category]]
//! name = "Wildlife"
//! tags = ["lion", "tiger"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, TaggingError};

/// A named group of candidate tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCategory {
    name: String,
    tags: Vec<String>,
}

impl TagCategory {
    /// Create a category from a name and its tags, in order.
    pub fn new<I, S>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    #[serde(rename = "category", default)]
    categories: Vec<TagCategory>,
}

/// A validated, immutable tag vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVocabulary {
    categories: Vec<TagCategory>,
}

impl TagVocabulary {
    /// Build a vocabulary, rejecting empty categories and blank tags.
    ///
    /// An empty vocabulary is reported as [`TaggingError::EmptyCandidateSet`]
    /// since nothing could ever be scored against it.
    pub fn new(categories: Vec<TagCategory>) -> Result<Self> {
        if categories.is_empty() {
            return Err(TaggingError::EmptyCandidateSet.into());
        }
        for (ci, category) in categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "vocabulary category #{} has an empty name",
                    ci + 1
                ))
                .into());
            }
            if category.tags.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "vocabulary category {:?} has no tags",
                    category.name
                ))
                .into());
            }
            if let Some(ti) = category.tags.iter().position(|t| t.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "vocabulary category {:?} has an empty tag at position {}",
                    category.name,
                    ti + 1
                ))
                .into());
            }
        }
        Ok(Self { categories })
    }

    /// Wrap categories that are already known to be valid.
    pub(crate) fn from_validated(categories: Vec<TagCategory>) -> Self {
        debug_assert!(!categories.is_empty());
        Self { categories }
    }

    /// Parse a vocabulary from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: VocabularyFile = toml::from_str(content).map_err(ConfigError::from)?;
        Self::new(file.categories)
    }

    /// Load a vocabulary from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        let vocabulary = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded vocabulary from {:?}: {} categories, {} tags",
            path,
            vocabulary.categories.len(),
            vocabulary.tag_count()
        );
        Ok(vocabulary)
    }

    /// Serialize the vocabulary to TOML, one `[[category]]` table each.
    pub fn to_toml(&self) -> Result<String> {
        let file = VocabularyFile {
            categories: self.categories.clone(),
        };
        toml::to_string_pretty(&file)
            .map_err(|e| ConfigError::ValidationError(e.to_string()).into())
    }

    pub fn categories(&self) -> &[TagCategory] {
        &self.categories
    }

    /// Total number of tags across all categories, duplicates included.
    pub fn tag_count(&self) -> usize {
        self.categories.iter().map(|c| c.tags.len()).sum()
    }

    /// All tags in category-then-declaration order, duplicates preserved.
    pub fn flatten(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|c| c.tags.iter().cloned())
            .collect()
    }

    /// Flatten into a [`CandidateSet`] that remembers each tag's category.
    pub fn candidates(&self) -> CandidateSet {
        let mut tags = Vec::with_capacity(self.tag_count());
        let mut owners = Vec::with_capacity(self.tag_count());
        for (ci, category) in self.categories.iter().enumerate() {
            for tag in &category.tags {
                tags.push(tag.clone());
                owners.push(ci);
            }
        }
        CandidateSet {
            tags,
            owners,
            category_names: self.categories.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

/// Flattened candidates, index-aligned with a scorer's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    tags: Vec<String>,
    owners: Vec<usize>,
    category_names: Vec<String>,
}

impl CandidateSet {
    /// Build a candidate set with no category information.
    pub fn from_tags(tags: Vec<String>) -> Self {
        Self {
            owners: Vec::new(),
            category_names: Vec::new(),
            tags,
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Category name of the candidate at `index`, if known.
    pub fn category_of(&self, index: usize) -> Option<&str> {
        self.owners
            .get(index)
            .and_then(|&ci| self.category_names.get(ci))
            .map(String::as_str)
    }

    /// BLAKE3 hash of the tags in order.
    ///
    /// Used to match a prepared label bank to the candidates it was built from.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.tags)
    }
}

/// BLAKE3 hash of a candidate list in order.
///
/// Each tag is length-prefixed, so no choice of tag text can make two
/// different lists hash the same.
pub fn fingerprint(tags: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(tags.len() as u64).to_le_bytes());
    for tag in tags {
        hasher.update(&(tag.len() as u64).to_le_bytes());
        hasher.update(tag.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeoTagError;

    fn two_category_vocab() -> TagVocabulary {
        TagVocabulary::new(vec![
            TagCategory::new("A", ["cat", "dog"]),
            TagCategory::new("B", ["cat", "tree"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_flatten_preserves_order_and_duplicates() {
        let vocab = two_category_vocab();
        assert_eq!(vocab.flatten(), vec!["cat", "dog", "cat", "tree"]);
        assert_eq!(vocab.tag_count(), 4);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let vocab = two_category_vocab();
        assert_eq!(vocab.flatten(), vocab.flatten());
    }

    #[test]
    fn test_candidates_track_categories() {
        let candidates = two_category_vocab().candidates();
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates.category_of(0), Some("A"));
        assert_eq!(candidates.category_of(2), Some("B"));
        assert_eq!(candidates.category_of(4), None);
    }

    #[test]
    fn test_fingerprint_separates_tag_boundaries() {
        let a = vec!["a\nb".to_string(), "c".to_string()];
        let b = vec!["a".to_string(), "b\nc".to_string()];
        assert_ne!(fingerprint(&a), fingerprint(&b));

        let joined = vec!["ab".to_string()];
        let split = vec!["a".to_string(), "b".to_string()];
        assert_ne!(fingerprint(&joined), fingerprint(&split));

        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
    }

    #[test]
    fn test_from_tags_has_no_categories() {
        let candidates = CandidateSet::from_tags(vec!["a".into(), "b".into()]);
        assert_eq!(candidates.len(), 2);
        assert!(candidates.category_of(0).is_none());
    }

    #[test]
    fn test_empty_vocabulary_is_empty_candidate_set() {
        let err = TagVocabulary::new(vec![]).unwrap_err();
        assert!(matches!(
            err,
            SeoTagError::Tagging(TaggingError::EmptyCandidateSet)
        ));
    }

    #[test]
    fn test_rejects_empty_category() {
        let empty: [&str; 0] = [];
        let err = TagVocabulary::new(vec![TagCategory::new("Food", empty)]).unwrap_err();
        assert!(err.to_string().contains("has no tags"));
    }

    #[test]
    fn test_rejects_blank_tag() {
        let err = TagVocabulary::new(vec![TagCategory::new("Food", ["pizza", "  "])]).unwrap_err();
        assert!(err.to_string().contains("empty tag at position 2"));
    }

    #[test]
    fn test_rejects_blank_category_name() {
        let err = TagVocabulary::new(vec![TagCategory::new("", ["pizza"])]).unwrap_err();
        assert!(err.to_string().contains("empty name"));
    }

    #[test]
    fn test_toml_roundtrip_keeps_order() {
        let vocab = two_category_vocab();
        let text = vocab.to_toml().unwrap();
        assert!(text.contains("[[category]]"));
        let parsed = TagVocabulary::from_toml_str(&text).unwrap();
        assert_eq!(parsed, vocab);
    }

    #[test]
    fn test_from_toml_str() {
        let vocab = TagVocabulary::from_toml_str(
            r#"
            [[category]]
            name = "Music"
            tags = ["guitar", "piano"]

            [[category]]
            name = "Food"
            tags = ["pizza"]
            "#,
        )
        .unwrap();
        assert_eq!(vocab.categories()[0].name(), "Music");
        assert_eq!(vocab.flatten(), vec!["guitar", "piano", "pizza"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.toml");
        std::fs::write(&path, two_category_vocab().to_toml().unwrap()).unwrap();
        let vocab = TagVocabulary::load(&path).unwrap();
        assert_eq!(vocab.flatten().len(), 4);
    }

    #[test]
    fn test_empty_toml_is_empty_candidate_set() {
        let err = TagVocabulary::from_toml_str("").unwrap_err();
        assert!(matches!(
            err,
            SeoTagError::Tagging(TaggingError::EmptyCandidateSet)
        ));
    }

    #[test]
    fn test_fingerprint_depends_on_order() {
        let a = fingerprint(&["x".to_string(), "y".to_string()]);
        let b = fingerprint(&["y".to_string(), "x".to_string()]);
        assert_ne!(a, b);
        assert_eq!(a, fingerprint(&["x".to_string(), "y".to_string()]));
    }
}
