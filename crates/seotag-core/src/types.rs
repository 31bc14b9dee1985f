//! Core data types produced by tagging an image.

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::path::PathBuf;

/// Probability distribution over candidates, index-aligned with them.
///
/// Values are non-negative and sum to 1 (within float tolerance).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVector(Vec<f32>);

impl ScoreVector {
    /// Turn raw similarity logits into a probability distribution.
    pub fn from_logits(logits: &[f32]) -> Self {
        Self(crate::math::softmax(logits))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl Deref for ScoreVector {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.0
    }
}

/// A suggested tag with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// The tag text (e.g., "beach", "golden hour")
    pub name: String,

    /// Softmax probability of this candidate among all candidates
    pub confidence: f32,

    /// Vocabulary category the tag came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Tag {
    /// Create a new tag with the given name and confidence.
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
            category: None,
        }
    }

    /// Create a new tag with category.
    pub fn with_category(
        name: impl Into<String>,
        confidence: f32,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            confidence,
            category: Some(category.into()),
        }
    }
}

/// Tagging result for one uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagReport {
    /// Name the image was uploaded under
    pub file_name: String,

    /// Where the upload was saved, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_path: Option<PathBuf>,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Detected format ("jpeg", "png", ...)
    pub format: String,

    /// Suggested tags, best first
    pub tags: Vec<Tag>,
}

impl TagReport {
    /// Just the tag names, best first.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}
