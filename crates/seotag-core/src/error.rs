//! Error types for SeoTag.
//!
//! Tagging failures are kept as distinct variants so the presentation layer can
//! decide what to tell the user ("model failed to load" vs "please upload a
//! valid image") without string matching.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for SeoTag operations.
#[derive(Error, Debug)]
pub enum SeoTagError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scoring and selection errors
    #[error("Tagging error: {0}")]
    Tagging(#[from] TaggingError),

    /// Upload store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors from the scoring core: vocabulary, scorer and selector.
#[derive(Error, Debug)]
pub enum TaggingError {
    /// The embedding model or tokenizer could not be loaded. Fatal at startup.
    #[error("Model unavailable at {path}: {message}")]
    ModelUnavailable { path: PathBuf, message: String },

    /// The uploaded image could not be decoded or resized.
    #[error("Invalid image {name}: {message}")]
    InvalidImage { name: String, message: String },

    /// No candidate tags to score against.
    #[error("Candidate set is empty")]
    EmptyCandidateSet,

    /// A candidate tag string is blank.
    #[error("Candidate tag at index {index} is empty")]
    EmptyCandidate { index: usize },

    /// Scores and candidates are not index-aligned.
    #[error("Score vector has {scores} entries but there are {candidates} candidates")]
    ScoreLengthMismatch { scores: usize, candidates: usize },

    /// `k` must be at least 1.
    #[error("top-k must be at least 1")]
    InvalidTopK,

    /// ONNX Runtime failed after the model was loaded.
    #[error("Inference failed: {message}")]
    Inference { message: String },
}

impl TaggingError {
    /// Shorthand for an `InvalidImage` error.
    pub fn invalid_image(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidImage {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether a caller may retry with a different input.
    ///
    /// Only `InvalidImage` is recoverable per request; everything else is a
    /// startup or configuration problem.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidImage { .. })
    }
}

/// Upload store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The file to delete does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Any other filesystem failure
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The upload name has no usable file-name component
    #[error("Invalid upload name: {0:?}")]
    InvalidName(String),
}

/// Convenience type alias for SeoTag results.
pub type Result<T> = std::result::Result<T, SeoTagError>;

/// Convenience type alias for tagging-specific results.
pub type TaggingResult<T> = std::result::Result<T, TaggingError>;
