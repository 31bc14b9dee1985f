//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,

    /// Directory for derived data (cached label bank)
    pub cache_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.seotag/models"),
            cache_dir: PathBuf::from("~/.seotag/cache"),
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name; also the subdirectory of `model_dir` holding its files
    pub model: String,

    /// Square input size expected by the vision tower
    pub image_size: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "clip-vit-base-patch32".to_string(),
            image_size: 224,
        }
    }
}

/// Tagging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Number of tags to suggest per image
    pub top_k: usize,

    /// Temperature applied to cosine similarities before the softmax.
    /// CLIP ViT-B/32 learns exp(logit_scale) = 100.
    pub logit_scale: f32,

    /// Text sent to the text tower for each candidate; `{tag}` is replaced.
    pub prompt_template: String,

    /// Persist encoded candidate embeddings under `cache_dir`
    pub cache_label_bank: bool,

    /// Optional TOML vocabulary file; the built-in vocabulary is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<String>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            logit_scale: 100.0,
            prompt_template: "{tag}".to_string(),
            cache_label_bank: true,
            vocabulary: None,
        }
    }
}

impl TaggingConfig {
    /// Render the text prompt for one candidate tag.
    pub fn prompt_for(&self, tag: &str) -> String {
        self.prompt_template.replace("{tag}", tag)
    }
}

/// Resource limits to protect against problematic uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            max_image_dimension: 12000,
        }
    }
}

/// Upload store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory uploads are saved into
    pub upload_dir: String,

    /// File extensions accepted for upload
    pub allowed_extensions: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            upload_dir: "upload_images".to_string(),
            allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
        }
    }
}

impl StoreConfig {
    /// Whether a file name carries one of the allowed extensions (case-insensitive).
    pub fn accepts(&self, name: &str) -> bool {
        let Some(ext) = std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
        else {
            return false;
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("text", "json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
