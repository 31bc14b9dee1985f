//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.image_size must be > 0".into(),
            ));
        }
        if self.tagging.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "tagging.top_k must be > 0".into(),
            ));
        }
        if !self.tagging.logit_scale.is_finite() || self.tagging.logit_scale <= 0.0 {
            return Err(ConfigError::ValidationError(
                "tagging.logit_scale must be a positive finite number".into(),
            ));
        }
        if !self.tagging.prompt_template.contains("{tag}") {
            return Err(ConfigError::ValidationError(
                "tagging.prompt_template must contain {tag}".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.store.upload_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.upload_dir must not be empty".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be one of text, json, jsonl (got {:?})",
                self.output.format
            )));
        }
        Ok(())
    }
}
