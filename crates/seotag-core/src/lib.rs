//! SeoTag Core - SEO tag suggestion from image content.
//!
//! SeoTag ranks a fixed, categorized vocabulary of tags against an image with
//! a CLIP joint image/text embedding model and returns the best few.
//!
//! # Architecture
//!
//! ```text
//! TagVocabulary → flatten → CandidateSet ─┐
//!                                         ├→ EmbeddingScorer → ScoreVector → select_top_k → tags
//! upload bytes → decode → DynamicImage ───┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use seotag_core::{tagging, Config, SeoTagger, TagVocabulary};
//!
//! fn main() -> seotag_core::Result<()> {
//!     let config = Config::load()?;
//!     let scorer = tagging::scorer::shared(&config)?;
//!     let tagger = SeoTagger::from_config(scorer, TagVocabulary::reference(), &config)?;
//!
//!     let bytes = std::fs::read("./beach.jpg")?;
//!     let report = tagger.suggest_bytes(&bytes, "beach.jpg")?;
//!     println!("Suggested Tags: {:?}", report.tag_names());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod tagger;
pub mod tagging;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, Result, SeoTagError, StoreError, TaggingError, TaggingResult};
pub use output::{OutputFormat, OutputWriter};
pub use store::ImageStore;
pub use tagger::SeoTagger;
pub use tagging::{
    select_top_k, CandidateSet, ClipScorer, EmbeddingScorer, TagCategory, TagVocabulary,
};
pub use types::{ScoreVector, Tag, TagReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load the vocabulary named in `config`, or the built-in one.
pub fn load_vocabulary(config: &Config) -> Result<TagVocabulary> {
    match config.vocabulary_path() {
        Some(path) => TagVocabulary::load(&path),
        None => Ok(TagVocabulary::reference()),
    }
}
