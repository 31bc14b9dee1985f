//! Zero-shot tag suggestion.
//!
//! Flattens a categorized vocabulary into candidates, scores them against an
//! image with CLIP, and selects the best `k`.

pub mod label_bank;
pub mod reference;
pub mod scorer;
pub mod selector;
pub mod text_encoder;
pub mod vocabulary;

pub use scorer::{ClipScorer, EmbeddingScorer};
pub use selector::{rank_top_k, select_top_k};
pub use vocabulary::{CandidateSet, TagCategory, TagVocabulary};
