//! Upload handling ahead of tagging.
//!
//! - **validate**: size and magic-byte checks on raw bytes
//! - **decode**: format detection and decoding into a `DynamicImage`

pub mod decode;
pub mod validate;

pub use decode::{DecodedImage, ImageDecoder};
pub use validate::Validator;
