//! Command handlers for the `seotag` binary.

pub mod config;
pub mod delete;
pub mod models;
pub mod tag;
pub mod vocabulary;
