//! docqa - question answering over your own documents
//!
//! This crate provides:
//! - Text extraction and sentence-aware chunking for PDF and plain text files
//! - Pluggable embedding backends (hosted OpenAI, local OpenAI-compatible, built-in)
//! - Vector storage in an embedded SQLite database or a Qdrant server
//! - Grounded answer generation over the retrieved passages

pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod generate;
pub mod meta;
pub mod models;
pub mod parse;
pub mod progress;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use session::Session;
