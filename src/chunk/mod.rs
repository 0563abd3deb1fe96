//! Text chunking with sentence awareness
//!
//! This module splits extracted document text into overlapping passages:
//! - Consecutive chunks share `overlap` characters
//! - Chunks end right after the last period in their window when one exists
//! - Every step makes forward progress, whatever the size/overlap pair
//!
//! All positions are character offsets, never byte offsets, so multi-byte
//! text is never split inside a code point.

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;
use crate::error::{Error, Result};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to every stored chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Name of the document the chunk came from
    pub source: String,
}

/// A passage of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Fresh unique identifier
    pub id: Uuid,

    /// The passage text
    pub text: String,

    pub metadata: ChunkMetadata,

    /// Character start position in the source text
    pub char_start: usize,

    /// Character end position (exclusive) in the source text
    pub char_end: usize,

    /// Chunk index (0-based)
    pub index: usize,
}

/// Splits text into overlapping chunks
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::Config("chunk size must be positive".to_string()));
        }
        Ok(Self { size, overlap })
    }

    pub fn from_config(config: &ChunkConfig) -> Result<Self> {
        Self::new(config.size, config.overlap)
    }

    /// Split `text` into chunks tagged with `source`
    pub fn chunk(&self, text: &str, source: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        // Capping the overlap below the size keeps every window reaching
        // at least one character past `start`.
        let overlap = self.overlap.min(self.size - 1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let window_start = start.saturating_sub(overlap);
            let window_end = window_start + self.size;

            let mut end = window_end.min(len);
            if window_end < len {
                // A cut inside the overlap region would not advance
                if let Some(cut) = last_sentence_end(&chars[window_start..end]) {
                    let candidate = window_start + cut;
                    if candidate > start {
                        end = candidate;
                    }
                }
            }

            chunks.push(Chunk {
                id: Uuid::new_v4(),
                text: chars[window_start..end].iter().collect(),
                metadata: ChunkMetadata {
                    source: source.to_string(),
                },
                char_start: window_start,
                char_end: end,
                index: chunks.len(),
            });

            start = end;
        }

        chunks
    }
}

/// Chunk text with the given size and overlap
pub fn chunk_text(text: &str, source: &str, size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(Chunker::new(size, overlap)?.chunk(text, source))
}

/// Compute a stable hash for document content
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hasher.finalize().to_hex().to_string()
}
