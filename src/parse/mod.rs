//! Document text extraction
//!
//! This module handles:
//! - Content type detection from MIME types and file extensions
//! - Plain text decoding
//! - PDF text extraction (behind the `pdf` feature)

#[cfg(feature = "pdf")]
mod pdf;
#[cfg(test)]
pub(crate) mod testing;
mod text;

#[cfg(feature = "pdf")]
pub use pdf::*;
pub use text::*;

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;

/// Declared content type of an uploaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
    /// Anything else; carries the MIME type for the error message
    Unsupported(String),
}

impl DocumentKind {
    /// Detect kind from a MIME type
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        match essence.as_str() {
            "application/pdf" => DocumentKind::Pdf,
            "text/plain" => DocumentKind::Text,
            _ => DocumentKind::Unsupported(essence),
        }
    }

    /// Detect kind from a file extension
    pub fn from_extension(path: &Path) -> Self {
        match mime_guess::from_path(path).first() {
            Some(mime) => Self::from_mime(mime.essence_str()),
            None => DocumentKind::Unsupported(
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| format!(".{}", e))
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => f.write_str("pdf"),
            DocumentKind::Text => f.write_str("text"),
            DocumentKind::Unsupported(mime) => write!(f, "unsupported ({})", mime),
        }
    }
}

/// An uploaded document. Its identity is the file name.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, kind: DocumentKind, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes,
        }
    }

    /// Plain-text document from a string
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(name, DocumentKind::Text, content.into().into_bytes())
    }

    /// Read a document from disk, declaring its kind from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Extraction(format!("Invalid file name: {}", path.display())))?
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self::new(name, DocumentKind::from_extension(path), bytes))
    }
}

/// Extract the full text of a document according to its declared kind
pub fn extract_text(doc: &Document) -> Result<String> {
    match &doc.kind {
        DocumentKind::Text => decode_text(&doc.bytes),
        #[cfg(feature = "pdf")]
        DocumentKind::Pdf => extract_pdf_text(&doc.bytes),
        #[cfg(not(feature = "pdf"))]
        DocumentKind::Pdf => Err(Error::UnsupportedInput(format!(
            "{} (built without PDF support)",
            doc.name
        ))),
        DocumentKind::Unsupported(mime) => Err(Error::UnsupportedInput(format!(
            "{} ({})",
            doc.name, mime
        ))),
    }
}
