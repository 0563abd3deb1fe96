//! PDF text extraction

use crate::error::{Error, Result};
use std::panic;
use tracing::debug;

/// Extract text from every page in order, each page followed by a newline.
///
/// A file that cannot be parsed at all is an extraction error; a page that
/// yields no text contributes an empty line.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed resources
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|payload| {
            Error::Extraction(format!("PDF parser aborted: {}", panic_message(&*payload)))
        })?
        .map_err(|e| Error::Extraction(format!("PDF parse error: {}", e)))?;

    debug!("Extracted {} PDF pages", pages.len());
    Ok(join_pages(pages))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown error"
    }
}

fn join_pages(pages: Vec<String>) -> String {
    let mut text = String::new();
    for page in pages {
        text.push_str(&page);
        text.push('\n');
    }
    text
}
