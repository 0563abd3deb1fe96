//! Plain text decoding

use crate::error::{Error, Result};

/// Decode UTF-8 bytes verbatim (no whitespace normalization)
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        Error::Extraction(format!(
            "File is not valid UTF-8 (invalid byte at offset {})",
            e.utf8_error().valid_up_to()
        ))
    })
}
