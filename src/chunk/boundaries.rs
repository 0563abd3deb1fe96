//! Sentence boundary detection for chunking

/// Character that ends a sentence for chunking purposes
pub const SENTENCE_TERMINATOR: char = '.';

/// Position just past the last sentence terminator in `window`, if any.
///
/// Positions are character offsets relative to the start of the window.
pub fn last_sentence_end(window: &[char]) -> Option<usize> {
    window
        .iter()
        .rposition(|&c| c == SENTENCE_TERMINATOR)
        .map(|i| i + 1)
}
