//! Size-bounded text splitting on paragraph boundaries.
//!
//! Text is cut into windows of at most `limit` characters. Inside each window
//! the last blank-line boundary (`\n\n`) is preferred, as long as it falls in
//! the tail of the window; otherwise the window is hard cut. The returned
//! ranges are contiguous and cover the whole input, so joining the slices
//! reproduces the text exactly.

use std::ops::Range;

/// Default share of a window that must precede a paragraph cut.
pub const DEFAULT_MIN_FRACTION: f32 = 0.6;

const PARAGRAPH_BREAK: &str = "\n\n";

/// Split `text` into contiguous byte ranges of at most `limit` characters.
///
/// A `limit` of zero disables splitting. Ranges always land on char
/// boundaries.
pub fn split_ranges(text: &str, limit: usize, min_fraction: f32) -> Vec<Range<usize>> {
    if limit == 0 || text.is_empty() {
        return vec![0..text.len()];
    }

    let min_chars = (limit as f32 * min_fraction.clamp(0.0, 1.0)) as usize;
    let mut ranges = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let rest = &text[start..];
        let window_end = start + byte_offset(rest, limit);
        if window_end >= text.len() {
            ranges.push(start..text.len());
            break;
        }

        let min_cut = start + byte_offset(rest, min_chars);
        let cut = match text[start..window_end].rfind(PARAGRAPH_BREAK) {
            Some(k) if start + k > min_cut => start + k,
            _ => window_end,
        };

        ranges.push(start..cut);
        start = cut;
    }

    ranges
}

/// Byte offset of the `chars`-th character of `s`, or `s.len()` past the end.
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map_or(s.len(), |(offset, _)| offset)
}
