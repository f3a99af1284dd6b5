//! Header blocks at the top of a note.
//!
//! A header is a `---` delimited block that carries the regenerable metadata
//! of a note (title, date, tags, summary). Everything after it is the body.
//! The body is the only part that counts when comparing two notes.

use serde::{Deserialize, Serialize};

/// Maximum number of tags kept on a header.
pub const MAX_TAGS: usize = 15;

const DELIMITER: &str = "---\n";
const CLOSING: &str = "\n---\n";

/// Only this many leading bytes are inspected by [`has_header`].
const SNIFF_BYTES: usize = 4096;

/// Characters that force a scalar to be quoted.
const SPECIAL_CHARS: &[char] = &[
    ':', '#', '-', '?', '[', ']', '{', '}', ',', '&', '*', '!', '|', '>', '<', '=', '\'', '"',
    '%', '@', '`',
];

/// Structured metadata written at the top of a library note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Note title.
    pub title: String,

    /// ISO date (`YYYY-MM-DD`) the conversation started, when known.
    pub date: Option<String>,

    /// Namespaced lowercase tags.
    pub tags: Vec<String>,

    /// One paragraph summary of the note.
    pub summary: String,
}

impl Header {
    /// Create a header with a title and no other fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        let date = date.into();
        self.date = (!date.is_empty()).then_some(date);
        self
    }

    /// Set the tags (not normalized here).
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Render the header block, including the blank line that separates it
    /// from the body.
    pub fn render(&self) -> String {
        let mut out = vec![DELIMITER.trim_end().to_string()];
        out.push(format!("title: {}", escape_scalar(&self.title)));
        if let Some(date) = &self.date {
            out.push(format!("date: {}", escape_scalar(date)));
        }
        out.push("tags:".to_string());
        for tag in self.tags.iter().take(MAX_TAGS) {
            out.push(format!("  - {}", escape_scalar(tag)));
        }
        out.push(format!("summary: {}", folded_block(&self.summary)));
        out.push(DELIMITER.trim_end().to_string());
        out.push(String::new());
        out.push(String::new());
        out.join("\n")
    }

    /// Render the header in front of an untouched body.
    pub fn prepend_to(&self, body: &str) -> String {
        let mut text = self.render();
        text.push_str(body);
        text
    }
}

/// Split a note into its header block (if any) and its body.
///
/// The header block includes its closing delimiter and at most one
/// following blank line.
pub fn split_header(text: &str) -> (Option<&str>, &str) {
    match header_len(text) {
        Some(len) => (Some(&text[..len]), &text[len..]),
        None => (None, text),
    }
}

/// Return the note without its header block.
pub fn strip_header(text: &str) -> &str {
    split_header(text).1
}

/// Whether the note starts with a header block.
pub fn has_header(text: &str) -> bool {
    let mut end = text.len().min(SNIFF_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    header_len(&text[..end]).is_some()
}

/// Convert CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// The form of a note used for duplicate detection: LF line endings, no
/// header, no surrounding whitespace.
pub fn comparable_body(text: &str) -> String {
    let normalized = normalize_line_endings(text);
    strip_header(&normalized).trim().to_string()
}

/// Normalize tags into lowercase `namespace/tag` form, deduplicated in order
/// and capped at [`MAX_TAGS`].
pub fn normalize_tags<I, S>(tags: I, namespace: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = format!("{namespace}/");
    let mut out: Vec<String> = Vec::new();

    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        let bare = tag.trim_start_matches(['#', '/', ' ']).replace(' ', "-");
        if bare.is_empty() {
            continue;
        }
        let tag = if bare.starts_with(&prefix) {
            bare
        } else {
            format!("{prefix}{bare}")
        };
        if !out.contains(&tag) {
            out.push(tag);
        }
        if out.len() >= MAX_TAGS {
            break;
        }
    }

    out
}

fn header_len(text: &str) -> Option<usize> {
    if !text.starts_with(DELIMITER) {
        return None;
    }
    let search_from = DELIMITER.len();
    let close = text[search_from..].find(CLOSING)?;
    let mut end = search_from + close + CLOSING.len();
    if text[end..].starts_with('\n') {
        end += 1;
    }
    Some(end)
}

fn escape_scalar(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.contains(SPECIAL_CHARS)
        || value.trim() != value
        || value.chars().any(char::is_whitespace);
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

fn folded_block(value: &str) -> String {
    let normalized = normalize_line_endings(value);
    let lines: Vec<String> = normalized
        .trim()
        .split('\n')
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                "  ".to_string()
            } else {
                format!("  {line}")
            }
        })
        .collect();
    format!(">\n{}", lines.join("\n"))
}
