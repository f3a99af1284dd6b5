//! Filename and timestamp helpers.

use chrono::{DateTime, SecondsFormat};
use unicode_normalization::UnicodeNormalization;

/// Maximum length of a sanitized title in note filenames.
pub const TITLE_MAX_LEN: usize = 80;

/// Date prefix used when a conversation has no timestamp.
pub const UNKNOWN_DATE: &str = "0000-00-00";

/// Reduce `name` to a filesystem-friendly ASCII string of at most `max_len`
/// characters. Accented letters fold to their base letter (NFKD, then
/// non-ASCII dropped). Falls back to `untitled`.
pub fn safe_filename(name: &str, max_len: usize) -> String {
    let kept: String = name
        .nfkd()
        .filter(char::is_ascii)
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || "_-.()".contains(*c))
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "untitled".to_string();
    }
    collapsed
        .chars()
        .take(max_len)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// First `len` ASCII alphanumerics of `id`.
pub fn short_id(id: &str, len: usize) -> String {
    id.chars()
        .filter(char::is_ascii_alphanumeric)
        .take(len)
        .collect()
}

/// Convert a unix timestamp (seconds or milliseconds) to an ISO-8601 UTC
/// string.
pub fn iso_timestamp(ts: f64) -> Option<String> {
    if !ts.is_finite() || ts <= 0.0 {
        return None;
    }
    let secs = if ts > 1e12 { ts / 1000.0 } else { ts };
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole, nanos).map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// `YYYY-MM-DD` prefix of an ISO timestamp, or [`UNKNOWN_DATE`].
pub fn date_prefix(iso: &str) -> &str {
    iso.get(..10).unwrap_or(UNKNOWN_DATE)
}
