//! Splitting long notes into navigable parts.

use chatlib_notes::{DEFAULT_MIN_FRACTION, split_ranges};

/// Marker line that opens a navigation footer.
pub const NAV_MARKER: &str = "%% chatlib-nav %%";

/// One file of a (possibly split) note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePart {
    /// File base name without extension.
    pub name: String,

    /// Slice of the rendered note.
    pub body: String,

    /// Navigation footer, empty for unsplit notes.
    pub footer: String,
}

impl NotePart {
    /// Full file contents.
    pub fn contents(&self) -> String {
        format!("{}{}", self.body, self.footer)
    }

    /// Filename with the `.md` extension.
    pub fn file_name(&self) -> String {
        format!("{}.md", self.name)
    }
}

/// Split a rendered note into parts of at most `limit` characters (plus
/// footer). A `limit` of 0 or a short note yields a single part.
pub fn split_note(text: &str, base_name: &str, limit: usize) -> Vec<NotePart> {
    if limit == 0 || text.chars().count() <= limit {
        return vec![NotePart {
            name: base_name.to_string(),
            body: text.to_string(),
            footer: String::new(),
        }];
    }

    let ranges = split_ranges(text, limit, DEFAULT_MIN_FRACTION);
    let total = ranges.len();
    let names: Vec<String> = (1..=total)
        .map(|n| format!("{base_name} (part {n})"))
        .collect();

    ranges
        .into_iter()
        .enumerate()
        .map(|(i, range)| NotePart {
            name: names[i].clone(),
            body: text[range].to_string(),
            footer: nav_footer(
                i + 1,
                total,
                i.checked_sub(1).map(|p| names[p].as_str()),
                names.get(i + 1).map(String::as_str),
            ),
        })
        .collect()
}

/// Remove a trailing navigation footer, if any.
pub fn strip_footer(text: &str) -> &str {
    let opener = format!("\n\n{NAV_MARKER}\n");
    match text.rfind(&opener) {
        Some(pos) => &text[..pos],
        None => text,
    }
}

fn nav_footer(part: usize, total: usize, prev: Option<&str>, next: Option<&str>) -> String {
    let mut segments = vec![format!("_Part {part} of {total}_")];
    if let Some(prev) = prev {
        segments.push(format!("_Prev: [[{prev}]]_"));
    }
    if let Some(next) = next {
        segments.push(format!("_Next: [[{next}]]_"));
    }
    format!("\n\n{NAV_MARKER}\n{}\n", segments.join("  •  "))
}
