//! Resolution of image references to source files.
//!
//! Lookup order, first match wins:
//! 1. the file id is in the [`FileIndex`] and that file exists
//! 2. the reference names a file that exists
//! 3. a fuzzy scan of the source directory for names containing the file id

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::classify::ImageRef;
use crate::file_index::FileIndex;

/// Prefixes commonly put in front of file ids.
const ID_PREFIXES: &[&str] = &["file-", "file_"];

/// How an image was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedVia {
    /// Found through the file index.
    Index,
    /// Found by the filename on the reference.
    ExplicitName,
    /// Found by scanning the source directory.
    Fuzzy,
}

/// Outcome of resolving one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A source file was found.
    Found { path: PathBuf, via: ResolvedVia },

    /// Nothing matched; `label` identifies the reference in placeholders.
    Missing { label: String },
}

/// Maps image references to files in the source asset directory.
pub struct ImageResolver<'a> {
    source_dir: PathBuf,
    index: &'a FileIndex,
    /// Sorted filenames of the source directory, read once.
    listing: Vec<String>,
}

impl<'a> ImageResolver<'a> {
    /// Create a resolver over `source_dir`. A missing directory resolves
    /// nothing.
    pub fn new(source_dir: impl Into<PathBuf>, index: &'a FileIndex) -> Self {
        let source_dir = source_dir.into();
        let mut listing: Vec<String> = std::fs::read_dir(&source_dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
                    .filter_map(|entry| entry.file_name().into_string().ok())
                    .collect()
            })
            .unwrap_or_default();
        listing.sort();

        debug!(
            "Image source {} holds {} files",
            source_dir.display(),
            listing.len()
        );

        Self {
            source_dir,
            index,
            listing,
        }
    }

    /// The directory images are resolved from.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Resolve a reference. Never fails; unmatched references come back as
    /// [`Resolution::Missing`].
    pub fn resolve(&self, image: &ImageRef) -> Resolution {
        let file_id = image.file_id.as_deref().filter(|id| !id.is_empty());

        if let Some(path) = file_id
            .and_then(|id| self.index.get(id))
            .and_then(|name| self.existing(name))
        {
            return Resolution::Found {
                path,
                via: ResolvedVia::Index,
            };
        }

        if let Some(path) = image.filename.as_deref().and_then(|name| self.existing(name)) {
            return Resolution::Found {
                path,
                via: ResolvedVia::ExplicitName,
            };
        }

        if let Some(path) = file_id.and_then(|id| self.find_by_file_id(id)) {
            return Resolution::Found {
                path,
                via: ResolvedVia::Fuzzy,
            };
        }

        Resolution::Missing {
            label: image.label().to_string(),
        }
    }

    /// Fuzzy lookup of a file whose name contains a normalized form of
    /// `file_id`. The longest matching needle wins, ties go to the
    /// lexically first filename.
    pub fn find_by_file_id(&self, file_id: &str) -> Option<PathBuf> {
        let needles = id_needles(file_id);
        if needles.is_empty() {
            return None;
        }

        let mut best: Option<(usize, &str)> = None;
        for name in &self.listing {
            let lower = name.to_lowercase();
            let compact = strip_separators(&lower);
            let score = needles
                .iter()
                .filter(|needle| lower.contains(needle.as_str()) || compact.contains(needle.as_str()))
                .map(String::len)
                .max();
            let Some(score) = score else {
                continue;
            };
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, name.as_str()));
            }
        }

        best.map(|(_, name)| self.source_dir.join(name))
    }

    /// Path of `name` in the source directory if it is an existing file.
    /// Only the final path component of `name` is used.
    fn existing(&self, name: &str) -> Option<PathBuf> {
        let file_name = Path::new(name).file_name()?;
        let candidate = self.source_dir.join(file_name);
        candidate.is_file().then_some(candidate)
    }
}

fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != '-' && *c != '_').collect()
}

/// Normalized search needles for a file id.
fn id_needles(file_id: &str) -> Vec<String> {
    let lower = file_id.trim().to_lowercase();
    let unprefixed = ID_PREFIXES
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))
        .unwrap_or(&lower)
        .to_string();

    let mut needles = Vec::new();
    for needle in [
        lower.clone(),
        unprefixed.clone(),
        strip_separators(&lower),
        strip_separators(&unprefixed),
    ] {
        if !needle.is_empty() && !needles.contains(&needle) {
            needles.push(needle);
        }
    }
    needles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_index::FileEntry;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn source_with(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }
        dir
    }

    #[test]
    fn test_index_match_first() {
        let dir = source_with(&["indexed.png", "file-abc-guess.png"]);
        let entries = [FileEntry::new("file-abc", "indexed.png")];
        let index = FileIndex::from_entries(&entries);
        let resolver = ImageResolver::new(dir.path(), &index);

        let resolution = resolver.resolve(&ImageRef::from_file_id("file-abc"));
        assert_eq!(
            resolution,
            Resolution::Found {
                path: dir.path().join("indexed.png"),
                via: ResolvedVia::Index
            }
        );
    }

    #[test]
    fn test_explicit_name_when_index_file_missing() {
        let dir = source_with(&["named.jpg"]);
        let entries = [FileEntry::new("file-abc", "gone.png")];
        let index = FileIndex::from_entries(&entries);
        let resolver = ImageResolver::new(dir.path(), &index);

        let image = ImageRef::from_file_id("file-zzz").with_filename("../named.jpg");
        assert!(matches!(
            resolver.resolve(&image),
            Resolution::Found {
                via: ResolvedVia::ExplicitName,
                ..
            }
        ));
    }

    #[test]
    fn test_fuzzy_match_by_file_id() {
        let dir = source_with(&["unrelated.png", "File_XyZ987-photo.webp"]);
        let index = FileIndex::default();
        let resolver = ImageResolver::new(dir.path(), &index);

        assert_eq!(
            resolver.resolve(&ImageRef::from_file_id("file-XYZ987")),
            Resolution::Found {
                path: dir.path().join("File_XyZ987-photo.webp"),
                via: ResolvedVia::Fuzzy
            }
        );
    }

    #[test]
    fn test_fuzzy_prefers_longest_match_then_lexical() {
        let dir = source_with(&["b-abc123.png", "a-abc123.png", "file-abc123.png"]);
        let index = FileIndex::default();
        let resolver = ImageResolver::new(dir.path(), &index);

        assert_eq!(
            resolver.find_by_file_id("file-abc123"),
            Some(dir.path().join("file-abc123.png"))
        );
        assert_eq!(
            resolver.find_by_file_id("abc123"),
            Some(dir.path().join("a-abc123.png"))
        );
    }

    #[test]
    fn test_unresolvable_is_missing() {
        let dir = source_with(&["other.png"]);
        let index = FileIndex::default();
        let resolver = ImageResolver::new(dir.path(), &index);

        assert_eq!(
            resolver.resolve(&ImageRef::from_file_id("file-nope")),
            Resolution::Missing {
                label: "file-nope".to_string()
            }
        );
        assert_eq!(
            resolver.resolve(&ImageRef::default()),
            Resolution::Missing {
                label: "unknown-file".to_string()
            }
        );
    }

    #[test]
    fn test_missing_source_dir() {
        let index = FileIndex::default();
        let resolver = ImageResolver::new("/no/such/dir", &index);
        assert!(matches!(
            resolver.resolve(&ImageRef::from_file_id("file-1")),
            Resolution::Missing { .. }
        ));
    }
}
