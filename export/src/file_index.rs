//! Index of file ids to filenames.
//!
//! Built once per run from the archive-level and per-conversation `files` /
//! `assets` arrays. There is no way to modify an index after it is built.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::archive::Archive;
use crate::classify::str_field;

/// Keys that hold file arrays.
const FILE_ARRAY_KEYS: &[&str] = &["files", "assets"];

/// A declared file: id and stored filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File id.
    pub id: String,

    /// Filename in the source asset directory.
    pub name: String,
}

impl FileEntry {
    /// Create an entry.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Decode one entry; both an id and a name are required.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: str_field(obj, &["id", "file_id", "asset_id"])?,
            name: str_field(obj, &["name", "filename"])?,
        })
    }

    /// Entries from the `files` and `assets` arrays of an object.
    pub fn collect(obj: &Map<String, Value>) -> Vec<Self> {
        FILE_ARRAY_KEYS
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_array))
            .flatten()
            .filter_map(Self::from_value)
            .collect()
    }
}

/// Immutable `file_id -> filename` lookup.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    entries: HashMap<String, String>,
}

impl FileIndex {
    /// Build the index for an archive. Conversation entries override
    /// archive-level entries with the same id.
    pub fn build(archive: &Archive) -> Self {
        Self::from_entries(
            archive
                .files
                .iter()
                .chain(archive.conversations.iter().flat_map(|c| c.files.iter())),
        )
    }

    /// Build an index from entries; later entries win.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a FileEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.id.clone(), e.name.clone()))
                .collect(),
        }
    }

    /// Filename for a file id.
    pub fn get(&self, file_id: &str) -> Option<&str> {
        self.entries.get(file_id).map(String::as_str)
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
