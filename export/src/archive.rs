//! Decoding of the exported archive.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::conversation::Conversation;
use crate::error::{ExportError, Result};
use crate::file_index::FileEntry;

/// A decoded chat archive.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    /// Conversations in archive order.
    pub conversations: Vec<Conversation>,

    /// Archive-level file entries.
    pub files: Vec<FileEntry>,
}

impl Archive {
    /// Read and decode an archive file.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ExportError::ArchiveNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Decode archive JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    /// Decode an archive value: either a list of conversations, or an object
    /// with a `conversations` (or `items`) list.
    pub fn from_value(value: Value) -> Result<Self> {
        let (list, files) = match &value {
            Value::Array(list) => (list.as_slice(), Vec::new()),
            Value::Object(obj) => {
                let list = obj
                    .get("conversations")
                    .or_else(|| obj.get("items"))
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                (list, FileEntry::collect(obj))
            }
            other => {
                return Err(ExportError::MalformedArchive(format!(
                    "expected a list or an object at the top level, found {}",
                    json_kind(other)
                )));
            }
        };

        let mut conversations = Vec::with_capacity(list.len());
        for (position, item) in list.iter().enumerate() {
            match item.as_object() {
                Some(obj) => conversations.push(Conversation::from_object(obj)),
                None => warn!("Skipping conversation #{}: not an object", position + 1),
            }
        }

        debug!(
            "Decoded archive with {} conversations and {} file entries",
            conversations.len(),
            files.len()
        );

        Ok(Self {
            conversations,
            files,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_top_level_list() {
        let archive = Archive::from_value(json!([{"id": "a"}, 5, {"id": "b"}])).unwrap();
        let ids: Vec<&str> = archive.conversations.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_items_key() {
        let archive = Archive::from_value(json!({"items": [{"id": "x"}]})).unwrap();
        assert_eq!(archive.conversations.len(), 1);

        let empty = Archive::from_value(json!({"other": 1})).unwrap();
        assert!(empty.conversations.is_empty());
    }

    #[test]
    fn test_malformed_top_level() {
        let err = Archive::from_value(json!("nope")).unwrap_err();
        assert!(matches!(err, ExportError::MalformedArchive(_)));
        assert!(matches!(
            Archive::from_json("{not json").unwrap_err(),
            ExportError::Serialization(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Archive::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ExportError::ArchiveNotFound(_)));
    }
}
