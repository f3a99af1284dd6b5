//! Classification of message content parts.
//!
//! Exports mix plain strings, text objects, image pointers and odd one-off
//! shapes inside a message's `parts`. Each part is resolved once into a
//! [`ContentPart`]; anything unrecognized is kept as text rather than dropped.

use serde_json::{Map, Value};

/// Type tags that mark a part as an image.
const IMAGE_TYPES: &[&str] = &[
    "image_file",
    "image",
    "image_asset",
    "image_url",
    "image_asset_pointer",
];

/// Keys whose presence marks a part as an image reference.
const IMAGE_KEYS: &[&str] = &["file_id", "asset_id", "asset_pointer", "filename", "name"];

/// An unresolved pointer to binary content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRef {
    /// File identifier, matched against the file index.
    pub file_id: Option<String>,

    /// Filename given directly on the reference.
    pub filename: Option<String>,

    /// Raw asset pointer (e.g. `file-service://file-abc`).
    pub asset_pointer: Option<String>,
}

impl ImageRef {
    /// Create a reference from a file id.
    pub fn from_file_id(file_id: impl Into<String>) -> Self {
        Self {
            file_id: Some(file_id.into()),
            ..Default::default()
        }
    }

    /// Set the explicit filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Build a reference from a JSON object.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let pointer = obj.get("asset_pointer");
        let asset_pointer = match pointer {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(inner)) => str_field(inner, &["asset_pointer", "url"]),
            _ => None,
        };

        let file_id = str_field(obj, &["file_id", "id", "asset_id"])
            .or_else(|| match pointer {
                Some(Value::Object(inner)) => str_field(inner, &["file_id"]),
                _ => None,
            })
            .or_else(|| asset_pointer.as_deref().and_then(pointer_file_id));

        Self {
            file_id,
            filename: str_field(obj, &["filename", "name"]),
            asset_pointer,
        }
    }

    /// Label used in placeholders when the image cannot be found.
    pub fn label(&self) -> &str {
        self.file_id.as_deref().unwrap_or("unknown-file")
    }
}

/// One classified content part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Text to render.
    Text(String),

    /// A reference to an image.
    Image(ImageRef),

    /// Unrecognized part, coerced to its string representation.
    Unknown(String),
}

/// Text and images extracted from one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedContent {
    /// Text parts joined by newlines.
    pub text: String,

    /// Image references in order of appearance.
    pub images: Vec<ImageRef>,
}

/// Classify a single content part.
pub fn classify_part(part: &Value) -> ContentPart {
    let obj = match part {
        Value::String(s) => return ContentPart::Text(s.clone()),
        Value::Object(obj) => obj,
        Value::Null => return ContentPart::Unknown(String::new()),
        other => return ContentPart::Unknown(other.to_string()),
    };

    let type_tag = str_field(obj, &["type", "content_type"]);

    if let Some(Value::String(text)) = obj.get("text") {
        return ContentPart::Text(text.clone());
    }
    if type_tag.as_deref() == Some("text") {
        return ContentPart::Text(String::new());
    }

    let image_typed = type_tag
        .as_deref()
        .is_some_and(|t| IMAGE_TYPES.contains(&t));
    if image_typed || IMAGE_KEYS.iter().any(|key| obj.contains_key(*key)) {
        return ContentPart::Image(ImageRef::from_object(obj));
    }

    ContentPart::Unknown(part.to_string())
}

/// Classify a message's `content` value.
///
/// Accepts a bare string, an object with `parts`, or an object with a `text`
/// field.
pub fn classify_content(content: &Value) -> ClassifiedContent {
    match content {
        Value::String(s) => ClassifiedContent {
            text: s.clone(),
            images: Vec::new(),
        },
        Value::Object(obj) => match obj.get("parts") {
            Some(Value::Array(parts)) => classify_parts(parts),
            _ => ClassifiedContent {
                text: str_field(obj, &["text"]).unwrap_or_default(),
                images: Vec::new(),
            },
        },
        _ => ClassifiedContent::default(),
    }
}

fn classify_parts(parts: &[Value]) -> ClassifiedContent {
    let mut texts = Vec::new();
    let mut images = Vec::new();

    for part in parts {
        match classify_part(part) {
            ContentPart::Text(text) | ContentPart::Unknown(text) => {
                if !text.is_empty() {
                    texts.push(text);
                }
            }
            ContentPart::Image(image) => images.push(image),
        }
    }

    ClassifiedContent {
        text: texts.join("\n"),
        images,
    }
}

/// Collect attachment references from `attachments` and
/// `metadata.attachments` of a message or mapping node.
pub fn collect_attachments(value: &Value) -> Vec<ImageRef> {
    let Value::Object(obj) = value else {
        return Vec::new();
    };

    let direct = obj.get("attachments");
    let nested = obj.get("metadata").and_then(|m| m.get("attachments"));

    [direct, nested]
        .into_iter()
        .flatten()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(Value::as_object)
        .map(ImageRef::from_object)
        .collect()
}

/// First non-empty string among `keys`.
pub(crate) fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// File id embedded in an asset pointer URI (`scheme://file-id`).
fn pointer_file_id(pointer: &str) -> Option<String> {
    pointer
        .split_once("://")
        .map(|(_, id)| id.trim_matches('/'))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_text_parts() {
        assert_eq!(classify_part(&json!("hi")), ContentPart::Text("hi".into()));
        assert_eq!(
            classify_part(&json!({"type": "text", "text": "yo"})),
            ContentPart::Text("yo".into())
        );
        assert_eq!(
            classify_part(&json!({"content_type": "audio_transcription", "text": "spoken"})),
            ContentPart::Text("spoken".into())
        );
    }

    #[test]
    fn test_image_parts() {
        let part = json!({
            "content_type": "image_asset_pointer",
            "asset_pointer": "file-service://file-AbC123",
            "width": 10
        });
        assert_eq!(
            classify_part(&part),
            ContentPart::Image(ImageRef {
                file_id: Some("file-AbC123".into()),
                filename: None,
                asset_pointer: Some("file-service://file-AbC123".into()),
            })
        );

        let named = json!({"name": "chart.png"});
        assert_eq!(
            classify_part(&named),
            ContentPart::Image(ImageRef::default().with_filename("chart.png"))
        );
    }

    #[test]
    fn test_unknown_parts_are_kept_as_text() {
        let part = json!({"weird": 1});
        assert_eq!(classify_part(&part), ContentPart::Unknown("{\"weird\":1}".into()));
        assert_eq!(classify_part(&json!(42)), ContentPart::Unknown("42".into()));
    }

    #[test]
    fn test_multimodal_content() {
        let content = json!({
            "content_type": "multimodal_text",
            "parts": [
                {"asset_pointer": {"file_id": "file-1"}},
                "look at this",
                "",
                {"odd": true}
            ]
        });
        let classified = classify_content(&content);
        assert_eq!(classified.text, "look at this\n{\"odd\":true}");
        assert_eq!(classified.images, vec![ImageRef::from_file_id("file-1")]);
    }

    #[test]
    fn test_content_shapes() {
        assert_eq!(classify_content(&json!("plain")).text, "plain");
        assert_eq!(classify_content(&json!({"text": "t"})).text, "t");
        assert_eq!(
            classify_content(&json!({"content_type": "text", "parts": ["a", "b"]})).text,
            "a\nb"
        );
        assert_eq!(classify_content(&json!(null)), ClassifiedContent::default());
    }

    #[test]
    fn test_collect_attachments_merges_metadata() {
        let message = json!({
            "attachments": [{"id": "file-a", "name": "a.png"}, "junk"],
            "metadata": {"attachments": [{"file_id": "file-b"}]}
        });
        let refs = collect_attachments(&message);
        assert_eq!(
            refs,
            vec![
                ImageRef::from_file_id("file-a").with_filename("a.png"),
                ImageRef::from_file_id("file-b"),
            ]
        );
    }
}
