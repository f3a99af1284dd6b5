//! Conversations and their messages.

use serde_json::{Map, Value};

use crate::classify::{ImageRef, classify_content, collect_attachments, str_field};
use crate::file_index::FileEntry;
use crate::graph::MappingGraph;

/// One message of a conversation, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Author role (`user`, `assistant`, `system`, `tool`, ...).
    pub role: String,

    /// Message text.
    pub text: String,

    /// Creation time as a unix timestamp, when present.
    pub timestamp: Option<f64>,

    /// Images referenced by the message.
    pub images: Vec<ImageRef>,
}

impl Message {
    /// Create a text message.
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
            timestamp: None,
            images: Vec::new(),
        }
    }

    /// Attach an image reference.
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.images.push(image);
        self
    }

    /// Decode a message object. Inline images come first, then attachments.
    pub fn from_value(value: &Value, default_role: &str) -> Self {
        let role = value
            .get("author")
            .and_then(|a| a.get("role"))
            .and_then(Value::as_str)
            .or_else(|| value.get("role").and_then(Value::as_str))
            .filter(|r| !r.is_empty())
            .unwrap_or(default_role)
            .to_string();

        let content = classify_content(value.get("content").unwrap_or(&Value::Null));
        let mut images = content.images;
        images.extend(collect_attachments(value));

        Self {
            role,
            text: content.text,
            timestamp: value.get("create_time").and_then(Value::as_f64),
            images,
        }
    }
}

/// The two supported conversation shapes, resolved at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationBody {
    /// A flat `messages` list.
    Linear(Vec<Message>),

    /// A legacy `mapping` graph.
    Mapping(MappingGraph),

    /// Neither shape was present.
    Empty,
}

/// A single conversation from the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    /// Conversation id.
    pub id: String,

    /// Title, if the export carries one.
    pub title: Option<String>,

    /// Creation time as a unix timestamp (seconds or milliseconds).
    pub create_time: Option<f64>,

    /// Model slug.
    pub model: Option<String>,

    /// Message list or mapping graph.
    pub body: ConversationBody,

    /// File entries declared on the conversation.
    pub files: Vec<FileEntry>,
}

impl Conversation {
    /// Decode a conversation object.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let body = match (obj.get("messages"), obj.get("mapping")) {
            (Some(Value::Array(messages)), _) => ConversationBody::Linear(
                messages
                    .iter()
                    .map(|m| Message::from_value(m, "assistant"))
                    .collect(),
            ),
            (_, Some(Value::Object(mapping))) if !mapping.is_empty() => {
                ConversationBody::Mapping(MappingGraph::from_object(mapping))
            }
            _ => ConversationBody::Empty,
        };

        Self {
            id: str_field(obj, &["id", "conversation_id"]).unwrap_or_default(),
            title: str_field(obj, &["title"]),
            create_time: obj.get("create_time").and_then(Value::as_f64),
            model: str_field(obj, &["model", "default_model_slug"]),
            body,
            files: FileEntry::collect(obj),
        }
    }

    /// Ordered messages regardless of the stored shape.
    pub fn messages(&self) -> Vec<Message> {
        match &self.body {
            ConversationBody::Linear(messages) => messages.clone(),
            ConversationBody::Mapping(graph) => graph.messages(),
            ConversationBody::Empty => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn conversation(value: Value) -> Conversation {
        Conversation::from_object(value.as_object().unwrap())
    }

    #[test]
    fn test_linear_messages() {
        let conv = conversation(json!({
            "id": "conv-1",
            "title": "Hello",
            "create_time": 1700000000.5,
            "default_model_slug": "gpt-4o",
            "messages": [
                {"author": {"role": "user"}, "content": "hi", "create_time": 1.0},
                {"role": "assistant", "content": {"content_type": "text", "parts": ["hello", "there"]}},
                {"content": {"text": "fallback"}, "attachments": [{"file_id": "file-x"}]}
            ]
        }));

        assert_eq!(conv.model.as_deref(), Some("gpt-4o"));
        let messages = conv.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].timestamp, Some(1.0));
        assert_eq!(messages[1].text, "hello\nthere");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[2].text, "fallback");
        assert_eq!(messages[2].images, vec![ImageRef::from_file_id("file-x")]);
    }

    #[test]
    fn test_mapping_shape() {
        let conv = conversation(json!({
            "id": "c",
            "mapping": {
                "r": {"message": null, "parent": null, "children": ["m"]},
                "m": {"message": {"author": {"role": "user"}, "content": {"content_type": "text", "parts": ["q"]}}, "parent": "r", "children": []}
            }
        }));
        assert!(matches!(conv.body, ConversationBody::Mapping(_)));
        assert_eq!(conv.messages(), vec![Message::new("user", "q")]);
    }

    #[test]
    fn test_missing_body_is_empty() {
        let conv = conversation(json!({"id": "c", "mapping": {}}));
        assert_eq!(conv.body, ConversationBody::Empty);
        assert!(conv.messages().is_empty());
    }
}
