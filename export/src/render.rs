//! Markdown rendering of a conversation.

/// A rendered message: role header, text and image embed lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBlock {
    /// Author role.
    pub role: String,

    /// Message text.
    pub text: String,

    /// Embed tokens or placeholder lines, placed after the text.
    pub embeds: Vec<String>,
}

impl MessageBlock {
    /// Create a block without embeds.
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
            embeds: Vec::new(),
        }
    }

    /// Add an embed line.
    pub fn with_embed(mut self, embed: impl Into<String>) -> Self {
        self.embeds.push(embed.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.embeds.is_empty()
    }
}

/// A conversation ready to be written as markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedNote {
    /// Note title.
    pub title: String,

    /// ISO-8601 creation time, empty if unknown.
    pub created: String,

    /// Conversation id.
    pub id: String,

    /// Model slug.
    pub model: String,

    /// Message blocks in order.
    pub blocks: Vec<MessageBlock>,
}

impl RenderedNote {
    /// Render to markdown with LF line endings and a single trailing newline.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("# {}", self.title), String::new()];

        let meta: Vec<String> = [
            ("Created", &self.created),
            ("ID", &self.id),
            ("Model", &self.model),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("**{label}:** {value}"))
        .collect();
        if !meta.is_empty() {
            lines.push(format!("  • {}", meta.join("  •  ")));
            lines.push(String::new());
        }

        for block in self.blocks.iter().filter(|b| !b.is_empty()) {
            let role = if block.role.is_empty() {
                "assistant"
            } else {
                &block.role
            };
            lines.push(format!("**{}**", role.to_uppercase()));
            lines.push(String::new());

            let text = block.text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
                lines.push(String::new());
            }
            for embed in &block.embeds {
                lines.push(embed.clone());
                lines.push(String::new());
            }
        }

        let out = lines.join("\n");
        let out = out.replace("\r\n", "\n").replace('\r', "\n");
        format!("{}\n", out.trim_end())
    }
}

/// Placeholder line for an image that could not be found.
pub fn missing_image_marker(label: &str) -> String {
    format!("> ⚠️ Missing image for {label}")
}

/// Placeholder line for an image that could not be copied.
pub fn copy_failed_marker(name: &str, error: &std::io::Error) -> String {
    format!("> ⚠️ Failed to copy image: {name} ({error})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_full_note() {
        let note = RenderedNote {
            title: "Trip".to_string(),
            created: "2024-05-01T10:00:00Z".to_string(),
            id: "abc".to_string(),
            model: String::new(),
            blocks: vec![
                MessageBlock::new("user", "  Where to?\r\nAnywhere  "),
                MessageBlock::new("system", "   "),
                MessageBlock::new("assistant", "").with_embed("![[_assets/map.png]]"),
            ],
        };

        assert_eq!(
            note.render(),
            "# Trip\n\n  • **Created:** 2024-05-01T10:00:00Z  •  **ID:** abc\n\n\
             **USER**\n\nWhere to?\nAnywhere\n\n\
             **ASSISTANT**\n\n![[_assets/map.png]]\n"
        );
    }

    #[test]
    fn test_render_without_metadata() {
        let note = RenderedNote {
            title: "Chat 3".to_string(),
            ..Default::default()
        };
        assert_eq!(note.render(), "# Chat 3\n");
    }
}
