//! Prompts for the MAP, REDUCE and TRIM calls and parsing of their replies.

use chatlib_notes::normalize_tags;
use regex_lite::Regex;

use crate::provider::ChatMessage;

/// Bullets kept from one MAP reply.
pub const MAX_BULLETS_PER_CHUNK: usize = 20;

/// Bullets sent to the REDUCE call.
pub const MAX_REDUCE_BULLETS: usize = 2000;

/// Bullet count up to which the short word cap applies.
const SHORT_SUMMARY_BULLETS: usize = 25;

const SHORT_SUMMARY_WORDS: usize = 150;
const LONG_SUMMARY_WORDS: usize = 250;

const MAP_SYSTEM: &str = "Reply with terse bullet lines only, one idea per line. No numbering, no JSON.";

const MAP_TEMPLATE: &str = r#"Pull 8-20 terse bullets out of this part of a chat, one fact, decision or topic per line.

Rules:
- Keep every line short and about a single idea.
- Plain lines only: no prose, no numbering, no markdown bullets.
- Cover every distinct topic, decision, number and step.
- Leave out small talk and meta discussion.

TEXT:
"""{chunk}""""#;

const REDUCE_SYSTEM: &str = "Follow the requested format exactly. Add no other sections.";

const REDUCE_TEMPLATE: &str = r#"Below are bullet lines covering a whole conversation, all parts combined.

Answer in exactly this plain-text layout, with nothing before or after it:
SUMMARY:
<a single paragraph naming EVERY distinct topic once; at most {max_words} words; no lists>

TAGS:
{ns}/tag1
{ns}/tag2
...
(10-15 tags, each starting with "{ns}/", lowercase, short and easy to search)

BULLETS:
{bullets}
"#;

const TRIM_SYSTEM: &str = "You are a concise editor.";

const TRIM_TEMPLATE: &str = r#"Cut the summary below to at most {max_words} words while keeping every distinct topic.
Reply with the revised paragraph only, without labels.

Summary:
"""{summary}""""#;

/// Messages for the MAP call on one chunk.
pub fn map_messages(chunk: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(MAP_SYSTEM),
        ChatMessage::user(MAP_TEMPLATE.replace("{chunk}", chunk)),
    ]
}

/// Messages for the REDUCE call over all bullets.
pub fn reduce_messages(bullets: &[String], max_words: usize, namespace: &str) -> Vec<ChatMessage> {
    let bullets = bullets
        .iter()
        .take(MAX_REDUCE_BULLETS)
        .map(|b| format!("- {b}"))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = REDUCE_TEMPLATE
        .replace("{max_words}", &max_words.to_string())
        .replace("{ns}", namespace)
        .replace("{bullets}", &bullets);
    vec![ChatMessage::system(REDUCE_SYSTEM), ChatMessage::user(prompt)]
}

/// Messages for the TRIM call.
pub fn trim_messages(summary: &str, max_words: usize) -> Vec<ChatMessage> {
    let prompt = TRIM_TEMPLATE
        .replace("{max_words}", &max_words.to_string())
        .replace("{summary}", summary);
    vec![ChatMessage::system(TRIM_SYSTEM), ChatMessage::user(prompt)]
}

/// Clean bullet lines out of a MAP reply.
pub fn parse_bullets(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.trim_start_matches(|c: char| "-*.)(".contains(c) || c.is_ascii_digit())
                .trim()
                .trim_matches(['-', '•', ' '])
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .take(MAX_BULLETS_PER_CHUNK)
        .collect()
}

/// Split a REDUCE reply into summary and normalized tags.
///
/// Tries `SUMMARY: … <blank line> TAGS:` first, then a split at the first
/// `TAGS:`, and otherwise treats the whole reply as the summary.
pub fn parse_reduce(reply: &str, namespace: &str) -> (String, Vec<String>) {
    let text = reply.replace("\r\n", "\n").replace('\r', "\n");

    let structured = Regex::new(r"(?is)SUMMARY:\s*(.+?)\n\s*\nTAGS:\s*")
        .ok()
        .and_then(|re| re.captures(&text))
        .and_then(|caps| Some((caps.get(1)?, caps.get(0)?)));

    let (summary, tail) = match structured {
        Some((summary, whole)) => (summary.as_str().trim().to_string(), &text[whole.end()..]),
        None => match Regex::new(r"(?i)TAGS:").ok().and_then(|re| re.find(&text)) {
            Some(tags) => (
                strip_summary_label(&text[..tags.start()]),
                text[tags.end()..].trim(),
            ),
            None => (text.trim().to_string(), ""),
        },
    };

    (summary, parse_tags(tail, namespace))
}

/// Namespaced tags found on the lines of a tag section.
pub fn parse_tags(section: &str, namespace: &str) -> Vec<String> {
    let pattern = format!(r"({}/[A-Za-z0-9\-_/]+)", regex_lite::escape(namespace));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    let found: Vec<String> = section
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '•', ' ']))
        .filter_map(|line| re.find(line))
        .map(|m| m.as_str().to_lowercase())
        .collect();
    normalize_tags(found, namespace)
}

/// Word cap for a summary built from `bullets` bullets.
pub fn max_words(bullets: usize) -> usize {
    if bullets <= SHORT_SUMMARY_BULLETS {
        SHORT_SUMMARY_WORDS
    } else {
        LONG_SUMMARY_WORDS
    }
}

/// Number of runs of word characters.
pub fn word_count(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .count()
}

fn strip_summary_label(text: &str) -> String {
    match Regex::new(r"(?i)SUMMARY:") {
        Ok(re) => re.replace_all(text, "").trim().to_string(),
        Err(_) => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_bullets_strips_markers() {
        let reply = "- first\n\n* second\n1. third\n  • fourth  \n(a) fifth\n---\n";
        assert_eq!(
            parse_bullets(reply),
            vec!["first", "second", "third", "fourth", "a) fifth"]
        );

        let many: String = (0..30).map(|i| format!("- item{i}\n")).collect();
        assert_eq!(parse_bullets(&many).len(), MAX_BULLETS_PER_CHUNK);
    }

    #[test]
    fn test_parse_reduce_structured() {
        let reply = "SUMMARY:\nWe planned a trip.\nIt went well.\r\n\r\nTAGS:\n- misc/travel\nmisc/Planning\nnot a tag\n#misc/travel\n";
        let (summary, tags) = parse_reduce(reply, "misc");
        assert_eq!(summary, "We planned a trip.\nIt went well.");
        assert_eq!(tags, vec!["misc/travel", "misc/planning"]);
    }

    #[test]
    fn test_parse_reduce_without_blank_line() {
        let (summary, tags) = parse_reduce("summary: Short one.\ntags: misc/a, misc/b", "misc");
        assert_eq!(summary, "Short one.");
        assert_eq!(tags, vec!["misc/a"]);
    }

    #[test]
    fn test_parse_reduce_without_tags() {
        let (summary, tags) = parse_reduce("  Just a paragraph.  ", "misc");
        assert_eq!(summary, "Just a paragraph.");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_reduce_prompt_caps_bullets() {
        let bullets: Vec<String> = (0..2500).map(|i| format!("b{i}")).collect();
        let messages = reduce_messages(&bullets, 150, "misc");
        let prompt = &messages[1].content;
        assert!(prompt.contains("- b1999\n"));
        assert!(!prompt.contains("- b2000"));
        assert!(prompt.contains("at most 150 words"));
        assert!(prompt.contains("misc/tag1"));
    }

    #[test]
    fn test_word_cap_and_count() {
        assert_eq!(max_words(25), 150);
        assert_eq!(max_words(26), 250);
        assert_eq!(word_count("Hello, world! it's a_b 42"), 6);
        assert_eq!(word_count(""), 0);
    }
}
