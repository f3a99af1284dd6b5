//! Enrichment of a single note.
//!
//! A note moves through `Pending → Mapping → Reducing → Trimming →
//! Committed`. Every provider call can move it to `Failed` instead, in which
//! case the file on disk is left untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatlib_notes::{DEFAULT_MIN_FRACTION, Header, split_header, split_ranges};
use regex_lite::Regex;
use tracing::{debug, info};

use crate::config::EnrichConfig;
use crate::error::{EnrichError, Result};
use crate::prompt::{
    map_messages, max_words, parse_bullets, parse_reduce, reduce_messages, trim_messages,
    word_count,
};
use crate::provider::{ChatMessage, CompletionProvider};
use crate::retry::retry_call;

/// A note loaded for enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path of the note.
    pub path: PathBuf,

    /// Title derived from the filename.
    pub title: String,

    /// Date derived from the filename, when present.
    pub date: Option<String>,

    /// Everything after the existing header, decoded for prompts.
    pub body: String,

    /// Everything after the existing header, byte for byte.
    pub raw_body: Vec<u8>,
}

impl Document {
    /// Read a note from disk.
    ///
    /// Invalid UTF-8 in the body is replaced only in [`Document::body`];
    /// [`Document::raw_body`] keeps the original bytes.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read(path).await?;
        let text = String::from_utf8_lossy(&raw);
        let (header, body) = split_header(&text);
        let header = header.unwrap_or_default();
        if !raw.starts_with(header.as_bytes()) {
            return Err(EnrichError::InvalidEncoding(path.display().to_string()));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (date, title) = title_and_date(&file_name);

        Ok(Self {
            path: path.to_path_buf(),
            title,
            date,
            body: body.to_string(),
            raw_body: raw[header.len()..].to_vec(),
        })
    }

    /// Body chunks sent to the MAP calls: the leading `# ` heading is
    /// dropped, chunks are trimmed and empty chunks skipped.
    pub fn chunks(&self, chunk_chars: usize) -> Vec<String> {
        let text = without_title_heading(&self.body);
        split_ranges(text, chunk_chars, DEFAULT_MIN_FRACTION)
            .into_iter()
            .map(|range| text[range].trim())
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Per-note enrichment state.
#[derive(Debug)]
pub enum DocumentState {
    /// Not started.
    Pending,

    /// Collecting bullets; `next` indexes the next chunk to send.
    Mapping {
        chunks: Vec<String>,
        next: usize,
        bullets: Vec<String>,
    },

    /// All bullets collected.
    Reducing { chunks: usize, bullets: Vec<String> },

    /// Summary and tags parsed, word cap not yet enforced.
    Trimming {
        chunks: usize,
        bullets: usize,
        summary: String,
        tags: Vec<String>,
    },

    /// Header written.
    Committed(DocumentSummary),

    /// Gave up; the note was not modified.
    Failed(EnrichError),
}

/// What enriching one note produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Path of the note.
    pub path: PathBuf,

    /// MAP chunks sent.
    pub chunks: usize,

    /// Bullets collected.
    pub bullets: usize,

    /// Words in the final summary.
    pub words: usize,

    /// Tags written.
    pub tags: Vec<String>,
}

/// Summarizes notes and writes their header blocks.
#[derive(Clone)]
pub struct DocumentEnricher {
    provider: Arc<dyn CompletionProvider>,
    config: Arc<EnrichConfig>,
}

impl DocumentEnricher {
    /// Create an enricher.
    pub fn new(provider: Arc<dyn CompletionProvider>, config: Arc<EnrichConfig>) -> Self {
        Self { provider, config }
    }

    /// Enrich the note at `path`.
    pub async fn enrich(&self, path: &Path) -> Result<DocumentSummary> {
        let doc = Document::load(path).await?;
        let mut state = DocumentState::Pending;

        loop {
            state = match state {
                DocumentState::Committed(summary) => {
                    info!(
                        "Enriched {} (chunks={} bullets={} words={} tags={})",
                        path.display(),
                        summary.chunks,
                        summary.bullets,
                        summary.words,
                        summary.tags.len()
                    );
                    return Ok(summary);
                }
                DocumentState::Failed(err) => return Err(err),
                state => self.step(&doc, state).await,
            };
        }
    }

    /// Advance a non-terminal state by one transition.
    async fn step(&self, doc: &Document, state: DocumentState) -> DocumentState {
        match state {
            DocumentState::Pending => DocumentState::Mapping {
                chunks: doc.chunks(self.config.chunk_chars),
                next: 0,
                bullets: Vec::new(),
            },
            DocumentState::Mapping {
                chunks,
                next,
                mut bullets,
            } => {
                let Some(chunk) = chunks.get(next) else {
                    return DocumentState::Reducing {
                        chunks: chunks.len(),
                        bullets,
                    };
                };
                debug!("{}: mapping chunk {}/{}", doc.path.display(), next + 1, chunks.len());
                match self.call(map_messages(chunk)).await {
                    Ok(reply) => {
                        bullets.extend(parse_bullets(&reply));
                        DocumentState::Mapping {
                            chunks,
                            next: next + 1,
                            bullets,
                        }
                    }
                    Err(err) => DocumentState::Failed(err),
                }
            }
            DocumentState::Reducing { chunks, bullets } => {
                let cap = max_words(bullets.len());
                let namespace = self.config.tag_namespace.as_str();
                match self.call(reduce_messages(&bullets, cap, namespace)).await {
                    Ok(reply) => {
                        let (summary, tags) = parse_reduce(reply.trim(), namespace);
                        DocumentState::Trimming {
                            chunks,
                            bullets: bullets.len(),
                            summary,
                            tags,
                        }
                    }
                    Err(err) => DocumentState::Failed(err),
                }
            }
            DocumentState::Trimming {
                chunks,
                bullets,
                mut summary,
                tags,
            } => {
                let cap = max_words(bullets);
                if word_count(&summary) > cap {
                    debug!("{}: trimming summary to {cap} words", doc.path.display());
                    match self.call(trim_messages(&summary, cap)).await {
                        Ok(reply) => summary = reply.trim().to_string(),
                        Err(err) => return DocumentState::Failed(err),
                    }
                }
                match commit(doc, &summary, &tags).await {
                    Ok(()) => DocumentState::Committed(DocumentSummary {
                        path: doc.path.clone(),
                        chunks,
                        bullets,
                        words: word_count(&summary),
                        tags,
                    }),
                    Err(err) => DocumentState::Failed(err),
                }
            }
            terminal => terminal,
        }
    }

    async fn call(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let provider = &self.provider;
        let messages = &messages;
        retry_call(&self.config.retry, move || async move {
            provider.complete(messages).await
        })
        .await
        .into_result()
    }
}

/// Write the header in front of the original body bytes via a temp file and
/// rename.
async fn commit(doc: &Document, summary: &str, tags: &[String]) -> Result<()> {
    let mut header = Header::new(doc.title.as_str())
        .with_tags(tags.to_vec())
        .with_summary(summary);
    if let Some(date) = &doc.date {
        header = header.with_date(date.as_str());
    }

    let temp_path = doc.path.with_extension("md.tmp");
    let mut contents = header.render().into_bytes();
    contents.extend_from_slice(&doc.raw_body);
    tokio::fs::write(&temp_path, contents).await?;
    if let Err(err) = tokio::fs::rename(&temp_path, &doc.path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(err.into());
    }
    Ok(())
}

/// Date and title from a `YYYY-MM-DD - Title - <id>.md` filename (the id
/// part is optional). Other names give no date and the file stem as title.
pub fn title_and_date(file_name: &str) -> (Option<String>, String) {
    for pattern in [
        r"^(\d{4}-\d{2}-\d{2})\s*-\s*(.*?)\s*-(?:.*)\.md$",
        r"^(\d{4}-\d{2}-\d{2})\s*-\s*(.*)\.md$",
    ] {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        if let Some(caps) = re.captures(file_name) {
            let date = caps.get(1).map(|m| m.as_str().to_string());
            let title = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
            return (date, title);
        }
    }

    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (None, stem)
}

/// Drop a leading `# ` heading line and the whitespace after it.
fn without_title_heading(body: &str) -> &str {
    if !body.starts_with("# ") {
        return body;
    }
    match body.find('\n') {
        Some(end) => body[end..].trim_start(),
        None => body,
    }
}
