//! # Enrichment
//!
//! Adds a summary and tags to library notes with a chat completion model:
//!
//! - **Map**: each note body is cut into chunks and every chunk is condensed
//!   into short bullets
//! - **Reduce**: all bullets become one summary paragraph plus namespaced tags
//! - **Trim**: summaries over the word cap are shortened once more
//! - **Commit**: a header block is written in front of the untouched body
//!
//! Calls retry transient failures with exponential backoff, and notes are
//! processed by a bounded worker pool over one or more passes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Enrichment Run                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  collect_targets ──► EnrichScheduler ──► DocumentEnricher       │
//! │                            │                    │               │
//! │                            ▼                    ▼               │
//! │                   Semaphore + JoinSet    map ─► reduce ─► trim  │
//! │                                                 │               │
//! │                                                 ▼               │
//! │                          CompletionProvider ◄── retry_call      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod scheduler;

pub use config::{EnrichConfig, RetryPolicy};
pub use document::{Document, DocumentEnricher, DocumentState, DocumentSummary, title_and_date};
pub use error::{EnrichError, Result};
pub use prompt::{max_words, parse_bullets, parse_reduce, parse_tags, word_count};
pub use provider::{ChatMessage, CompletionProvider, OpenAIProvider};
pub use retry::{CallState, RetryOutcome, retry_call};
pub use scheduler::{EnrichReport, EnrichScheduler, PassReport, collect_targets};
