//! # Archive export
//!
//! Turns a chat archive (`conversations.json` plus an image folder) into a
//! flat directory of markdown notes:
//!
//! - **Parsing**: linear message lists and legacy mapping graphs, resolved to
//!   one ordered message list per conversation
//! - **Content classification**: text, image and unknown parts of each message
//! - **Image resolution**: file index, explicit names, then a fuzzy scan of the
//!   source folder, with placeholders for anything unresolved
//! - **Rendering**: one note per conversation, optionally split into linked
//!   parts, with images copied into a shared assets folder
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Export Run                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Archive ──► Conversation ──► MappingGraph ──► Vec<Message>     │
//! │     │                                              │            │
//! │     ▼                                              ▼            │
//! │  FileIndex ──► ImageResolver ──► AssetStore   RenderedNote      │
//! │                                      │             │            │
//! │                                      ▼             ▼            │
//! │                                  _assets/     split_note ──► *.md
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod archive;
pub mod assets;
pub mod bundle;
pub mod classify;
pub mod config;
pub mod conversation;
pub mod error;
pub mod exporter;
pub mod file_index;
pub mod graph;
pub mod naming;
pub mod render;
pub mod resolver;
pub mod split;

pub use archive::Archive;
pub use assets::{AssetStore, asset_stem};
pub use bundle::bundle_notes;
pub use classify::{ClassifiedContent, ContentPart, ImageRef, classify_content, classify_part};
pub use config::ExportConfig;
pub use conversation::{Conversation, ConversationBody, Message};
pub use error::{ExportError, Result};
pub use exporter::{ExportReport, Exporter};
pub use file_index::{FileEntry, FileIndex};
pub use graph::{MappingGraph, MappingNode};
pub use naming::{date_prefix, iso_timestamp, safe_filename, short_id};
pub use render::{MessageBlock, RenderedNote};
pub use resolver::{ImageResolver, Resolution, ResolvedVia};
pub use split::{NAV_MARKER, NotePart, split_note, strip_footer};
