//! # Note format
//!
//! Shared text primitives for chatlib markdown notes:
//!
//! - **Header blocks**: the `---` delimited title/date/tags/summary prefix that
//!   the enrichment engine writes and the merge engine ignores
//! - **Boundary splitting**: size-bounded slicing that prefers paragraph breaks,
//!   used both for splitting long notes and for chunking bodies before
//!   summarization
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ ---                          │  ◄── Header (optional)
//! │ title / date / tags / summary│
//! │ ---                          │
//! ├──────────────────────────────┤
//! │ # Title                      │  ◄── body, never rewritten
//! │ ...                          │
//! └──────────────────────────────┘
//! ```

pub mod boundary;
pub mod header;

pub use boundary::{DEFAULT_MIN_FRACTION, split_ranges};
pub use header::{
    Header, MAX_TAGS, comparable_body, has_header, normalize_line_endings, normalize_tags,
    split_header, strip_header,
};
