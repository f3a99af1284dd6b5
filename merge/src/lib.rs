//! # Library merge
//!
//! Promotes freshly exported staging notes into a long-lived library:
//!
//! - **Classification**: each staging note is new, a duplicate, or a changed
//!   version of a library note, compared on bodies only
//! - **Bootstrap**: a missing library is created by renaming staging in place
//! - **Asset merge**: assets are moved when their name is free in the library
//! - **Cleanup**: staging is emptied, junk purged, and leftovers reported
//! - **Header snapshots**: header blocks mirrored to a separate tree
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Library Merge                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  staging/*.md ──► LibraryMerger::classify ──► New | Duplicate   │
//! │       │                                         | Changed       │
//! │       ▼                                              │          │
//! │  staging/_assets ──► merge_assets          library/*.md         │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  cleanup_staging ──► CleanupOutcome                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cleanup;
pub mod config;
pub mod error;
pub mod merge;
pub mod sidecar;

pub use cleanup::{CleanupOutcome, cleanup_staging};
pub use config::MergeConfig;
pub use error::{MergeError, Result};
pub use merge::{Classification, LibraryMerger, MergeReport};
pub use sidecar::{SnapshotReport, snapshot_headers};
