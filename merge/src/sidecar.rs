//! Header-only snapshots of library notes.
//!
//! Headers are regenerable, but regenerating them costs model calls. A
//! snapshot mirrors each header block to `<out>/<relative path>` so it can be
//! inspected or restored independently of the note bodies.

use std::path::Path;

use chatlib_notes::split_header;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::Result;

/// Counts from a snapshot run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Header files written.
    pub written: usize,

    /// Notes without a header.
    pub skipped: usize,

    /// Notes that could not be read or written.
    pub failed: usize,
}

/// Copy the header block of every library note under `out`.
///
/// Notes inside `assets_subdir` are ignored. A missing library is a no-op.
pub fn snapshot_headers(library: &Path, out: &Path, assets_subdir: &str) -> Result<SnapshotReport> {
    let mut report = SnapshotReport::default();
    if !library.is_dir() {
        debug!("Library {} missing, nothing to snapshot", library.display());
        return Ok(report);
    }

    let notes = WalkDir::new(library)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !(e.file_type().is_dir() && e.file_name() == assets_subdir)
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"));

    for entry in notes {
        let Ok(rel) = entry.path().strip_prefix(library) else {
            continue;
        };
        match snapshot_one(entry.path(), &out.join(rel)) {
            Ok(true) => report.written += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                warn!("Could not snapshot {}: {e}", entry.path().display());
                report.failed += 1;
            }
        }
    }

    info!(
        "Snapshotted {} headers into {} ({} without header)",
        report.written,
        out.display(),
        report.skipped
    );
    Ok(report)
}

fn snapshot_one(note: &Path, target: &Path) -> std::io::Result<bool> {
    let text = std::fs::read_to_string(note)?;
    let (Some(header), _) = split_header(&text) else {
        return Ok(false);
    };
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, header)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_mirrors_headers() {
        let tmp = TempDir::new().unwrap();
        let library = tmp.path().join("library");
        let out = tmp.path().join("headers");
        std::fs::create_dir_all(library.join("2024/_assets")).unwrap();
        std::fs::create_dir_all(library.join("_assets")).unwrap();
        std::fs::write(library.join("2024/a.md"), "---\ntitle: A\n---\n\n# A\nbody\n").unwrap();
        std::fs::write(library.join("b.md"), "# B\n").unwrap();
        std::fs::write(library.join("_assets/c.md"), "---\ntitle: C\n---\n").unwrap();

        let report = snapshot_headers(&library, &out, "_assets").unwrap();

        assert_eq!(
            report,
            SnapshotReport {
                written: 1,
                skipped: 1,
                failed: 0
            }
        );
        assert_eq!(
            std::fs::read_to_string(out.join("2024/a.md")).unwrap(),
            "---\ntitle: A\n---\n\n"
        );
        assert!(!out.join("b.md").exists());
        assert!(!out.join("_assets/c.md").exists());
    }

    #[test]
    fn test_missing_library_is_noop() {
        let tmp = TempDir::new().unwrap();
        let report = snapshot_headers(&tmp.path().join("none"), tmp.path(), "_assets").unwrap();
        assert_eq!(report, SnapshotReport::default());
    }
}
