//! Promotion of staging notes into the library.

use std::path::{Path, PathBuf};

use chatlib_notes::comparable_body;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cleanup::{CleanupOutcome, cleanup_staging};
use crate::config::MergeConfig;
use crate::error::{MergeError, Result};

/// How a staging note relates to the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No note at the same relative path in the library.
    New,

    /// Same body as the library note (headers and line endings ignored).
    Duplicate,

    /// Different body; the staging copy replaces the library note.
    Changed,
}

/// Statistics about a merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// The library did not exist and staging was renamed into place.
    pub bootstrapped: bool,

    /// New notes moved into the library.
    pub created: usize,

    /// Library notes replaced by a changed staging copy.
    pub replaced: usize,

    /// Staging notes deleted as duplicates.
    pub duplicates: usize,

    /// Notes that could not be processed.
    pub failed: usize,

    /// Assets moved into the library.
    pub assets_moved: usize,

    /// Staging assets deleted because the name already existed.
    pub assets_duplicate: usize,

    /// Cleanup outcome; `None` for dry runs and bootstraps.
    pub cleanup: Option<CleanupOutcome>,
}

/// Merges a staging tree into a library tree.
#[derive(Debug, Clone, Default)]
pub struct LibraryMerger {
    config: MergeConfig,
}

impl LibraryMerger {
    /// Create a merger.
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge `staging` into `library`.
    pub fn merge(&self, staging: &Path, library: &Path) -> Result<MergeReport> {
        validate_paths(staging, library)?;
        let mut report = MergeReport::default();

        if !library.exists() {
            info!(
                "Library {} missing, promoting {} in one step",
                library.display(),
                staging.display()
            );
            if !self.config.dry_run {
                if let Some(parent) = library.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::rename(staging, library)?;
            }
            report.bootstrapped = true;
            return Ok(report);
        }

        for src in self.staged_notes(staging) {
            let Ok(rel) = src.strip_prefix(staging) else {
                continue;
            };
            let dst = library.join(rel);
            match self.promote(&src, &dst) {
                Ok(Classification::New) => report.created += 1,
                Ok(Classification::Duplicate) => report.duplicates += 1,
                Ok(Classification::Changed) => report.replaced += 1,
                Err(e) => {
                    warn!("Failed to merge {}: {e}", src.display());
                    report.failed += 1;
                }
            }
        }

        self.merge_assets(staging, library, &mut report);

        if !self.config.dry_run {
            match cleanup_staging(staging, &self.config) {
                Ok(outcome) => report.cleanup = Some(outcome),
                Err(e) => warn!("Could not fully clean {}: {e}", staging.display()),
            }
        }

        info!(
            "Merged {}: {} new, {} replaced, {} duplicates, {} failed, {} assets moved, {} duplicate assets",
            staging.display(),
            report.created,
            report.replaced,
            report.duplicates,
            report.failed,
            report.assets_moved,
            report.assets_duplicate
        );
        Ok(report)
    }

    /// Classify a staging note against its library counterpart.
    pub fn classify(&self, src: &Path, dst: &Path) -> std::io::Result<Classification> {
        if !dst.exists() {
            return Ok(Classification::New);
        }
        let staged = read_lossy(src)?;
        let existing = read_lossy(dst)?;
        if comparable_body(&staged) == comparable_body(&existing) {
            Ok(Classification::Duplicate)
        } else {
            Ok(Classification::Changed)
        }
    }

    /// Sorted `*.md` files of the staging tree outside the assets folder.
    fn staged_notes(&self, staging: &Path) -> Vec<PathBuf> {
        let assets = self.config.assets_subdir.as_str();
        WalkDir::new(staging)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && e.file_name() == assets))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
            .map(|e| e.into_path())
            .collect()
    }

    fn promote(&self, src: &Path, dst: &Path) -> std::io::Result<Classification> {
        let class = self.classify(src, dst)?;
        debug!("{class:?}: {}", src.display());
        if self.config.dry_run {
            return Ok(class);
        }

        match class {
            Classification::New => move_file(src, dst)?,
            Classification::Duplicate => std::fs::remove_file(src)?,
            Classification::Changed => replace_file(src, dst)?,
        }
        Ok(class)
    }

    /// Move assets whose relative path is free in the library, drop the rest.
    fn merge_assets(&self, staging: &Path, library: &Path, report: &mut MergeReport) {
        let src_root = staging.join(&self.config.assets_subdir);
        if !src_root.is_dir() {
            return;
        }
        let dst_root = library.join(&self.config.assets_subdir);

        let assets: Vec<PathBuf> = WalkDir::new(&src_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();

        for src in assets {
            let Ok(rel) = src.strip_prefix(&src_root) else {
                continue;
            };
            let dst = dst_root.join(rel);
            let duplicate = dst.exists();

            let outcome = if self.config.dry_run {
                Ok(())
            } else if duplicate {
                std::fs::remove_file(&src)
            } else {
                move_file(&src, &dst)
            };

            match outcome {
                Ok(()) if duplicate => report.assets_duplicate += 1,
                Ok(()) => report.assets_moved += 1,
                Err(e) => {
                    warn!("Failed to merge asset {}: {e}", src.display());
                    report.failed += 1;
                }
            }
        }
    }
}

/// Reject a missing staging folder and overlapping trees.
fn validate_paths(staging: &Path, library: &Path) -> Result<()> {
    if !staging.is_dir() {
        return Err(MergeError::StagingNotFound(staging.display().to_string()));
    }

    let staging_abs = staging.canonicalize()?;
    let library_abs = if library.exists() {
        library.canonicalize()?
    } else {
        std::path::absolute(library)?
    };

    if staging_abs == library_abs {
        return Err(MergeError::InvalidPaths(
            "staging and library must be different paths".to_string(),
        ));
    }
    if library_abs.starts_with(&staging_abs) {
        return Err(MergeError::InvalidPaths(
            "library may not be inside staging".to_string(),
        ));
    }
    if staging_abs.starts_with(&library_abs) {
        return Err(MergeError::InvalidPaths(
            "staging may not be inside library".to_string(),
        ));
    }
    Ok(())
}

fn read_lossy(path: &Path) -> std::io::Result<String> {
    Ok(String::from_utf8_lossy(&std::fs::read(path)?).into_owned())
}

/// Rename `src` to `dst`, creating parents and falling back to copy and
/// delete across filesystems.
fn move_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if std::fs::rename(src, dst).is_err() {
        std::fs::copy(src, dst)?;
        std::fs::remove_file(src)?;
    }
    Ok(())
}

/// Move `src` over an existing `dst`. On failure `dst` keeps its contents.
fn replace_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    let temp = dst.with_extension("md.partial");
    let copied = std::fs::copy(src, &temp).and_then(|_| std::fs::rename(&temp, dst));
    if let Err(e) = copied {
        let _ = std::fs::remove_file(&temp);
        return Err(e);
    }
    std::fs::remove_file(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_classify() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.md");
        let dst = tmp.path().join("dst.md");
        let merger = LibraryMerger::default();

        std::fs::write(&src, "# T\r\n\r\nbody\r\n").unwrap();
        assert_eq!(merger.classify(&src, &dst).unwrap(), Classification::New);

        std::fs::write(&dst, "---\ntitle: T\n---\n\n# T\n\nbody\n").unwrap();
        assert_eq!(merger.classify(&src, &dst).unwrap(), Classification::Duplicate);

        std::fs::write(&src, "# T\n\nbodY\n").unwrap();
        assert_eq!(merger.classify(&src, &dst).unwrap(), Classification::Changed);
    }

    #[test]
    fn test_nested_paths_rejected() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("staging");
        std::fs::create_dir_all(&staging).unwrap();
        let merger = LibraryMerger::default();

        for library in [staging.clone(), staging.join("library"), tmp.path().to_path_buf()] {
            assert!(matches!(
                merger.merge(&staging, &library),
                Err(MergeError::InvalidPaths(_))
            ));
        }
        assert!(matches!(
            merger.merge(&tmp.path().join("nope"), &tmp.path().join("lib")),
            Err(MergeError::StagingNotFound(_))
        ));
    }

    #[test]
    fn test_failed_replace_keeps_library_note() {
        let tmp = TempDir::new().unwrap();
        let dst = tmp.path().join("note.md");
        std::fs::write(&dst, "# Old\n").unwrap();

        // A directory can be neither renamed over a file nor copied.
        let src = tmp.path().join("staged.md");
        std::fs::create_dir(&src).unwrap();
        assert!(replace_file(&src, &dst).is_err());
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "# Old\n");
        assert!(!tmp.path().join("note.md.partial").exists());

        let missing = tmp.path().join("missing.md");
        assert!(replace_file(&missing, &dst).is_err());
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "# Old\n");
    }

    #[test]
    fn test_replace_moves_source_over_library_note() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("staged.md");
        let dst = tmp.path().join("note.md");
        std::fs::write(&src, "# New\n").unwrap();
        std::fs::write(&dst, "# Old\n").unwrap();

        replace_file(&src, &dst).unwrap();
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "# New\n");
        assert!(!src.exists());
    }
}
