//! Post-merge cleanup of the staging tree.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::MergeConfig;

/// What cleanup did to the staging tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    /// Junk files deleted.
    pub junk_removed: usize,

    /// Empty directories removed.
    pub dirs_removed: usize,

    /// Whether the staging root itself is gone.
    pub root_removed: bool,

    /// Relative paths left behind, capped at the configured limit.
    pub residuals: Vec<String>,
}

/// Clean the staging tree after its notes were merged.
///
/// Junk files go first, then empty directories bottom-up. The root is
/// removed when empty, force-removed when only junk remains, and otherwise
/// left in place with its leftovers listed.
pub fn cleanup_staging(root: &Path, config: &MergeConfig) -> std::io::Result<CleanupOutcome> {
    let mut outcome = CleanupOutcome::default();
    if !root.is_dir() {
        outcome.root_removed = true;
        return Ok(outcome);
    }

    outcome.junk_removed = purge_junk(root, config);
    outcome.dirs_removed = remove_empty_dirs(root);

    if is_empty_dir(root)? {
        std::fs::remove_dir(root)?;
        outcome.root_removed = true;
        info!("Removed empty staging folder {}", root.display());
    } else if !looks_nontrivial(root, config) {
        std::fs::remove_dir_all(root)?;
        outcome.root_removed = true;
        info!("Removed staging folder {} holding only junk", root.display());
    } else {
        outcome.residuals = residuals(root, config.residual_limit);
        warn!(
            "Staging folder {} not empty; leftovers include: {}",
            root.display(),
            outcome.residuals.join(", ")
        );
    }

    Ok(outcome)
}

fn purge_junk(root: &Path, config: &MergeConfig) -> usize {
    let junk: Vec<_> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| config.is_junk(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect();

    let mut removed = 0;
    for path in junk {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Purged {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Could not purge {}: {e}", path.display()),
        }
    }
    removed
}

/// Remove empty directories below `root`, deepest first.
fn remove_empty_dirs(root: &Path) -> usize {
    let dirs: Vec<_> = WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();

    dirs.iter()
        .filter(|dir| is_empty_dir(dir).unwrap_or(false) && std::fs::remove_dir(dir).is_ok())
        .count()
}

fn is_empty_dir(dir: &Path) -> std::io::Result<bool> {
    Ok(std::fs::read_dir(dir)?.next().is_none())
}

/// True when anything other than junk remains. A directory named like the
/// assets folder always counts.
fn looks_nontrivial(root: &Path, config: &MergeConfig) -> bool {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|e| {
            let name = e.file_name().to_string_lossy();
            if e.file_type().is_dir() {
                name == config.assets_subdir.as_str()
            } else {
                !config.is_junk(&name)
            }
        })
}

fn residuals(root: &Path, limit: usize) -> Vec<String> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            e.path()
                .strip_prefix(root)
                .ok()
                .map(|rel| rel.to_string_lossy().into_owned())
        })
        .take(limit)
        .collect()
}
