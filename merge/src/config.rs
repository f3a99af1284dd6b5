//! Configuration for merging staging notes into the library.

use serde::{Deserialize, Serialize};

/// Configuration for a merge run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Name of the shared assets folder in both trees.
    pub assets_subdir: String,

    /// Classify and report without touching the filesystem.
    pub dry_run: bool,

    /// Exact filenames purged from staging before cleanup.
    pub junk_names: Vec<String>,

    /// Filename prefixes purged from staging before cleanup.
    pub junk_prefixes: Vec<String>,

    /// Maximum number of leftover paths reported after cleanup.
    pub residual_limit: usize,
}

impl MergeConfig {
    /// Set the assets subfolder name.
    pub fn with_assets_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.assets_subdir = subdir.into();
        self
    }

    /// Enable dry-run mode.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Add a junk filename.
    pub fn junk(mut self, name: impl Into<String>) -> Self {
        self.junk_names.push(name.into());
        self
    }

    /// Whether a filename is disposable junk.
    pub fn is_junk(&self, file_name: &str) -> bool {
        self.junk_names.iter().any(|n| n == file_name)
            || self
                .junk_prefixes
                .iter()
                .any(|p| file_name.starts_with(p.as_str()))
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            assets_subdir: "_assets".to_string(),
            dry_run: false,
            junk_names: vec![".DS_Store".to_string()],
            junk_prefixes: vec!["._".to_string()],
            residual_limit: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_junk() {
        let config = MergeConfig::default().junk("Thumbs.db");

        assert!(config.is_junk(".DS_Store"));
        assert!(config.is_junk("._note.md"));
        assert!(config.is_junk("Thumbs.db"));
        assert!(!config.is_junk(".hidden"));
        assert!(!config.is_junk("note.md"));
    }
}
