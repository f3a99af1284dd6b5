//! Configuration for an export run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for rendering an archive into staging notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Maximum characters per note file (0 = never split).
    pub split_chars: usize,

    /// Name of the shared assets folder inside the output directory.
    pub assets_subdir: String,

    /// Directory holding the source images. Defaults to `images/` (or
    /// `files/`) next to the archive.
    pub source_assets: Option<PathBuf>,

    /// Whether to also write `<out>.zip` with the rendered notes.
    pub bundle: bool,
}

impl ExportConfig {
    /// Set the split limit.
    pub fn with_split_chars(mut self, split_chars: usize) -> Self {
        self.split_chars = split_chars;
        self
    }

    /// Set the assets subfolder name.
    pub fn with_assets_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.assets_subdir = subdir.into();
        self
    }

    /// Override the source image directory.
    pub fn with_source_assets(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_assets = Some(dir.into());
        self
    }

    /// Enable the zip bundle.
    pub fn with_bundle(mut self) -> Self {
        self.bundle = true;
        self
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            split_chars: 0,
            assets_subdir: "_assets".to_string(),
            source_assets: None,
            bundle: false,
        }
    }
}
