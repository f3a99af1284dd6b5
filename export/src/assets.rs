//! Copying resolved images into the shared assets folder.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::naming::{safe_filename, short_id};

/// Length of the file-id suffix used to disambiguate colliding names.
const COLLISION_ID_LEN: usize = 5;

/// Title length inside asset filenames.
const ASSET_TITLE_LEN: usize = 40;

/// Fallback extension for source files without one.
const DEFAULT_EXTENSION: &str = ".png";

/// The shared assets folder of an output directory.
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
    subdir: String,
}

impl AssetStore {
    /// Open (creating if needed) `<out_dir>/<subdir>`.
    pub fn open(out_dir: &Path, subdir: impl Into<String>) -> std::io::Result<Self> {
        let subdir = subdir.into();
        let dir = out_dir.join(&subdir);
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, subdir })
    }

    /// Absolute path of the assets folder.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Embed token for a copied asset.
    pub fn embed(&self, name: &str) -> String {
        format!("![[{}/{name}]]", self.subdir)
    }

    /// Copy `src` in under `stem` and return the destination filename.
    ///
    /// On a name clash a suffix derived from `file_id` (or random when there
    /// is none) is appended until the name is free.
    pub fn copy_in(&self, src: &Path, stem: &str, file_id: Option<&str>) -> std::io::Result<String> {
        let ext = src
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        let mut name = format!("{stem}{ext}");
        if self.dir.join(&name).exists() {
            let suffix = file_id
                .map(|id| short_id(id, COLLISION_ID_LEN))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(random_suffix);
            name = format!("{stem}_{suffix}{ext}");
            while self.dir.join(&name).exists() {
                name = format!("{stem}_{}{ext}", random_suffix());
            }
        }

        std::fs::copy(src, self.dir.join(&name))?;
        debug!("Copied {} -> {name}", src.display());
        Ok(name)
    }
}

/// Deterministic asset stem for the `image`-th image of the `message`-th
/// message (both 1-based).
pub fn asset_stem(date: &str, title: &str, conv_short_id: &str, message: usize, image: usize) -> String {
    let title = safe_filename(title, ASSET_TITLE_LEN).replace(' ', "-");
    format!("{date}_{title}_{conv_short_id}_msg{message:03}_img{image:02}")
}

fn random_suffix() -> String {
    format!("{:04x}", rand::random::<u16>())
}
