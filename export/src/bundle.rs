//! Zip bundle of rendered notes.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::Result;

/// Write `<out_dir>.zip` holding every top-level `*.md` file of `out_dir`.
/// Assets are not included.
pub fn bundle_notes(out_dir: &Path) -> Result<PathBuf> {
    let zip_path = out_dir.with_extension("zip");

    let mut notes: Vec<PathBuf> = std::fs::read_dir(out_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    notes.sort();

    let mut zip = zip::ZipWriter::new(File::create(&zip_path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &notes {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        zip.start_file(name, options)?;
        zip.write_all(&std::fs::read(path)?)?;
    }
    zip.finish()?;

    info!("Bundled {} notes into {}", notes.len(), zip_path.display());
    Ok(zip_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_bundle_contains_top_level_notes_only() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("staging");
        std::fs::create_dir_all(out.join("_assets")).unwrap();
        std::fs::write(out.join("b.md"), "# B\n").unwrap();
        std::fs::write(out.join("a.md"), "# A\n").unwrap();
        std::fs::write(out.join("_assets/pic.png"), b"png").unwrap();

        let zip_path = bundle_notes(&out).unwrap();
        assert_eq!(zip_path, root.path().join("staging.zip"));

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a.md", "b.md"]);

        let mut contents = String::new();
        archive
            .by_name("a.md")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "# A\n");
    }
}
