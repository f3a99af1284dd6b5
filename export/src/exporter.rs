//! Export run orchestration.
//!
//! Reads an archive, renders each conversation to markdown, copies resolved
//! images into the shared assets folder and writes the (possibly split)
//! notes into a flat staging directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::archive::Archive;
use crate::assets::{AssetStore, asset_stem};
use crate::bundle::bundle_notes;
use crate::config::ExportConfig;
use crate::conversation::{Conversation, Message};
use crate::error::Result;
use crate::file_index::FileIndex;
use crate::naming::{TITLE_MAX_LEN, date_prefix, iso_timestamp, safe_filename, short_id};
use crate::render::{MessageBlock, RenderedNote, copy_failed_marker, missing_image_marker};
use crate::resolver::{ImageResolver, Resolution};
use crate::split::split_note;

/// Length of the conversation id in filenames.
const SHORT_ID_LEN: usize = 8;

/// Candidate source image folders next to the archive, in order.
const SOURCE_DIR_NAMES: &[&str] = &["images", "files"];

/// Statistics about an export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Conversations rendered.
    pub conversations: usize,

    /// Note files written (parts count individually).
    pub notes_written: usize,

    /// Images copied into the assets folder.
    pub images_copied: usize,

    /// Note files that could not be written.
    pub notes_failed: usize,

    /// Image references that could not be resolved or copied.
    pub images_missing: usize,

    /// Path of the zip bundle, when one was written.
    pub bundle: Option<PathBuf>,
}

/// Renders chat archives into staging notes.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    /// Create an exporter.
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export the archive at `archive_path` into `out_dir`.
    pub fn run(&self, archive_path: &Path, out_dir: &Path) -> Result<ExportReport> {
        let archive = Archive::from_path(archive_path)?;
        let source_dir = self.source_dir(archive_path);
        info!(
            "Exporting {} conversations from {}",
            archive.conversations.len(),
            archive_path.display()
        );
        self.export_archive(&archive, &source_dir, out_dir)
    }

    /// Export an already decoded archive, resolving images from `source_dir`.
    pub fn export_archive(
        &self,
        archive: &Archive,
        source_dir: &Path,
        out_dir: &Path,
    ) -> Result<ExportReport> {
        if !source_dir.is_dir() {
            warn!(
                "Image source {} not found, images will be rendered as placeholders",
                source_dir.display()
            );
        }

        std::fs::create_dir_all(out_dir)?;
        let store = AssetStore::open(out_dir, self.config.assets_subdir.as_str())?;
        let index = FileIndex::build(archive);
        let resolver = ImageResolver::new(source_dir, &index);
        debug!("File index holds {} entries", index.len());

        let mut report = ExportReport::default();
        for (position, conversation) in archive.conversations.iter().enumerate() {
            self.export_conversation(
                conversation,
                position + 1,
                &resolver,
                &store,
                out_dir,
                &mut report,
            )?;
            report.conversations += 1;
        }

        if self.config.bundle {
            report.bundle = Some(bundle_notes(out_dir)?);
        }

        info!(
            "Wrote {} notes ({} failed, {} images copied, {} missing) to {}",
            report.notes_written,
            report.notes_failed,
            report.images_copied,
            report.images_missing,
            out_dir.display()
        );
        Ok(report)
    }

    /// Source image folder for an archive: the configured override, else
    /// the first existing candidate next to the archive.
    pub fn source_dir(&self, archive_path: &Path) -> PathBuf {
        if let Some(dir) = &self.config.source_assets {
            return dir.clone();
        }
        let base = archive_path.parent().unwrap_or_else(|| Path::new("."));
        SOURCE_DIR_NAMES
            .iter()
            .map(|name| base.join(name))
            .find(|dir| dir.is_dir())
            .unwrap_or_else(|| base.join(SOURCE_DIR_NAMES[0]))
    }

    fn export_conversation(
        &self,
        conversation: &Conversation,
        position: usize,
        resolver: &ImageResolver<'_>,
        store: &AssetStore,
        out_dir: &Path,
        report: &mut ExportReport,
    ) -> Result<()> {
        let title = conversation
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Chat {position}"));
        let created = conversation
            .create_time
            .and_then(iso_timestamp)
            .unwrap_or_default();
        let date = date_prefix(&created).to_string();
        let id_part = match short_id(&conversation.id, SHORT_ID_LEN) {
            id if id.is_empty() => position.to_string(),
            id => id,
        };
        let base_name = format!("{date} - {} - {id_part}", safe_filename(&title, TITLE_MAX_LEN));

        let messages = conversation.messages();
        debug!("{title:?}: {} messages", messages.len());

        let blocks = messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                let stem = |image: usize| asset_stem(&date, &title, &id_part, i + 1, image);
                message_block(message, &stem, resolver, store, report)
            })
            .collect();

        let note = RenderedNote {
            title: title.clone(),
            created,
            id: conversation.id.clone(),
            model: conversation.model.clone().unwrap_or_default(),
            blocks,
        };

        for part in split_note(&note.render(), &base_name, self.config.split_chars) {
            let path = out_dir.join(part.file_name());
            match std::fs::write(&path, part.contents()) {
                Ok(()) => report.notes_written += 1,
                Err(e) => {
                    warn!("Failed to write {}: {e}", path.display());
                    report.notes_failed += 1;
                }
            }
        }
        Ok(())
    }
}

/// Render one message, copying its images. Image numbering counts only
/// successful copies.
fn message_block(
    message: &Message,
    stem: &dyn Fn(usize) -> String,
    resolver: &ImageResolver<'_>,
    store: &AssetStore,
    report: &mut ExportReport,
) -> MessageBlock {
    let mut block = MessageBlock::new(message.role.as_str(), message.text.as_str());
    let mut copied = 0;

    for image in &message.images {
        let path = match resolver.resolve(image) {
            Resolution::Found { path, via } => {
                debug!("Resolved {} via {via:?}", path.display());
                path
            }
            Resolution::Missing { label } => {
                debug!("Missing image {label}");
                report.images_missing += 1;
                block = block.with_embed(missing_image_marker(&label));
                continue;
            }
        };

        match store.copy_in(&path, &stem(copied + 1), image.file_id.as_deref()) {
            Ok(name) => {
                copied += 1;
                report.images_copied += 1;
                block = block.with_embed(store.embed(&name));
            }
            Err(e) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                warn!("Failed to copy image {}: {e}", path.display());
                report.images_missing += 1;
                block = block.with_embed(copy_failed_marker(&name, &e));
            }
        }
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_source_dir_defaults() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("conversations.json");
        let exporter = Exporter::default();

        assert_eq!(exporter.source_dir(&archive), dir.path().join("images"));

        std::fs::create_dir(dir.path().join("files")).unwrap();
        assert_eq!(exporter.source_dir(&archive), dir.path().join("files"));

        std::fs::create_dir(dir.path().join("images")).unwrap();
        assert_eq!(exporter.source_dir(&archive), dir.path().join("images"));

        let custom = Exporter::new(ExportConfig::default().with_source_assets("/elsewhere"));
        assert_eq!(custom.source_dir(&archive), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_untitled_conversation_uses_position() {
        let out = TempDir::new().unwrap();
        let archive = Archive::from_json(r#"[{"messages": [{"role": "user", "content": "hi"}]}]"#)
            .unwrap();

        let report = Exporter::default()
            .export_archive(&archive, Path::new("/no/images"), out.path())
            .unwrap();

        assert_eq!(report.notes_written, 1);
        let note = std::fs::read_to_string(out.path().join("0000-00-00 - Chat 1 - 1.md")).unwrap();
        assert_eq!(note, "# Chat 1\n\n**USER**\n\nhi\n");
    }
}
