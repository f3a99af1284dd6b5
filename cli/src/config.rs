//! Pipeline configuration file.

use std::path::Path;

use anyhow::{Context, Result};
use chatlib_enrich::EnrichConfig;
use chatlib_export::ExportConfig;
use chatlib_merge::MergeConfig;
use serde::{Deserialize, Serialize};

/// Settings for every stage, one section per component.
///
/// ```toml
/// [export]
/// split_chars = 20000
///
/// [merge]
/// assets_subdir = "_assets"
///
/// [enrich]
/// model = "gpt-4o-mini"
/// workers = 4
///
/// [enrich.retry]
/// max_attempts = 4
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Export settings.
    pub export: ExportConfig,

    /// Merge settings.
    pub merge: MergeConfig,

    /// Enrichment settings.
    pub enrich: EnrichConfig,
}

impl PipelineConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Load `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse TOML text; missing sections and keys keep their defaults.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Use one assets folder name for every stage.
    pub fn with_assets_subdir(mut self, subdir: &str) -> Self {
        self.export.assets_subdir = subdir.to_string();
        self.merge.assets_subdir = subdir.to_string();
        self.enrich.assets_subdir = subdir.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = PipelineConfig::parse("").unwrap();
        assert_eq!(config.export.split_chars, 0);
        assert_eq!(config.merge.residual_limit, 30);
        assert_eq!(config.enrich.workers, 3);
        assert_eq!(config.enrich.retry.max_attempts, 6);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = PipelineConfig::parse(
            r#"
            [export]
            split_chars = 20000
            bundle = true

            [merge]
            junk_names = [".DS_Store", "Thumbs.db"]

            [enrich]
            model = "local-model"
            base_url = "http://localhost:8080/v1"
            workers = 8
            skip_basenames = ["index.md"]

            [enrich.retry]
            max_attempts = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.export.split_chars, 20000);
        assert!(config.export.bundle);
        assert_eq!(config.export.assets_subdir, "_assets");
        assert!(config.merge.is_junk("Thumbs.db"));
        assert_eq!(config.enrich.model, "local-model");
        assert_eq!(config.enrich.workers, 8);
        assert_eq!(config.enrich.skip_basenames, vec!["index.md"]);
        assert_eq!(config.enrich.retry.max_attempts, 2);
        assert_eq!(config.enrich.retry.base_secs, 2.0);
        assert_eq!(config.enrich.chunk_chars, 6000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatlib.toml");
        std::fs::write(&path, "[enrich]\nworkers = \"many\"\n").unwrap();

        let err = PipelineConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config"), "{err}");
        assert!(PipelineConfig::load(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_shared_assets_subdir() {
        let config = PipelineConfig::default().with_assets_subdir("media");
        assert_eq!(config.export.assets_subdir, "media");
        assert_eq!(config.merge.assets_subdir, "media");
        assert_eq!(config.enrich.assets_subdir, "media");
    }
}
