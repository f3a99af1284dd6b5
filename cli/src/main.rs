//! chatlib CLI
//!
//! Exports chat archives into markdown notes, merges them into a library and
//! enriches library notes with summaries and tags.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chatlib_enrich::{EnrichConfig, EnrichScheduler, OpenAIProvider};
use chatlib_export::{ExportConfig, Exporter};
use chatlib_merge::{LibraryMerger, MergeConfig, snapshot_headers};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::PipelineConfig;

#[derive(Parser)]
#[command(name = "chatlib")]
#[command(about = "Chat archive export, library merge and enrichment", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Assets folder name used by every stage
    #[arg(long, global = true)]
    assets_subdir: Option<String>,

    /// Verbose mode
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an archive into a staging folder of notes
    Export {
        /// Path to conversations.json
        archive: PathBuf,

        /// Output folder
        out: PathBuf,

        /// Split notes longer than this many characters (0 = never)
        #[arg(long)]
        split_chars: Option<usize>,

        /// Folder holding the archive images
        #[arg(long)]
        images: Option<PathBuf>,

        /// Also write <out>.zip with the rendered notes
        #[arg(long)]
        bundle: bool,
    },

    /// Merge a staging folder into the library
    Merge {
        /// Staging folder produced by `export`
        staging: PathBuf,

        /// Library folder
        library: PathBuf,

        /// Report what would happen without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Add summaries and tags to library notes
    Enrich {
        /// Library folder
        library: PathBuf,

        /// Completion model
        #[arg(long)]
        model: Option<String>,

        /// Notes processed concurrently
        #[arg(long)]
        workers: Option<usize>,

        /// Characters per MAP chunk
        #[arg(long)]
        chunk_chars: Option<usize>,

        /// Keep running passes until no note is left
        #[arg(long)]
        until_done: bool,

        /// Pass limit for --until-done
        #[arg(long, requires = "until_done")]
        max_passes: Option<usize>,

        /// Seconds to wait between passes
        #[arg(long)]
        pass_sleep: Option<f64>,

        /// Also process notes that already have a header
        #[arg(long)]
        reprocess: bool,

        /// Only process notes whose filename contains this text
        #[arg(long)]
        only: Option<String>,
    },

    /// Copy the header block of every library note into a mirror folder
    SnapshotHeaders {
        /// Library folder
        library: PathBuf,

        /// Output folder
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = PipelineConfig::load_or_default(cli.config.as_deref())?;
    if let Some(subdir) = &cli.assets_subdir {
        config = config.with_assets_subdir(subdir);
    }

    match cli.command {
        Commands::Export {
            archive,
            out,
            split_chars,
            images,
            bundle,
        } => {
            let mut export = config.export;
            if let Some(split_chars) = split_chars {
                export = export.with_split_chars(split_chars);
            }
            if let Some(images) = images {
                export = export.with_source_assets(images);
            }
            if bundle {
                export = export.with_bundle();
            }
            run_export(export, &archive, &out)
        }
        Commands::Merge {
            staging,
            library,
            dry_run,
        } => {
            let mut merge = config.merge;
            if dry_run {
                merge = merge.dry_run();
            }
            run_merge(merge, &staging, &library)
        }
        Commands::Enrich {
            library,
            model,
            workers,
            chunk_chars,
            until_done,
            max_passes,
            pass_sleep,
            reprocess,
            only,
        } => {
            let mut enrich = config.enrich;
            if let Some(model) = model {
                enrich = enrich.with_model(model);
            }
            if let Some(workers) = workers {
                enrich = enrich.with_workers(workers);
            }
            if let Some(chunk_chars) = chunk_chars {
                enrich = enrich.with_chunk_chars(chunk_chars);
            }
            if until_done {
                let passes = max_passes.unwrap_or(enrich.max_passes);
                enrich = enrich.until_done(passes);
            }
            if let Some(secs) = pass_sleep {
                enrich = enrich.with_pass_sleep(secs);
            }
            if reprocess {
                enrich = enrich.reprocess();
            }
            if let Some(only) = only {
                enrich = enrich.only(only);
            }
            run_enrich(enrich, &library).await
        }
        Commands::SnapshotHeaders { library, out } => {
            let report = snapshot_headers(&library, &out, &config.merge.assets_subdir)
                .with_context(|| format!("failed to snapshot headers of {}", library.display()))?;
            info!(
                "Snapshot: {} written, {} without header, {} failed",
                report.written, report.skipped, report.failed
            );
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_export(config: ExportConfig, archive: &Path, out: &Path) -> Result<()> {
    let report = Exporter::new(config)
        .run(archive, out)
        .with_context(|| format!("failed to export {}", archive.display()))?;

    info!(
        "Exported {} conversation(s) into {} note(s) at {}",
        report.conversations,
        report.notes_written,
        out.display()
    );
    if report.notes_failed > 0 {
        warn!("{} note(s) could not be written", report.notes_failed);
    }
    info!(
        "Images: {} copied, {} missing",
        report.images_copied, report.images_missing
    );
    if let Some(bundle) = &report.bundle {
        info!("Bundle written to {}", bundle.display());
    }
    Ok(())
}

fn run_merge(config: MergeConfig, staging: &Path, library: &Path) -> Result<()> {
    let report = LibraryMerger::new(config)
        .merge(staging, library)
        .with_context(|| {
            format!(
                "failed to merge {} into {}",
                staging.display(),
                library.display()
            )
        })?;

    if report.failed > 0 {
        warn!("{} note(s) could not be merged", report.failed);
    }
    if let Some(cleanup) = report.cleanup.as_ref().filter(|c| !c.residuals.is_empty()) {
        warn!(
            "Staging kept {} leftover path(s); remove them by hand",
            cleanup.residuals.len()
        );
    }
    Ok(())
}

async fn run_enrich(config: EnrichConfig, library: &Path) -> Result<()> {
    if !library.is_dir() {
        bail!("library not found: {}", library.display());
    }
    let provider = OpenAIProvider::from_env(&config).context("set OPENAI_API_KEY to enrich notes")?;
    let report = EnrichScheduler::new(Arc::new(provider), config)
        .run(library)
        .await
        .with_context(|| format!("failed to enrich {}", library.display()))?;

    if !report.remaining.is_empty() {
        warn!("{} note(s) still without a header", report.remaining.len());
    }
    Ok(())
}
