//! Target discovery and the bounded worker pool.

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatlib_notes::has_header;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::EnrichConfig;
use crate::document::DocumentEnricher;
use crate::error::{EnrichError, Result};
use crate::provider::CompletionProvider;

/// Leading bytes read when checking for an existing header.
const HEADER_SNIFF_BYTES: u64 = 4096;

/// Remaining notes listed in the log when passes run out.
const REMAINING_LOG_LIMIT: usize = 20;

/// Totals across all passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Passes run.
    pub passes: usize,

    /// Notes enriched.
    pub succeeded: usize,

    /// Failed attempts to enrich a note, summed over passes.
    pub failed: usize,

    /// Notes still needing work after the last pass.
    pub remaining: Vec<PathBuf>,
}

/// Outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Notes enriched in this pass.
    pub succeeded: Vec<PathBuf>,

    /// Notes that failed in this pass.
    pub failed: Vec<PathBuf>,
}

/// Where a multi-pass run stands.
#[derive(Debug)]
enum PassState {
    /// Looking for notes that still need work.
    Scanning,

    /// Enriching the listed notes.
    Running(Vec<PathBuf>),

    /// Waiting before the next scan.
    Sleeping,

    Finished,
}

/// Runs enrichment passes over a library.
pub struct EnrichScheduler {
    enricher: DocumentEnricher,
    config: Arc<EnrichConfig>,
}

impl EnrichScheduler {
    /// Create a scheduler.
    pub fn new(provider: Arc<dyn CompletionProvider>, config: EnrichConfig) -> Self {
        let config = Arc::new(config);
        Self {
            enricher: DocumentEnricher::new(provider, Arc::clone(&config)),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Enrich the library at `root`, once or until nothing is left.
    ///
    /// Notes enriched in an earlier pass are never picked up again, so
    /// `reprocess` and `until_done` can be combined.
    pub async fn run(&self, root: &Path) -> Result<EnrichReport> {
        if !root.is_dir() {
            return Err(EnrichError::LibraryNotFound(root.display().to_string()));
        }

        let mut report = EnrichReport::default();
        let mut done: HashSet<PathBuf> = HashSet::new();
        let mut state = PassState::Scanning;

        loop {
            state = match state {
                PassState::Scanning => {
                    let targets = self.pending(root, &done);
                    if targets.is_empty() {
                        info!("No notes need enrichment");
                        PassState::Finished
                    } else {
                        PassState::Running(targets)
                    }
                }
                PassState::Running(targets) => {
                    report.passes += 1;
                    info!("Pass {}: {} note(s) to enrich", report.passes, targets.len());
                    let pass = self.run_pass(targets).await;
                    report.succeeded += pass.succeeded.len();
                    report.failed += pass.failed.len();
                    done.extend(pass.succeeded);

                    report.remaining = self.pending(root, &done);
                    self.after_pass(&report)
                }
                PassState::Sleeping => {
                    info!("Sleeping {:.1}s before the next pass", self.config.pass_sleep_secs);
                    tokio::time::sleep(self.config.pass_sleep()).await;
                    PassState::Scanning
                }
                PassState::Finished => break,
            };
        }

        info!(
            "Enrichment finished after {} pass(es): {} succeeded, {} failed",
            report.passes, report.succeeded, report.failed
        );
        Ok(report)
    }

    fn after_pass(&self, report: &EnrichReport) -> PassState {
        if !self.config.until_done || report.remaining.is_empty() {
            return PassState::Finished;
        }
        if report.passes >= self.config.max_passes {
            warn!(
                "Reached {} passes with {} note(s) remaining",
                self.config.max_passes,
                report.remaining.len()
            );
            for path in report.remaining.iter().take(REMAINING_LOG_LIMIT) {
                warn!("  still pending: {}", path.display());
            }
            return PassState::Finished;
        }
        PassState::Sleeping
    }

    /// Enrich `targets` with at most `workers` notes in flight.
    pub async fn run_pass(&self, mut targets: Vec<PathBuf>) -> PassReport {
        targets.sort();
        targets.dedup();

        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();

        for path in targets {
            let semaphore = Arc::clone(&semaphore);
            let enricher = self.enricher.clone();
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => enricher.enrich(&path).await,
                    Err(e) => Err(EnrichError::Transport(e.to_string())),
                };
                (path, result)
            });
        }

        let mut report = PassReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, Ok(_))) => report.succeeded.push(path),
                Ok((path, Err(err))) => {
                    warn!("Failed to enrich {}: {err}", path.display());
                    report.failed.push(path);
                }
                Err(e) => error!("Enrichment task panicked: {e}"),
            }
        }
        report
    }

    /// Notes under `root` that still need enrichment.
    pub fn pending(&self, root: &Path, done: &HashSet<PathBuf>) -> Vec<PathBuf> {
        collect_targets(root, &self.config)
            .into_iter()
            .filter(|path| !done.contains(path))
            .collect()
    }
}

/// Sorted notes under `root` eligible for enrichment.
pub fn collect_targets(root: &Path, config: &EnrichConfig) -> Vec<PathBuf> {
    let assets = config.assets_subdir.as_str();
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && e.file_name() == assets))
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            !config.skip_basenames.iter().any(|skip| *skip == name)
                && config
                    .only
                    .as_deref()
                    .is_none_or(|needle| name.contains(needle))
        })
        .map(walkdir::DirEntry::into_path)
        .filter(|path| config.reprocess || !starts_with_header(path))
        .collect()
}

fn starts_with_header(path: &Path) -> bool {
    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };
    let mut head = Vec::new();
    if file.take(HEADER_SNIFF_BYTES).read_to_end(&mut head).is_err() {
        return false;
    }
    has_header(&String::from_utf8_lossy(&head))
}
