//! Parallel population of the registry from class descriptor dumps.
//!
//! A classpath file lists descriptor locations separated by the platform path
//! delimiter. Each location is either a JSON file holding an array of class
//! descriptors or a directory searched recursively for such files.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::ClassEntry;

const DESCRIPTOR_EXTENSION: &str = "json";

/// Completion barrier shared between the collector and its callers.
#[derive(Debug, Default)]
pub struct PopulationProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl PopulationProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin(&self, workers: usize) {
        self.done.store(0, Ordering::Release);
        self.total.store(workers, Ordering::Release);
    }

    fn worker_done(&self) -> usize {
        self.done.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    /// True once every worker of the last run reported back.
    pub fn is_complete(&self) -> bool {
        let total = self.total();
        total > 0 && self.completed() >= total
    }
}

/// Read a classpath file and resolve its entries relative to the file's directory.
pub fn read_classpath(path: &Path) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read classpath file {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let entries = std::env::split_paths(content.trim())
        .filter(|entry| !entry.as_os_str().is_empty())
        .map(|entry| {
            if entry.is_absolute() {
                entry
            } else {
                base.join(entry)
            }
        })
        .collect();
    Ok(entries)
}

/// Expand classpath entries into descriptor files, dropping everything else.
pub fn descriptor_files(entries: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in entries {
        if entry.is_dir() {
            files.extend(
                WalkDir::new(entry)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .map(|e| e.into_path())
                    .filter(|p| is_descriptor(p)),
            );
        } else if is_descriptor(entry) {
            files.push(entry.clone());
        } else {
            debug!(path = %entry.display(), "skipping non-descriptor classpath entry");
        }
    }
    files
}

fn is_descriptor(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == DESCRIPTOR_EXTENSION) && path.is_file()
}

/// Parse one descriptor dump, keeping public classes only.
pub fn load_descriptor_file(path: &Path) -> Result<Vec<ClassEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let classes: Vec<ClassEntry> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(classes
        .into_iter()
        .filter(|c| c.modifiers.is_public())
        .collect())
}

/// Default worker count: one execution unit is left to the host.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

pub struct Collector {
    workers: usize,
}

impl Collector {
    pub fn new(workers: Option<usize>) -> Self {
        Self {
            workers: workers.unwrap_or_else(default_workers).max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Parse `files` on a dedicated pool and hand each worker's classes to `sink`.
    ///
    /// Files are split into `workers` contiguous chunks of equal size. Files
    /// that fail to load are logged and skipped. `progress` reaches completion
    /// when every chunk has been delivered, including empty ones.
    pub fn collect<F>(&self, files: &[PathBuf], progress: &PopulationProgress, sink: F) -> Result<()>
    where
        F: Fn(Vec<ClassEntry>) + Send + Sync,
    {
        let chunk_size = files.len().div_ceil(self.workers).max(1);
        let chunks: Vec<&[PathBuf]> = (0..self.workers)
            .map(|i| {
                let start = (i * chunk_size).min(files.len());
                let end = ((i + 1) * chunk_size).min(files.len());
                &files[start..end]
            })
            .collect();

        progress.begin(chunks.len());
        info!(
            files = files.len(),
            workers = self.workers,
            "collecting class descriptors"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("collector-{i}"))
            .build()
            .context("failed to start collector pool")?;

        pool.install(|| {
            chunks.par_iter().for_each(|chunk| {
                let classes: Vec<ClassEntry> = chunk
                    .iter()
                    .flat_map(|file| match load_descriptor_file(file) {
                        Ok(classes) => {
                            debug!(path = %file.display(), count = classes.len(), "descriptor loaded");
                            classes
                        }
                        Err(e) => {
                            warn!(path = %file.display(), error = %e, "failed to parse descriptor");
                            vec![]
                        }
                    })
                    .collect();
                sink(classes);
                let done = progress.worker_done();
                debug!(done, total = progress.total(), "collector worker finished");
            });
        });

        Ok(())
    }
}
