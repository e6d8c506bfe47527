use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::registry::SymbolRegistry;
use crate::registry::collector::{Collector, PopulationProgress, descriptor_files, read_classpath};
use document::DocumentStore;

pub mod document;

pub struct Workspace {
    pub documents: DocumentStore,
    pub registry: Arc<RwLock<SymbolRegistry>>,
    pub progress: Arc<PopulationProgress>,
}

/// Outcome of one registry population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationSummary {
    pub files: usize,
    pub classes: usize,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            documents: DocumentStore::new(),
            registry: Arc::new(RwLock::new(SymbolRegistry::new())),
            progress: Arc::new(PopulationProgress::new()),
        }
    }

    /// Populate the registry from the descriptor dumps a classpath file lists.
    ///
    /// Parsing runs off the async runtime; each worker's classes are written
    /// as soon as the worker finishes, so readers may see a partial registry.
    pub async fn load_classpath(
        &self,
        classpath: PathBuf,
        workers: Option<usize>,
    ) -> Result<PopulationSummary> {
        let registry = Arc::clone(&self.registry);
        let progress = Arc::clone(&self.progress);

        let files = tokio::task::spawn_blocking(move || -> Result<usize> {
            let entries = read_classpath(&classpath)?;
            let files = descriptor_files(&entries);
            info!(
                classpath = %classpath.display(),
                entries = entries.len(),
                files = files.len(),
                "found descriptor files, parsing in parallel"
            );

            Collector::new(workers).collect(&files, &progress, |batch| {
                registry.blocking_write().add_classes(batch);
            })?;
            Ok(files.len())
        })
        .await??;

        let classes = self.registry.read().await.class_count();
        info!(files, classes, "registry populated");
        Ok(PopulationSummary { files, classes })
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_classpath() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("dumps")).unwrap();
        std::fs::write(
            dir.path().join("dumps/util.json"),
            r#"[
                {"name": "java.util.List", "modifiers": ["public", "interface"]},
                {"name": "java.util.Hidden", "modifiers": []}
            ]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("lang.json"),
            r#"[{"name": "java.lang.String", "modifiers": ["public"]}]"#,
        )
        .unwrap();
        let classpath = dir.path().join(".classpath");
        let separator = if cfg!(windows) { ";" } else { ":" };
        std::fs::write(&classpath, format!("dumps{separator}lang.json")).unwrap();

        let workspace = Workspace::new();
        let summary = workspace.load_classpath(classpath, Some(2)).await.unwrap();

        assert_eq!(summary, PopulationSummary { files: 2, classes: 2 });
        assert!(workspace.progress.is_complete());
        let registry = workspace.registry.read().await;
        assert!(registry.contains("java.util.List"));
        assert!(!registry.contains("java.util.Hidden"));
    }

    #[tokio::test]
    async fn test_missing_classpath_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new();
        let result = workspace
            .load_classpath(dir.path().join("missing"), None)
            .await;
        assert!(result.is_err());
        assert_eq!(workspace.registry.read().await.class_count(), 0);
    }
}
