use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::completion::CompletionConfig;
use crate::completion::engine::DEFAULT_MAX_SUGGESTIONS;
use crate::language::DEFAULT_REFRESH_DELAY;

pub const DEFAULT_CLASSPATH_FILE: &str = ".classpath";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DotCompleteConfig {
    /// Classpath list; relative paths are taken from the workspace root.
    pub classpath_file: Option<PathBuf>,
    pub max_suggestions: usize,
    pub token_refresh_delay_ms: u64,
    /// Collector threads; defaults to one less than the available CPUs.
    pub collector_workers: Option<usize>,
}

impl Default for DotCompleteConfig {
    fn default() -> Self {
        Self {
            classpath_file: None,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            token_refresh_delay_ms: DEFAULT_REFRESH_DELAY.as_millis() as u64,
            collector_workers: None,
        }
    }
}

impl DotCompleteConfig {
    pub fn classpath_path(&self, root: &Path) -> PathBuf {
        match &self.classpath_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root.join(path),
            None => root.join(DEFAULT_CLASSPATH_FILE),
        }
    }

    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            max_suggestions: self.max_suggestions,
        }
    }

    pub fn token_refresh_delay(&self) -> Duration {
        Duration::from_millis(self.token_refresh_delay_ms)
    }
}
