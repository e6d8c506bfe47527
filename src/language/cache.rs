use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::completion::context::EditorHandle;
use crate::completion::tokens::{TokenGrid, TokenSource, Tokenizer};

pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(1000);

struct CachedTokens {
    grid: Arc<TokenGrid>,
    /// First edit not reflected in `grid`.
    dirty_since: Option<Instant>,
}

/// Token snapshots per editor.
///
/// A snapshot is created on the first request for an editor. After an edit it
/// keeps being served until `refresh_delay` has passed, then the next request
/// re-tokenizes the buffer.
pub struct TokenCache {
    tokenizer: Arc<dyn Tokenizer>,
    entries: DashMap<EditorHandle, CachedTokens>,
    refresh_delay_ms: AtomicU64,
}

impl TokenCache {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, refresh_delay: Duration) -> Self {
        Self {
            tokenizer,
            entries: DashMap::new(),
            refresh_delay_ms: AtomicU64::new(refresh_delay.as_millis() as u64),
        }
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms.load(Ordering::Relaxed))
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        self.refresh_delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    /// Re-tokenize `source` now.
    pub fn refresh(&self, editor: &EditorHandle, source: &str) -> Arc<TokenGrid> {
        let grid = Arc::new(self.tokenizer.tokenize(source));
        self.entries.insert(
            editor.clone(),
            CachedTokens {
                grid: Arc::clone(&grid),
                dirty_since: None,
            },
        );
        debug!(editor = %editor, rows = grid.row_count(), "tokens refreshed");
        grid
    }

    /// Record an edit; the snapshot is refreshed once the delay has passed.
    pub fn edited(&self, editor: &EditorHandle) {
        if let Some(mut entry) = self.entries.get_mut(editor) {
            entry.dirty_since.get_or_insert_with(Instant::now);
        }
    }

    /// Forget an editor, e.g. when its buffer closes.
    pub fn remove(&self, editor: &EditorHandle) {
        self.entries.remove(editor);
    }

    pub fn contains(&self, editor: &EditorHandle) -> bool {
        self.entries.contains_key(editor)
    }
}

impl TokenSource for TokenCache {
    fn tokens(&self, editor: &EditorHandle, source: &str) -> Option<Arc<TokenGrid>> {
        let delay = self.refresh_delay();
        let cached = self.entries.get(editor).map(|entry| {
            let due = entry.dirty_since.is_some_and(|since| since.elapsed() >= delay);
            (Arc::clone(&entry.grid), due)
        });
        match cached {
            Some((grid, false)) => Some(grid),
            Some((_, true)) | None => Some(self.refresh(editor, source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::tokens::Token;
    use std::sync::atomic::AtomicUsize;

    /// One token per line, counting calls.
    #[derive(Default)]
    struct LineTokenizer {
        calls: AtomicUsize,
    }

    impl Tokenizer for LineTokenizer {
        fn tokenize(&self, source: &str) -> TokenGrid {
            self.calls.fetch_add(1, Ordering::SeqCst);
            TokenGrid::new(
                source
                    .split('\n')
                    .map(|line| vec![Token::new(line, vec![])])
                    .collect(),
            )
        }
    }

    fn first_value(grid: &TokenGrid) -> &str {
        &grid.rows()[0][0].value
    }

    #[test]
    fn test_created_on_first_request_then_reused() {
        let tokenizer = Arc::new(LineTokenizer::default());
        let cache = TokenCache::new(tokenizer.clone(), DEFAULT_REFRESH_DELAY);
        let editor = EditorHandle::new("a");

        let first = cache.tokens(&editor, "one").unwrap();
        let second = cache.tokens(&editor, "two").unwrap();
        assert_eq!(first_value(&second), "one");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(tokenizer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stale_until_delay_passes() {
        let tokenizer = Arc::new(LineTokenizer::default());
        let cache = TokenCache::new(tokenizer.clone(), Duration::from_secs(3600));
        let editor = EditorHandle::new("a");

        cache.tokens(&editor, "one");
        cache.edited(&editor);
        assert_eq!(first_value(&cache.tokens(&editor, "two").unwrap()), "one");

        cache.set_refresh_delay(Duration::ZERO);
        assert_eq!(first_value(&cache.tokens(&editor, "two").unwrap()), "two");
        assert_eq!(first_value(&cache.tokens(&editor, "three").unwrap()), "two");
        assert_eq!(tokenizer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_drops_snapshot() {
        let cache = TokenCache::new(Arc::new(LineTokenizer::default()), DEFAULT_REFRESH_DELAY);
        let editor = EditorHandle::new("a");
        cache.tokens(&editor, "one");
        assert!(cache.contains(&editor));
        cache.remove(&editor);
        assert!(!cache.contains(&editor));
        assert_eq!(first_value(&cache.tokens(&editor, "two").unwrap()), "two");
    }
}
