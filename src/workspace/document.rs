use dashmap::DashMap;
use std::sync::Arc;
use tower_lsp::lsp_types::Url;

use crate::completion::EditorHandle;

/// Open buffer under full document sync.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    pub version: i32,
    pub content: Arc<str>,
}

impl Document {
    pub fn new(uri: Url, version: i32, content: String) -> Self {
        Self {
            uri,
            version,
            content: Arc::from(content),
        }
    }

    pub fn editor(&self) -> EditorHandle {
        EditorHandle::new(self.uri.as_str())
    }

    /// Replace the content unless `version` is older than what is stored.
    fn apply_full_change(&mut self, version: i32, content: String) -> bool {
        if version < self.version {
            return false;
        }
        self.version = version;
        self.content = Arc::from(content);
        true
    }
}

pub struct DocumentStore {
    docs: DashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
        }
    }

    pub fn open(&self, doc: Document) {
        self.docs.insert(doc.uri.clone(), doc);
    }

    /// Returns whether the stored content changed.
    pub fn update(&self, uri: &Url, version: i32, content: String) -> bool {
        self.docs
            .get_mut(uri)
            .is_some_and(|mut doc| doc.apply_full_change(version, content))
    }

    pub fn close(&self, uri: &Url) -> Option<Document> {
        self.docs.remove(uri).map(|(_, doc)| doc)
    }

    pub fn get(&self, uri: &Url) -> Option<Document> {
        self.docs.get(uri).map(|d| d.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
