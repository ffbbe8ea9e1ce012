//! In-memory backend for tests and ephemeral sessions.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::prefs::{BackendError, Document, SyncBackend};

/// Backend that keeps the persisted document in memory.
///
/// A store with nothing persisted yet fetches as an empty document, so
/// the first login counts as loaded.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stored: Mutex<Option<Document>>,
}

impl MemoryBackend {
    /// Creates a backend with nothing persisted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with a document.
    pub fn with_document(doc: Document) -> Self {
        Self {
            stored: Mutex::new(Some(doc)),
        }
    }

    /// Returns what has been persisted so far, if anything.
    pub fn contents(&self) -> Option<Document> {
        self.stored.lock().expect("backend mutex poisoned").clone()
    }
}

#[async_trait]
impl SyncBackend for MemoryBackend {
    async fn fetch(&self) -> Result<Option<Document>, BackendError> {
        let stored = self.stored.lock().expect("backend mutex poisoned");
        Ok(Some(stored.clone().unwrap_or_default()))
    }

    async fn persist(&self, doc: &Document) -> Result<(), BackendError> {
        let mut stored = self.stored.lock().expect("backend mutex poisoned");
        *stored = Some(doc.clone());
        Ok(())
    }
}
