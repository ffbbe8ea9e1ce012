//! Backend doubles for exercising sync failure paths in tests.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::prefs::{BackendError, Document, MemoryBackend, SyncBackend};

/// How a [`FlakyBackend`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlakyMode {
    /// `fetch` returns an error.
    Error,
    /// `fetch` returns `Ok(None)`: the call succeeds but nothing
    /// materializes.
    Silent,
}

/// Backend that fails the first N fetches, then delegates to an
/// in-memory backend.
pub(crate) struct FlakyBackend {
    remaining: AtomicU32,
    mode: FlakyMode,
    inner: MemoryBackend,
}

impl FlakyBackend {
    /// Fails the first `failures` fetches in the given mode.
    pub(crate) fn failing(failures: u32, mode: FlakyMode) -> Self {
        Self {
            remaining: AtomicU32::new(failures),
            mode,
            inner: MemoryBackend::new(),
        }
    }

    /// Like [`FlakyBackend::failing`], with a pre-seeded document behind
    /// the failures.
    pub(crate) fn with_document(failures: u32, mode: FlakyMode, doc: Document) -> Self {
        Self {
            remaining: AtomicU32::new(failures),
            mode,
            inner: MemoryBackend::with_document(doc),
        }
    }

    /// Count of fetches that will still fail.
    pub(crate) fn failures_left(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncBackend for FlakyBackend {
    async fn fetch(&self) -> Result<Option<Document>, BackendError> {
        let remaining = self.remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining.store(remaining - 1, Ordering::SeqCst);
            return match self.mode {
                FlakyMode::Error => Err(BackendError::Unavailable("injected failure".into())),
                FlakyMode::Silent => Ok(None),
            };
        }
        self.inner.fetch().await
    }

    async fn persist(&self, doc: &Document) -> Result<(), BackendError> {
        self.inner.persist(doc).await
    }
}
