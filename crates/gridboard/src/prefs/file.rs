//! File-backed preference storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::prefs::{migration, BackendError, Document, SyncBackend};

/// Backend that stores the preference document as pretty-printed JSON.
///
/// A missing or malformed file is treated as an absent document and
/// fetches as empty (a first login), never as an error. Writes go
/// through a temp file and rename so a crash mid-write cannot corrupt
/// the stored document.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    legacy_path: Option<PathBuf>,
}

impl FileBackend {
    /// Creates a backend storing at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            legacy_path: None,
        }
    }

    /// Creates a backend that also checks `legacy` during migration.
    pub fn with_legacy(path: PathBuf, legacy: PathBuf) -> Self {
        Self {
            path,
            legacy_path: Some(legacy),
        }
    }

    /// Path of the stored document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the stored document. Missing and malformed files
    /// both come back as `None`.
    fn read_document(&self) -> Result<Option<Document>, BackendError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(e)),
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(value) => match Document::from_value(value) {
                Some(doc) => Ok(Some(doc)),
                None => {
                    tracing::warn!(
                        "preference document at {:?} is not a JSON object, treating as absent",
                        self.path
                    );
                    Ok(None)
                }
            },
            Err(e) => {
                tracing::warn!(
                    "malformed preference document at {:?}: {}, treating as absent",
                    self.path,
                    e
                );
                Ok(None)
            }
        }
    }

    fn write_document(&self, doc: &Document) -> Result<(), BackendError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&doc.to_value())
            .expect("a JSON object always serializes");
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn read_legacy(&self) -> Option<Value> {
        let legacy_path = self.legacy_path.as_ref()?;
        let content = match fs::read_to_string(legacy_path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!("cannot read legacy layout at {:?}: {}", legacy_path, e);
                }
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("malformed legacy layout at {:?}: {}", legacy_path, e);
                None
            }
        }
    }
}

#[async_trait]
impl SyncBackend for FileBackend {
    async fn fetch(&self) -> Result<Option<Document>, BackendError> {
        // Absent and malformed both materialize as an empty document so
        // that a first login counts as loaded and proceeds with catalog
        // defaults.
        Ok(Some(self.read_document()?.unwrap_or_default()))
    }

    async fn persist(&self, doc: &Document) -> Result<(), BackendError> {
        self.write_document(doc)
    }

    async fn migrate(&self) -> Result<bool, BackendError> {
        let mut doc = self.read_document()?.unwrap_or_default();
        if migration::schema_version(&doc) >= migration::CURRENT_SCHEMA_VERSION {
            return Ok(false);
        }
        let legacy = self.read_legacy();
        let changed = migration::fold_legacy(&mut doc, legacy.as_ref());
        self.write_document(&doc)?;
        Ok(changed)
    }
}
