//! Document persistence boundary.
//!
//! The engine never talks to a backend mid-operation; callers load a
//! [`Document`] through a [`DocumentStore`], edit or export it, and save it
//! back. Documents cross the boundary in the JSON exchange format.

use crate::error::EngineError;
use crate::pages::Document;
use std::collections::BTreeMap;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::RwLock;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<EngineError> for StorageError {
    fn from(err: EngineError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Load/save boundary for documents, keyed by id.
pub trait DocumentStore: Send + Sync {
    /// Save a document.
    fn save(&self, id: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a document.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>>;

    /// Delete a document.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all document IDs.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a document exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

/// In-memory store for tests and ephemeral use.
///
/// Documents are kept serialized so a load always yields an independent copy.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn save(&self, id: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let json = document.to_json();
        Box::pin(async move {
            let json = json?;
            let mut docs = self.documents.write().map_err(lock_error)?;
            docs.insert(id, json);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            let json = docs.get(&id).ok_or_else(|| StorageError::NotFound(id.clone()))?;
            Ok(Document::from_json(json)?)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut docs = self.documents.write().map_err(lock_error)?;
            docs.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            Ok(docs.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            Ok(docs.contains_key(&id))
        })
    }
}

/// Stores documents as JSON files in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a file store, creating the directory if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::Io(format!("Failed to create storage directory: {e}"))
        })?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn document_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_id}.json"))
    }
}

impl DocumentStore for FileStore {
    fn save(&self, id: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(id);
        let json = document.to_json();
        Box::pin(async move {
            let json = json?;
            fs::write(&path, json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let path = self.document_path(id);
        let id = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))?;
            Ok(Document::from_json(&json)?)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {e}", path.display()))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to list {}: {e}", base.display())))?;
            let mut ids: Vec<String> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.document_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SceneObject;
    use kurbo::Rect;
    use pollster::block_on;

    fn document() -> Document {
        let mut doc = Document::new("Poster", 600, 800).unwrap();
        doc.current_mut()
            .add(SceneObject::rectangle(Rect::new(10.0, 10.0, 110.0, 60.0)));
        doc
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let doc = document();

        block_on(store.save("test", &doc)).unwrap();
        let loaded = block_on(store.load("test")).unwrap();

        assert_eq!(doc, loaded);
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        let result = block_on(store.load("nonexistent"));

        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let store = MemoryStore::new();
        let doc = document();

        assert!(!block_on(store.exists("test")).unwrap());
        block_on(store.save("test", &doc)).unwrap();
        assert!(block_on(store.exists("test")).unwrap());
        block_on(store.delete("test")).unwrap();
        assert!(!block_on(store.exists("test")).unwrap());
    }

    #[test]
    fn test_list_sorted() {
        let store = MemoryStore::new();
        let doc = document();

        block_on(store.save("doc2", &doc)).unwrap();
        block_on(store.save("doc1", &doc)).unwrap();

        assert_eq!(block_on(store.list()).unwrap(), vec!["doc1", "doc2"]);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("docs")).unwrap();
        let doc = document();

        block_on(store.save("my doc", &doc)).unwrap();
        assert!(store.base_path().join("my_doc.json").exists());
        assert_eq!(block_on(store.list()).unwrap(), vec!["my_doc"]);

        let loaded = block_on(store.load("my doc")).unwrap();
        assert_eq!(loaded, doc);

        block_on(store.delete("my doc")).unwrap();
        assert!(matches!(
            block_on(store.load("my doc")),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        assert!(matches!(
            block_on(store.load("bad")),
            Err(StorageError::Serialization(_))
        ));
    }
}
