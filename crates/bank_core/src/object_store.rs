//! Object store contract plus the in-process implementations.
//!
//! A write either fully succeeds or fully fails: no reader ever observes a
//! partially written object. Cloud-backed stores live in `bank_pipeline`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, body: &[u8], content_type: &str)
        -> Result<(), StoreError>;

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Keys under `prefix`, sorted ascending.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn put_object(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        (**self).put_object(key, body, content_type).await
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        (**self).get_object(key).await
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_objects(prefix).await
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete_object(key).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(key).cloned())
    }

    fn objects(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredObject>>, StoreError> {
        self.objects
            .lock()
            .map_err(|_| StoreError::Transport("in-memory object store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.objects()?.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects()?
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .objects()?
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.objects()?.remove(key);
        Ok(())
    }
}

/// Stores objects as files below `root`; keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalFsObjectStore {
    root: PathBuf,
}

const TEMP_FILE_PREFIX: &str = ".tmp";

impl LocalFsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(StoreError::Transport(format!("invalid object key '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalFsObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: &[u8],
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let body = body.to_vec();

        tokio::task::spawn_blocking(move || write_atomically(&path, &body))
            .await
            .map_err(|error| StoreError::Transport(format!("write task failed: {error}")))?
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(error) => Err(StoreError::Transport(format!(
                "failed to read '{}': {error}",
                path.display()
            ))),
        }
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let root = self.root.clone();
        let prefix = prefix.to_string();

        tokio::task::spawn_blocking(move || list_files(&root, &prefix))
            .await
            .map_err(|error| StoreError::Transport(format!("list task failed: {error}")))?
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StoreError::Transport(format!(
                "failed to delete '{}': {error}",
                path.display()
            ))),
        }
    }
}

fn write_atomically(path: &Path, body: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Transport(format!("'{}' has no parent", path.display())))?;
    std::fs::create_dir_all(parent).map_err(|error| {
        StoreError::Transport(format!("failed to create '{}': {error}", parent.display()))
    })?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(parent)
        .map_err(|error| StoreError::Transport(format!("failed to create temp file: {error}")))?;
    temp.write_all(body)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|error| StoreError::Transport(format!("failed to write temp file: {error}")))?;
    temp.persist(path).map_err(|error| {
        StoreError::Transport(format!("failed to publish '{}': {error}", path.display()))
    })?;
    Ok(())
}

fn list_files(root: &Path, prefix: &str) -> Result<Vec<String>, StoreError> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut keys = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry
            .map_err(|error| StoreError::Transport(format!("failed to list objects: {error}")))?;
        if !entry.file_type().is_file()
            || entry
                .file_name()
                .to_string_lossy()
                .starts_with(TEMP_FILE_PREFIX)
        {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let key = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if key.starts_with(prefix) {
            keys.push(key);
        }
    }

    keys.sort();
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_reports_missing_key() {
        let store = InMemoryObjectStore::new();
        let error = store
            .get_object("bank_data/missing.csv")
            .await
            .expect_err("missing key should fail");
        assert_eq!(
            error,
            StoreError::NotFound {
                key: "bank_data/missing.csv".to_string()
            }
        );
    }

    #[tokio::test]
    async fn in_memory_store_overwrites_and_lists_by_prefix() {
        let store = InMemoryObjectStore::new();
        store.put_object("a/1.csv", b"one", "text/csv").await.expect("put");
        store.put_object("a/1.csv", b"uno", "text/csv").await.expect("put");
        store.put_object("b/2.csv", b"two", "text/csv").await.expect("put");

        assert_eq!(store.get_object("a/1.csv").await.expect("get"), b"uno");
        assert_eq!(store.list_objects("a/").await.expect("list"), vec!["a/1.csv"]);
        assert_eq!(
            store.object("b/2.csv").map(|o| o.content_type),
            Some("text/csv".to_string())
        );
    }

    #[test]
    fn local_store_rejects_parent_traversal() {
        let store = LocalFsObjectStore::new("/tmp/objects");
        assert!(store.path_for("../escape.csv").is_err());
        assert!(store.path_for("/absolute.csv").is_err());
        assert!(store.path_for("bank_data/x.csv").is_ok());
    }
}
