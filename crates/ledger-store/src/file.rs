//! Document store persisted as a single JSON file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::document::{DocFilter, Document, MAX_BATCH_OPS, OrderBy, WriteOp};
use crate::error::{Result, StoreError};
use crate::store::{Collections, DocumentStore, apply_ops, select};

/// Document store backed by one JSON file.
///
/// Every write reads the file, applies the whole batch in memory and replaces
/// the file through a temp file + rename, so a batch is either fully on disk
/// or not at all.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: Arc<PathBuf>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
    max_batch_ops: usize,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            max_batch_ops: MAX_BATCH_OPS,
        }
    }

    #[must_use]
    pub fn with_max_batch_ops(mut self, max: usize) -> Self {
        self.max_batch_ops = max;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Collections> {
        let path = Arc::clone(&self.path);
        tokio::task::spawn_blocking(move || read_collections(&path))
            .await
            .map_err(|source| StoreError::Task { source })?
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let collections = self.read_all().await?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    async fn set(&self, collection: &str, key: &str, value: Document) -> Result<()> {
        self.batch_write(vec![WriteOp::set(collection, key, value)])
            .await
    }

    async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<()> {
        if ops.len() > self.max_batch_ops {
            return Err(StoreError::BatchTooLarge {
                size: ops.len(),
                max: self.max_batch_ops,
            });
        }
        let _guard = self.write_lock.lock().await;
        let path = Arc::clone(&self.path);
        let count = ops.len();
        tokio::task::spawn_blocking(move || {
            let mut collections = read_collections(&path)?;
            apply_ops(&mut collections, ops);
            write_collections(&collections, &path)
        })
        .await
        .map_err(|source| StoreError::Task { source })??;
        tracing::debug!(operations = count, path = %self.path.display(), "batch written");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filter: &DocFilter,
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<(String, Document)>> {
        let collections = self.read_all().await?;
        Ok(select(&collections, collection, filter, order_by))
    }
}

/// Reads the store file; a missing file is an empty store.
fn read_collections(path: &Path) -> Result<Collections> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Collections::new());
        }
        Err(source) => {
            return Err(StoreError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Collections::new());
    }
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Deserialization {
        what: format!("store file {}", path.display()),
        source,
    })
}

/// Writes the store file atomically (temp file + rename).
fn write_collections(collections: &Collections, path: &Path) -> Result<()> {
    let bytes =
        serde_json::to_vec_pretty(collections).map_err(|source| StoreError::Serialization {
            collection: "*".to_string(),
            key: "*".to_string(),
            source,
        })?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|source| StoreError::Io {
        operation: "create",
        path: temp_path.clone(),
        source,
    })?;
    file.write_all(&bytes).map_err(|source| StoreError::Io {
        operation: "write",
        path: temp_path.clone(),
        source,
    })?;
    file.sync_all().map_err(|source| StoreError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source,
    })?;

    fs::rename(&temp_path, path).map_err(|source| StoreError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source,
    })
}
