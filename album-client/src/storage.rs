//! Durable key-value backends for the cache snapshot.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::StorageError;

/// Persists one string document per namespace.
pub trait CacheStorage: Send + Sync {
    fn load(&self, namespace: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, namespace: &str, contents: &str) -> Result<(), StorageError>;
    fn remove(&self, namespace: &str) -> Result<(), StorageError>;
}

fn check_quota(limit: Option<usize>, contents: &str) -> Result<(), StorageError> {
    match limit {
        Some(limit) if contents.len() > limit => Err(StorageError::QuotaExceeded {
            size: contents.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// Stores each namespace as `<dir>/<namespace>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota: None,
        }
    }

    /// Refuse snapshots larger than `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.json"))
    }
}

impl CacheStorage for FileStorage {
    fn load(&self, namespace: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(namespace);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn save(&self, namespace: &str, contents: &str) -> Result<(), StorageError> {
        check_quota(self.quota, contents)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(namespace), contents)?;
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(namespace)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process storage; survives cache reconstruction but not the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Raw stored document, for inspection.
    pub fn raw(&self, namespace: &str) -> Option<String> {
        self.documents.lock().get(namespace).cloned()
    }

    /// Overwrite the stored document directly.
    pub fn put_raw(&self, namespace: &str, contents: impl Into<String>) {
        self.documents
            .lock()
            .insert(namespace.to_string(), contents.into());
    }
}

impl CacheStorage for MemoryStorage {
    fn load(&self, namespace: &str) -> Result<Option<String>, StorageError> {
        Ok(self.documents.lock().get(namespace).cloned())
    }

    fn save(&self, namespace: &str, contents: &str) -> Result<(), StorageError> {
        check_quota(self.quota, contents)?;
        self.documents
            .lock()
            .insert(namespace.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<(), StorageError> {
        self.documents.lock().remove(namespace);
        Ok(())
    }
}
