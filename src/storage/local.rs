//! Local filesystem storage backend.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{ObjectStorage, StorageResult};
use crate::types::errors::StorageError;

/// URL prefix under which the web layer serves the storage root.
pub const PUBLIC_URL_PREFIX: &str = "/favicons";

/// Stores objects as files below a root directory.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Creates the root directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a key below the root. Rejects absolute paths and `..`.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        let key = key.trim_matches('/');
        if key.is_empty() || key.contains("..") || key.contains('\\') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        for component in Path::new(key).components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(StorageError::InvalidKey(key.to_string()));
            }
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn save(&self, bytes: &[u8], name: &str) -> StorageResult<String> {
        let path = self.key_path(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        tracing::debug!(name, size = bytes.len(), "stored object on disk");
        Ok(name.trim_matches('/').to_string())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let file = self.key_path(path)?;
        match fs::remove_file(&file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn copy(&self, src: &str, dst: &str) -> StorageResult<String> {
        let from = self.key_path(src)?;
        let to = self.key_path(dst)?;
        if !fs::try_exists(&from).await? {
            return Err(StorageError::NotFound(src.to_string()));
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&from, &to).await?;
        Ok(dst.trim_matches('/').to_string())
    }

    async fn url_for(&self, path: &str) -> StorageResult<String> {
        Ok(format!("{}/{}", PUBLIC_URL_PREFIX, path.trim_start_matches('/')))
    }

    async fn delete_folder(&self, prefix: &str) -> StorageResult<()> {
        let dir = self.key_path(prefix)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
