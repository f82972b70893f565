//! Object storage for favicon images.
//!
//! Exactly one backend is active per process. Callers hold an
//! `Arc<dyn ObjectStorage>` and never learn which one.

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::errors::StorageError;
use crate::types::settings::StorageSettings;

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Namespace holding the favicon copies owned by the ranking cache.
pub const RANKING_NAMESPACE: &str = "ranking";

pub type StorageResult<T> = Result<T, StorageError>;

/// Capability interface shared by all storage backends.
///
/// Paths are relative, `/`-separated keys such as `user-1/abc.png`.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `name` and returns the stored path.
    async fn save(&self, bytes: &[u8], name: &str) -> StorageResult<String>;
    /// Removes one object. Removing a missing object succeeds.
    async fn delete(&self, path: &str) -> StorageResult<()>;
    /// Copies `src` to `dst` and returns the new path.
    async fn copy(&self, src: &str, dst: &str) -> StorageResult<String>;
    /// Public URL a client can load the object from.
    async fn url_for(&self, path: &str) -> StorageResult<String>;
    /// Removes every object under `prefix/`.
    async fn delete_folder(&self, prefix: &str) -> StorageResult<()>;
    /// Removes a whole namespace, e.g. [`RANKING_NAMESPACE`].
    async fn clear_namespace(&self, namespace: &str) -> StorageResult<()> {
        self.delete_folder(namespace).await
    }
}

/// Path of the ranking copy of a stored favicon: `ranking/<file name>`.
pub fn ranking_copy_path(src: &str) -> String {
    let file_name = src.rsplit('/').next().unwrap_or(src);
    format!("{}/{}", RANKING_NAMESPACE, file_name)
}

/// Builds the backend selected in settings.
pub async fn from_settings(settings: &StorageSettings) -> StorageResult<Arc<dyn ObjectStorage>> {
    match settings {
        StorageSettings::Local { directory } => {
            tracing::info!(directory = %directory, "using local favicon storage");
            Ok(Arc::new(LocalStorage::new(directory).await?))
        }
        #[cfg(feature = "s3")]
        StorageSettings::S3 {
            bucket,
            region,
            endpoint,
            prefix,
        } => {
            tracing::info!(bucket = %bucket, region = %region, "using S3 favicon storage");
            Ok(Arc::new(
                S3Storage::new(bucket, region, endpoint.clone(), prefix.clone()).await?,
            ))
        }
        #[cfg(not(feature = "s3"))]
        StorageSettings::S3 { .. } => Err(StorageError::Config(
            "S3 storage requested but linkshelf was built without the `s3` feature".to_string(),
        )),
    }
}
