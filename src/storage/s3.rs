//! S3-compatible storage backend using the AWS SDK.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use super::{ObjectStorage, StorageResult};
use crate::types::errors::StorageError;

/// Lifetime of presigned GET URLs.
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

fn map_s3_error<E>(err: aws_sdk_s3::error::SdkError<E>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StorageError::Remote(aws_sdk_s3::error::DisplayErrorContext(err).to_string())
}

pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl std::fmt::Debug for S3Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Storage")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl S3Storage {
    /// Builds a client from the ambient AWS configuration.
    ///
    /// An explicit `endpoint` (MinIO and friends) switches to path-style addressing.
    pub async fn new(
        bucket: &str,
        region: &str,
        endpoint: Option<String>,
        prefix: Option<String>,
    ) -> StorageResult<Self> {
        if bucket.trim().is_empty() {
            return Err(StorageError::Config("S3 bucket name is empty".to_string()));
        }

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint_url) = endpoint.filter(|e| !e.trim().is_empty()) {
            let lower = endpoint_url.to_ascii_lowercase();
            let endpoint_url = if lower.starts_with("http://") || lower.starts_with("https://") {
                endpoint_url
            } else {
                format!("http://{}", endpoint_url)
            };
            builder = builder.endpoint_url(endpoint_url).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
            prefix: prefix
                .map(|p| p.trim_matches('/').to_string())
                .filter(|p| !p.is_empty()),
        })
    }

    /// Object key for a storage path, with the configured prefix applied.
    fn full_key(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, path),
            None => path.to_string(),
        }
    }

    async fn list_keys(&self, full_prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(full_prefix);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(map_s3_error)?;
            keys.extend(output.contents().iter().filter_map(|o| o.key()).map(str::to_string));

            if output.is_truncated() == Some(true) {
                continuation_token = output.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }
        Ok(keys)
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn save(&self, bytes: &[u8], name: &str) -> StorageResult<String> {
        let content_type = if name.ends_with(".png") {
            "image/png"
        } else {
            "application/octet-stream"
        };
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(name))
            .content_type(content_type)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(map_s3_error)?;
        Ok(name.trim_start_matches('/').to_string())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.full_key(path))
            .send()
            .await
            .map_err(map_s3_error)?;
        Ok(())
    }

    async fn copy(&self, src: &str, dst: &str) -> StorageResult<String> {
        // CopySource is `bucket/key` with the key percent-encoded.
        let encoded_key = utf8_percent_encode(&self.full_key(src), NON_ALPHANUMERIC).to_string();
        let copy_source = format!("{}/{}", self.bucket, encoded_key);

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .key(self.full_key(dst))
            .copy_source(copy_source)
            .send()
            .await
            .map_err(map_s3_error)?;
        Ok(dst.trim_start_matches('/').to_string())
    }

    async fn url_for(&self, path: &str) -> StorageResult<String> {
        let config = PresigningConfig::expires_in(PRESIGNED_URL_TTL)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(path))
            .presigned(config)
            .await
            .map_err(map_s3_error)?;
        Ok(request.uri().to_string())
    }

    async fn delete_folder(&self, prefix: &str) -> StorageResult<()> {
        let full_prefix = format!("{}/", self.full_key(prefix.trim_end_matches('/')));
        let keys = self.list_keys(&full_prefix).await?;
        tracing::debug!(prefix = %full_prefix, objects = keys.len(), "deleting S3 folder");

        for key in keys {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(&key)
                .send()
                .await
                .map_err(map_s3_error)?;
        }
        Ok(())
    }
}
