//! Durable object storage behind a narrow trait.
//!
//! `S3ObjectStore` talks to MinIO locally and AWS S3 in production. The cache
//! only ever needs upload, prefix listing, download, public URLs and removal.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage {op} failed for '{key}': {message}")]
    Request {
        op: &'static str,
        key: String,
        message: String,
    },

    #[error("storage {op} timed out after {secs}s for '{key}'")]
    Timeout {
        op: &'static str,
        key: String,
        secs: u64,
    },
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub content_type: &'static str,
    pub cache_control: Option<&'static str>,
}

/// One object returned by a prefix listing. `name` is relative to the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub name: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` at `key`, replacing any existing object.
    async fn upload(&self, key: &str, body: Bytes, options: UploadOptions) -> Result<(), StorageError>;

    /// Lists objects directly under `prefix` whose name starts with `search`.
    async fn list(&self, prefix: &str, search: &str) -> Result<Vec<ObjectEntry>, StorageError>;

    async fn download(&self, key: &str) -> Result<Bytes, StorageError>;

    fn public_url(&self, key: &str) -> String;

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError>;
}

// ────────────────────────────────────────────────────────────────────────────
// S3 backend
// ────────────────────────────────────────────────────────────────────────────

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn request_error(op: &'static str, key: &str, err: impl std::error::Error) -> StorageError {
    StorageError::Request {
        op,
        key: key.to_string(),
        message: DisplayErrorContext(err).to_string(),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, key: &str, body: Bytes, options: UploadOptions) -> Result<(), StorageError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(options.content_type);
        if let Some(cache_control) = options.cache_control {
            request = request.cache_control(cache_control);
        }
        request
            .send()
            .await
            .map_err(|e| request_error("upload", key, e))?;
        Ok(())
    }

    async fn list(&self, prefix: &str, search: &str) -> Result<Vec<ObjectEntry>, StorageError> {
        let folder = format!("{}/", prefix.trim_end_matches('/'));
        let full_prefix = format!("{folder}{search}");
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&full_prefix)
            .send()
            .await
            .map_err(|e| request_error("list", &full_prefix, e))?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| {
                let name = object.key()?.strip_prefix(&folder)?;
                Some(ObjectEntry {
                    name: name.to_string(),
                })
            })
            .collect())
    }

    async fn download(&self, key: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| request_error("download", key, e))?;
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| request_error("download", key, e))?;
        Ok(data.into_bytes())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| request_error("remove", key, e))?;
        }
        Ok(())
    }
}
