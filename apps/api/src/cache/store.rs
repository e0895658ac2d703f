//! Resume cache: application id → rendered PDF bytes.
//!
//! Durable storage is the source of truth; `ExistenceCache` only saves the
//! listing round trip for ids recently confirmed present. Every storage call
//! is bounded by `op_timeout`.
//!
//! Each id carries an epoch that `invalidate` bumps. Writers capture it before
//! rendering and `put` drops the write if the id was invalidated since.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::existence::ExistenceCache;
use crate::cache::storage::{ObjectStore, StorageError, UploadOptions};
use crate::render::check_pdf_bytes;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const OBJECT_CACHE_CONTROL: &str = "max-age=3600";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("no cached document for {0}")]
    NotFound(String),

    #[error("cached document for {id} is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of a bulk existence check.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheSplit {
    pub cached: Vec<String>,
    pub uncached: Vec<String>,
}

pub struct ResumeCache {
    store: Arc<dyn ObjectStore>,
    existence: ExistenceCache,
    epochs: Mutex<HashMap<String, u64>>,
    namespace: String,
    op_timeout: Duration,
}

impl ResumeCache {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        existence: ExistenceCache,
        namespace: impl Into<String>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            store,
            existence,
            epochs: Mutex::new(HashMap::new()),
            namespace: namespace.into(),
            op_timeout,
        }
    }

    fn file_name(id: &str) -> String {
        format!("{id}.pdf")
    }

    /// `{namespace}/{id}.pdf`, derived from the id alone.
    pub fn object_key(&self, id: &str) -> String {
        format!("{}/{}", self.namespace, Self::file_name(id))
    }

    async fn bounded<T, F>(&self, op: &'static str, key: &str, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout {
                op,
                key: key.to_string(),
                secs: self.op_timeout.as_secs(),
            }),
        }
    }

    /// Whether durable storage holds a document for `id`.
    ///
    /// Storage errors read as "not cached"; the caller falls back to
    /// rendering. Absence is never remembered.
    pub async fn exists(&self, id: &str) -> bool {
        if self.existence.contains(id) {
            debug!("Existence cache hit for {id}");
            return true;
        }

        let file_name = Self::file_name(id);
        let listing = self
            .bounded(
                "list",
                &self.object_key(id),
                self.store.list(&self.namespace, &file_name),
            )
            .await;

        match listing {
            Ok(entries) => {
                let found = entries.iter().any(|entry| entry.name == file_name);
                if found {
                    self.existence.mark_present(id);
                }
                found
            }
            Err(e) => {
                warn!("Existence check failed for {id}, treating as uncached: {e}");
                false
            }
        }
    }

    /// Fetches and validates the cached document.
    pub async fn get(&self, id: &str) -> Result<Bytes, CacheError> {
        if !self.exists(id).await {
            return Err(CacheError::NotFound(id.to_string()));
        }

        let key = self.object_key(id);
        let bytes = self
            .bounded("download", &key, self.store.download(&key))
            .await?;

        let check = check_pdf_bytes(&bytes);
        if !check.is_valid() {
            warn!("Cached PDF for {id} is corrupt ({}), will regenerate", check.describe());
            self.existence.forget(id);
            return Err(CacheError::Corrupt {
                id: id.to_string(),
                reason: check.describe(),
            });
        }
        Ok(bytes)
    }

    /// Invalidation count for `id`; pass it back to `put`.
    pub fn epoch(&self, id: &str) -> u64 {
        self.epochs.lock().get(id).copied().unwrap_or(0)
    }

    /// Upserts the document rendered at `epoch`. Returns `Ok(false)` when the
    /// id was invalidated after `epoch` was taken; nothing is left behind in
    /// that case. The existence cache is only updated once the upload has
    /// succeeded.
    pub async fn put(&self, id: &str, bytes: Bytes, epoch: u64) -> Result<bool, CacheError> {
        if self.epoch(id) != epoch {
            debug!("Skipping cache write for {id}: invalidated during render");
            return Ok(false);
        }

        let key = self.object_key(id);
        let len = bytes.len();
        let options = UploadOptions {
            content_type: PDF_CONTENT_TYPE,
            cache_control: Some(OBJECT_CACHE_CONTROL),
        };
        self.bounded("upload", &key, self.store.upload(&key, bytes, options))
            .await?;

        {
            let epochs = self.epochs.lock();
            if epochs.get(id).copied().unwrap_or(0) == epoch {
                self.existence.mark_present(id);
                info!("Cached PDF for {id} ({len} bytes)");
                return Ok(true);
            }
        }

        // invalidated while uploading; its delete may have run first
        let keys = vec![key.clone()];
        if let Err(e) = self.bounded("remove", &key, self.store.remove(&keys)).await {
            warn!("Failed to drop stale cached PDF for {id}: {e}");
        }
        Ok(false)
    }

    /// Drops the document from both layers and retires any in-flight write.
    /// Best effort: a failed delete is logged, since the next `exists`
    /// re-reads storage anyway.
    pub async fn invalidate(&self, id: &str) {
        *self.epochs.lock().entry(id.to_string()).or_insert(0) += 1;
        self.existence.forget(id);

        let key = self.object_key(id);
        let keys = vec![key.clone()];
        match self.bounded("remove", &key, self.store.remove(&keys)).await {
            Ok(()) => info!("Invalidated cached PDF for {id}"),
            Err(e) => warn!("Failed to delete cached PDF for {id}: {e}"),
        }
    }

    /// Splits ids into cached and uncached, checking all of them concurrently.
    pub async fn check_many(&self, ids: &[String]) -> CacheSplit {
        let results = join_all(ids.iter().map(|id| async move { (id, self.exists(id).await) })).await;

        let mut split = CacheSplit::default();
        for (id, exists) in results {
            if exists {
                split.cached.push(id.clone());
            } else {
                split.uncached.push(id.clone());
            }
        }
        split
    }

    /// Public URL of the cached document, if there is one.
    pub async fn public_url(&self, id: &str) -> Option<String> {
        if self.exists(id).await {
            Some(self.store.public_url(&self.object_key(id)))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{valid_pdf_bytes, MemoryObjectStore};

    const ID: &str = "0b6f3c4e-1d2a-4b8c-9e7f-112233445566";

    fn cache_with(store: Arc<MemoryObjectStore>) -> ResumeCache {
        ResumeCache::new(
            store,
            ExistenceCache::new(16, Duration::from_secs(3600)),
            "job-applications",
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_object_key_is_derived_from_id() {
        let cache = cache_with(Arc::new(MemoryObjectStore::default()));
        assert_eq!(cache.object_key(ID), format!("job-applications/{ID}.pdf"));
    }

    #[tokio::test]
    async fn test_put_twice_keeps_single_object() {
        let store = Arc::new(MemoryObjectStore::default());
        let cache = cache_with(store.clone());
        let pdf = valid_pdf_bytes();

        cache.put(ID, pdf.clone(), 0).await.unwrap();
        cache.put(ID, pdf.clone(), 0).await.unwrap();

        assert_eq!(store.object_count(), 1);
        assert_eq!(cache.get(ID).await.unwrap(), pdf);
    }

    #[tokio::test]
    async fn test_exists_populates_memory_and_skips_second_listing() {
        let store = Arc::new(MemoryObjectStore::default());
        store.insert_raw(&format!("job-applications/{ID}.pdf"), valid_pdf_bytes());
        let cache = cache_with(store.clone());

        assert!(cache.exists(ID).await);
        assert!(cache.exists(ID).await);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_absence_is_not_cached() {
        let store = Arc::new(MemoryObjectStore::default());
        let cache = cache_with(store.clone());

        assert!(!cache.exists(ID).await);
        store.insert_raw(&format!("job-applications/{ID}.pdf"), valid_pdf_bytes());
        assert!(cache.exists(ID).await);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_prefix_match_is_not_existence() {
        let store = Arc::new(MemoryObjectStore::default());
        store.insert_raw(&format!("job-applications/{ID}.pdf.bak"), valid_pdf_bytes());
        let cache = cache_with(store);
        assert!(!cache.exists(ID).await);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_reported_and_forgotten() {
        let store = Arc::new(MemoryObjectStore::default());
        store.insert_raw(
            &format!("job-applications/{ID}.pdf"),
            Bytes::from_static(b"<html>not a pdf</html>"),
        );
        let cache = cache_with(store.clone());

        let err = cache.get(ID).await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { .. }));
        // memory entry dropped, so the next lookup goes back to storage
        cache.exists(ID).await;
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let cache = cache_with(Arc::new(MemoryObjectStore::default()));
        assert_eq!(cache.get(ID).await, Err(CacheError::NotFound(ID.to_string())));
    }

    #[tokio::test]
    async fn test_list_failure_reads_as_uncached() {
        let store = Arc::new(MemoryObjectStore::default());
        store.insert_raw(&format!("job-applications/{ID}.pdf"), valid_pdf_bytes());
        store.fail_lists(true);
        let cache = cache_with(store);
        assert!(!cache.exists(ID).await);
    }

    #[tokio::test]
    async fn test_failed_upload_does_not_mark_present() {
        let store = Arc::new(MemoryObjectStore::default());
        store.fail_uploads(true);
        let cache = cache_with(store.clone());

        let err = cache.put(ID, valid_pdf_bytes(), 0).await.unwrap_err();
        assert!(matches!(err, CacheError::Storage(_)));
        assert!(!cache.exists(ID).await);
    }

    #[tokio::test]
    async fn test_invalidate_removes_both_layers() {
        let store = Arc::new(MemoryObjectStore::default());
        let cache = cache_with(store.clone());
        cache.put(ID, valid_pdf_bytes(), 0).await.unwrap();

        cache.invalidate(ID).await;
        assert_eq!(store.object_count(), 0);
        assert!(!cache.exists(ID).await);
    }

    #[tokio::test]
    async fn test_put_after_invalidate_is_dropped() {
        let store = Arc::new(MemoryObjectStore::default());
        let cache = cache_with(store.clone());
        let epoch = cache.epoch(ID);

        cache.invalidate(ID).await;
        assert_eq!(cache.epoch(ID), epoch + 1);
        assert!(!cache.put(ID, valid_pdf_bytes(), epoch).await.unwrap());
        assert_eq!(store.upload_calls(), 0);
        assert!(!cache.exists(ID).await);

        assert!(cache.put(ID, valid_pdf_bytes(), cache.epoch(ID)).await.unwrap());
        assert!(cache.exists(ID).await);
    }

    #[tokio::test]
    async fn test_invalidate_swallows_storage_failure() {
        let store = Arc::new(MemoryObjectStore::default());
        let cache = cache_with(store.clone());
        cache.put(ID, valid_pdf_bytes(), 0).await.unwrap();
        store.fail_removes(true);

        cache.invalidate(ID).await;
        // object survived, and storage is re-consulted rather than trusting memory
        assert!(cache.exists(ID).await);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_check_many_splits_ids() {
        let store = Arc::new(MemoryObjectStore::default());
        let cache = cache_with(store);
        cache.put("a", valid_pdf_bytes(), 0).await.unwrap();

        let split = cache
            .check_many(&["a".to_string(), "b".to_string()])
            .await;
        assert_eq!(split.cached, vec!["a".to_string()]);
        assert_eq!(split.uncached, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_public_url_only_for_cached() {
        let store = Arc::new(MemoryObjectStore::default());
        let cache = cache_with(store);
        assert_eq!(cache.public_url(ID).await, None);
        cache.put(ID, valid_pdf_bytes(), 0).await.unwrap();
        assert_eq!(
            cache.public_url(ID).await,
            Some(format!("memory://job-applications/{ID}.pdf"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_storage_times_out() {
        let store = Arc::new(MemoryObjectStore::default());
        store.stall_downloads(true);
        let cache = cache_with(store);
        cache.put(ID, valid_pdf_bytes(), 0).await.unwrap();

        let err = cache.get(ID).await.unwrap_err();
        assert!(matches!(
            err,
            CacheError::Storage(StorageError::Timeout { op: "download", .. })
        ));
    }
}
