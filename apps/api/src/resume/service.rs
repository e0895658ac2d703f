//! Single-document orchestration: serve a validated cache hit, or render and
//! write back in the background.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::cache::ResumeCache;
use crate::models::application::ApplicationRecord;
use crate::render::RenderError;
use crate::resume::runner::RenderRunner;

#[derive(Debug, Clone)]
pub struct GeneratedResume {
    pub buffer: Bytes,
    pub cached: bool,
}

pub struct ResumeService {
    cache: Arc<ResumeCache>,
    runner: Arc<RenderRunner>,
}

impl ResumeService {
    pub fn new(cache: Arc<ResumeCache>, runner: Arc<RenderRunner>) -> Self {
        Self { cache, runner }
    }

    pub async fn generate(&self, record: &ApplicationRecord) -> Result<GeneratedResume, RenderError> {
        let id = record.cache_id();
        let epoch = self.cache.epoch(&id);

        if self.cache.exists(&id).await {
            match self.cache.get(&id).await {
                Ok(buffer) => {
                    info!("Serving cached resume for {id}");
                    return Ok(GeneratedResume {
                        buffer,
                        cached: true,
                    });
                }
                Err(e) => warn!("Cached resume for {id} unusable, regenerating: {e}"),
            }
        }

        info!("Generating resume for {id}");
        let buffer = self.runner.render(record).await?;
        spawn_write_back(self.cache.clone(), id, buffer.clone(), epoch);

        Ok(GeneratedResume {
            buffer,
            cached: false,
        })
    }

    pub async fn invalidate(&self, id: &str) {
        self.cache.invalidate(id).await;
    }

    pub async fn cached_url(&self, id: &str) -> Option<String> {
        self.cache.public_url(id).await
    }
}

/// Persists a freshly rendered document without holding up the caller.
/// `epoch` is the cache epoch taken before rendering.
pub(crate) fn spawn_write_back(cache: Arc<ResumeCache>, id: String, buffer: Bytes, epoch: u64) {
    tokio::spawn(async move {
        if let Err(e) = cache.put(&id, buffer, epoch).await {
            warn!("Background cache write failed for {id}: {e}");
        }
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::ExistenceCache;
    use crate::testing::{sample_record, MemoryObjectStore, ScriptedRenderer};

    struct Fixture {
        store: Arc<MemoryObjectStore>,
        renderer: Arc<ScriptedRenderer>,
        service: ResumeService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryObjectStore::default());
        let renderer = Arc::new(ScriptedRenderer::default());
        let cache = Arc::new(ResumeCache::new(
            store.clone(),
            ExistenceCache::new(16, Duration::from_secs(3600)),
            "job-applications",
            Duration::from_secs(5),
        ));
        let runner = Arc::new(RenderRunner::new(renderer.clone(), Duration::from_secs(5), 2));
        Fixture {
            store,
            renderer,
            service: ResumeService::new(cache, runner),
        }
    }

    fn key_for(record: &ApplicationRecord) -> String {
        format!("job-applications/{}.pdf", record.id)
    }

    #[tokio::test]
    async fn test_miss_renders_then_hit_serves_cache() {
        let f = fixture();
        let record = sample_record();

        let first = f.service.generate(&record).await.unwrap();
        assert!(!first.cached);
        assert!(first.buffer.starts_with(b"%PDF"));

        f.store.wait_for(&key_for(&record)).await;
        let second = f.service.generate(&record).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.buffer, first.buffer);
        assert_eq!(f.renderer.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_regeneration() {
        let f = fixture();
        let record = sample_record();
        f.service.generate(&record).await.unwrap();
        f.store.wait_for(&key_for(&record)).await;

        f.service.invalidate(&record.cache_id()).await;
        let after_invalidate = f.service.generate(&record).await.unwrap();
        assert!(!after_invalidate.cached);

        f.store.wait_for(&key_for(&record)).await;
        let later = f.service.generate(&record).await.unwrap();
        assert!(later.cached);
    }

    #[tokio::test]
    async fn test_invalidate_right_after_miss_is_not_undone() {
        let f = fixture();
        let record = sample_record();

        let first = f.service.generate(&record).await.unwrap();
        assert!(!first.cached);
        f.service.invalidate(&record.cache_id()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(f.store.object_count(), 0);
        let next = f.service.generate(&record).await.unwrap();
        assert!(!next.cached);
        assert_eq!(f.renderer.calls(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_heals() {
        let f = fixture();
        let record = sample_record();
        f.store
            .insert_raw(&key_for(&record), Bytes::from_static(b"%PDF-truncated"));

        let result = f.service.generate(&record).await.unwrap();
        assert!(!result.cached);
        assert!(result.buffer.len() > 100);

        // the write-back replaces the corrupt object
        for _ in 0..200 {
            if f.store.object(&key_for(&record)) == Some(result.buffer.clone()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("corrupt object was never replaced");
    }

    #[tokio::test]
    async fn test_download_failure_falls_back_to_render() {
        let f = fixture();
        let record = sample_record();
        f.store.insert_raw(&key_for(&record), crate::testing::valid_pdf_bytes());
        f.store.fail_downloads(true);

        let result = f.service.generate(&record).await.unwrap();
        assert!(!result.cached);
        assert_eq!(f.renderer.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_back_does_not_fail_request() {
        let f = fixture();
        f.store.fail_uploads(true);

        let result = f.service.generate(&sample_record()).await.unwrap();
        assert!(!result.cached);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(f.store.object_count(), 0);
        assert!(f.store.upload_calls() >= 1);
    }

    #[tokio::test]
    async fn test_render_error_propagates() {
        let f = fixture();
        let record = ApplicationRecord {
            full_name: None,
            ..sample_record()
        };
        let err = f.service.generate(&record).await.unwrap_err();
        assert!(matches!(err, RenderError::Input { .. }));
        assert_eq!(f.store.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_cached_url_requires_cached_document() {
        let f = fixture();
        let record = sample_record();
        assert_eq!(f.service.cached_url(&record.cache_id()).await, None);

        f.service.generate(&record).await.unwrap();
        f.store.wait_for(&key_for(&record)).await;
        assert_eq!(
            f.service.cached_url(&record.cache_id()).await,
            Some(format!("memory://{}", key_for(&record)))
        );
    }
}
