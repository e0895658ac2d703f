//! Many-document orchestration for bulk export.
//!
//! Existence checks and cache fetches run concurrently and uncapped. Misses
//! are rendered in sequential chunks of at most `concurrency` renders. A
//! failing document is recorded and skipped; it never fails the batch.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::ResumeCache;
use crate::models::application::ApplicationRecord;
use crate::resume::runner::RenderRunner;
use crate::resume::service::spawn_write_back;
use crate::resume::validation::{check_batch_size, BulkRequestError};

#[derive(Debug, Clone)]
pub struct BulkDocument {
    pub id: Uuid,
    pub buffer: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: Uuid,
    pub reason: String,
}

/// `documents` is unordered; join by `id`.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub documents: Vec<BulkDocument>,
    pub cached: usize,
    pub generated: usize,
    pub failed: Vec<BulkFailure>,
}

pub struct BulkPipeline {
    cache: Arc<ResumeCache>,
    runner: Arc<RenderRunner>,
}

impl BulkPipeline {
    pub fn new(cache: Arc<ResumeCache>, runner: Arc<RenderRunner>) -> Self {
        Self { cache, runner }
    }

    pub async fn generate_bulk(
        &self,
        records: &[ApplicationRecord],
        concurrency: usize,
    ) -> Result<BulkOutcome, BulkRequestError> {
        check_batch_size(records.len())?;

        let ids: Vec<String> = records.iter().map(ApplicationRecord::cache_id).collect();
        let split = self.cache.check_many(&ids).await;
        let cached_ids: HashSet<&str> = split.cached.iter().map(String::as_str).collect();

        let (hits, mut misses): (Vec<&ApplicationRecord>, Vec<&ApplicationRecord>) = records
            .iter()
            .partition(|record| cached_ids.contains(record.cache_id().as_str()));

        let mut outcome = BulkOutcome::default();

        let fetched = join_all(hits.into_iter().map(|record| async move {
            let result = self.cache.get(&record.cache_id()).await;
            (record, result)
        }))
        .await;

        for (record, result) in fetched {
            match result {
                Ok(buffer) => {
                    outcome.documents.push(BulkDocument {
                        id: record.id,
                        buffer,
                    });
                    outcome.cached += 1;
                }
                Err(e) => {
                    warn!("Cached resume for {} unusable, regenerating: {e}", record.id);
                    misses.push(record);
                }
            }
        }

        for chunk in misses.chunks(concurrency.max(1)) {
            let rendered = join_all(chunk.iter().map(|record| async move {
                let id = record.cache_id();
                let epoch = self.cache.epoch(&id);
                let result = self.runner.render(record).await;
                if let Ok(buffer) = &result {
                    spawn_write_back(self.cache.clone(), id, buffer.clone(), epoch);
                }
                (*record, result)
            }))
            .await;

            for (record, result) in rendered {
                match result {
                    Ok(buffer) => {
                        outcome.documents.push(BulkDocument {
                            id: record.id,
                            buffer,
                        });
                        outcome.generated += 1;
                    }
                    Err(e) => {
                        warn!("Skipping resume for {} in bulk export: {e}", record.id);
                        outcome.failed.push(BulkFailure {
                            id: record.id,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            "Bulk export: {} cached, {} generated, {} failed",
            outcome.cached,
            outcome.generated,
            outcome.failed.len()
        );
        Ok(outcome)
    }
}
