use std::sync::Arc;

use crate::applications::ApplicationSource;
use crate::resume::{BulkPipeline, ResumeService};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read-only application records. Postgres in production.
    pub applications: Arc<dyn ApplicationSource>,
    pub resumes: Arc<ResumeService>,
    pub bulk: Arc<BulkPipeline>,
    /// Renders in flight per bulk export chunk.
    pub bulk_concurrency: usize,
}
