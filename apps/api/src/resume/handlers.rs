//! Axum route handlers for resume download, cache management and bulk export.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Response, StatusCode},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::archive::{package_blocking, unique_file_names, ArchiveEntry};
use crate::resume::validation::validate_bulk_ids;
use crate::state::AppState;

const NO_STORE: &str = "no-cache, no-store, must-revalidate";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// `ids` stays untyped so a non-array value gets the structured error.
#[derive(Debug, Deserialize)]
pub struct BulkExportRequest {
    #[serde(default)]
    pub ids: Value,
}

#[derive(Debug, Serialize)]
pub struct ResumeUrlResponse {
    pub url: String,
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("'{raw}' is not a valid application id")))
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{file_name}\"")
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /resume/:id
///
/// Streams the PDF, from cache when a valid copy exists.
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response<Body>, AppError> {
    let id = parse_id(&id)?;
    let record = state
        .applications
        .fetch_one(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    let generated = state.resumes.generate(&record).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_DISPOSITION, attachment(&record.resume_file_name()))
        .header(header::CONTENT_LENGTH, generated.buffer.len())
        .header(header::CACHE_CONTROL, NO_STORE)
        .header("X-Resume-Cache", if generated.cached { "HIT" } else { "MISS" })
        .body(Body::from(generated.buffer))
        .map_err(anyhow::Error::from)?;
    Ok(response)
}

/// GET /resume/:id/url
pub async fn handle_get_resume_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResumeUrlResponse>, AppError> {
    let id = parse_id(&id)?;
    let url = state
        .resumes
        .cached_url(&id.to_string())
        .await
        .ok_or_else(|| AppError::NotFound(format!("No cached resume for {id}")))?;
    Ok(Json(ResumeUrlResponse { url }))
}

/// DELETE /resume/:id/cache
pub async fn handle_invalidate_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.resumes.invalidate(&id.to_string()).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /bulk-export
///
/// Returns a ZIP of up to 50 resumes. Documents that fail to render are left
/// out and counted in `X-Resumes-Failed`.
pub async fn handle_bulk_export(
    State(state): State<AppState>,
    Json(request): Json<BulkExportRequest>,
) -> Result<Response<Body>, AppError> {
    let ids = validate_bulk_ids(&request.ids)?;

    let records = state.applications.fetch_many(&ids).await?;
    if records.is_empty() {
        return Err(AppError::NotFound(
            "No applications found for the selected ids".to_string(),
        ));
    }

    let outcome = state.bulk.generate_bulk(&records, state.bulk_concurrency).await?;
    if outcome.documents.is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "none of the {} selected resumes could be generated",
            records.len()
        )));
    }

    let mut buffers: HashMap<Uuid, Bytes> = outcome
        .documents
        .into_iter()
        .map(|doc| (doc.id, doc.buffer))
        .collect();
    let included: Vec<_> = records
        .iter()
        .filter_map(|record| buffers.remove(&record.id).map(|bytes| (record, bytes)))
        .collect();
    let file_names = unique_file_names(included.iter().map(|(record, _)| record.resume_file_name()));
    let entries: Vec<ArchiveEntry> = included
        .into_iter()
        .zip(file_names)
        .map(|((_, bytes), file_name)| ArchiveEntry { file_name, bytes })
        .collect();

    let archive = package_blocking(entries).await?;
    info!(
        "Bulk export archive ready: {} bytes ({} cached, {} generated, {} failed)",
        archive.len(),
        outcome.cached,
        outcome.generated,
        outcome.failed.len()
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_DISPOSITION, attachment("resumes.zip"))
        .header(header::CONTENT_LENGTH, archive.len())
        .header("X-Resumes-Cached", outcome.cached)
        .header("X-Resumes-Generated", outcome.generated)
        .header("X-Resumes-Failed", outcome.failed.len())
        .body(Body::from(archive))
        .map_err(anyhow::Error::from)?;
    Ok(response)
}
