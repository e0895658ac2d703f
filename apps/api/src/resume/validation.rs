//! Bulk export request validation. Runs before any lookup or render.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

pub const MAX_BULK_DOCUMENTS: usize = 50;

static UUID_V4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("UUID v4 pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkRequestError {
    #[error("ids must be an array of application ids")]
    NotAnArray,

    #[error("no applications selected")]
    Empty,

    #[error("too many applications selected: {selected} (limit {limit})")]
    TooMany { limit: usize, selected: usize },

    #[error("invalid application ids: {}", .0.join(", "))]
    InvalidIds(Vec<String>),
}

impl BulkRequestError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAnArray => "INVALID_REQUEST",
            Self::Empty => "EMPTY_SELECTION",
            Self::TooMany { .. } => "TOO_MANY_IDS",
            Self::InvalidIds(_) => "INVALID_IDS",
        }
    }

    /// Structured detail for the error body, where there is any.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::TooMany { limit, selected } => Some(json!({ "limit": limit, "selected": selected })),
            Self::InvalidIds(ids) => Some(json!({ "invalid_ids": ids })),
            Self::NotAnArray | Self::Empty => None,
        }
    }
}

/// Rejects empty and oversized batches.
pub fn check_batch_size(selected: usize) -> Result<(), BulkRequestError> {
    if selected == 0 {
        return Err(BulkRequestError::Empty);
    }
    if selected > MAX_BULK_DOCUMENTS {
        return Err(BulkRequestError::TooMany {
            limit: MAX_BULK_DOCUMENTS,
            selected,
        });
    }
    Ok(())
}

/// Validates the raw `ids` field of a bulk export request and parses it.
/// Every offending id is reported, not just the first.
pub fn validate_bulk_ids(ids: &Value) -> Result<Vec<Uuid>, BulkRequestError> {
    let items = ids.as_array().ok_or(BulkRequestError::NotAnArray)?;
    check_batch_size(items.len())?;

    let mut parsed = Vec::with_capacity(items.len());
    let mut invalid = Vec::new();
    for item in items {
        let uuid = item
            .as_str()
            .filter(|s| UUID_V4.is_match(s))
            .and_then(|s| Uuid::parse_str(s).ok());
        match uuid {
            Some(uuid) => parsed.push(uuid),
            None => invalid.push(match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }

    if !invalid.is_empty() {
        return Err(BulkRequestError::InvalidIds(invalid));
    }
    Ok(parsed)
}
