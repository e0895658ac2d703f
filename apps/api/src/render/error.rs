use thiserror::Error;

/// Failure modes of the document renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The record lacks a required scalar. Not worth retrying.
    #[error("application {application_id} is missing required field '{field}'")]
    Input {
        application_id: String,
        field: &'static str,
    },

    /// The serializer or the render task itself failed. Safe to retry.
    #[error("render engine failure: {0}")]
    Engine(String),

    /// The render task outlived its deadline. The blocking thread may still be
    /// running, so this is never retried.
    #[error("render timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// Output failed the `%PDF` header / minimum length check.
    #[error("rendered document is corrupt: {0}")]
    Corrupt(String),
}

impl RenderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RenderError::Engine(_))
    }
}
