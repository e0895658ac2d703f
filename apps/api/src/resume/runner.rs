//! Runs the CPU-bound renderer off the async runtime, with a per-attempt
//! timeout and retries for engine failures.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::warn;

use crate::models::application::ApplicationRecord;
use crate::render::{check_pdf_bytes, DocumentRenderer, RenderError};

pub struct RenderRunner {
    renderer: Arc<dyn DocumentRenderer>,
    timeout: Duration,
    attempts: u32,
}

impl RenderRunner {
    pub fn new(renderer: Arc<dyn DocumentRenderer>, timeout: Duration, attempts: u32) -> Self {
        Self {
            renderer,
            timeout,
            attempts: attempts.max(1),
        }
    }

    /// Renders and validates one record. Only `RenderError::Engine` is retried;
    /// a timed-out attempt still holds its blocking thread, so it is final.
    pub async fn render(&self, record: &ApplicationRecord) -> Result<Bytes, RenderError> {
        let record = Arc::new(record.clone());
        let mut attempt = 1;
        loop {
            match self.attempt(record.clone()).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    warn!(
                        "Render attempt {attempt}/{} failed for {}: {e}",
                        self.attempts, record.id
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, record: Arc<ApplicationRecord>) -> Result<Bytes, RenderError> {
        let renderer = self.renderer.clone();
        let task = tokio::task::spawn_blocking(move || renderer.render(&record));

        let bytes = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                return Err(RenderError::Engine(format!("render task failed: {join_error}")))
            }
            Err(_) => {
                return Err(RenderError::Timeout {
                    millis: self.timeout.as_millis() as u64,
                })
            }
        };

        let check = check_pdf_bytes(&bytes);
        if !check.is_valid() {
            return Err(RenderError::Corrupt(check.describe()));
        }
        Ok(Bytes::from(bytes))
    }
}
