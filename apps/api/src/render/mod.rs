// Document Renderer: application record → paginated PDF bytes.
// Pure and deterministic; no I/O. CPU-bound, so async callers must run it
// inside tokio::task::spawn_blocking (see resume::runner).

pub mod document;
pub mod error;
pub mod font_metrics;
pub mod layout;
pub mod pdf;

use crate::models::application::ApplicationRecord;

pub use document::build_document;
pub use error::RenderError;
pub use pdf::check_pdf_bytes;

/// Pluggable renderer. The service holds an `Arc<dyn DocumentRenderer>` so
/// tests can substitute failing or counting renderers.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, record: &ApplicationRecord) -> Result<Vec<u8>, RenderError>;
}

/// The production single-layout resume renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfResumeRenderer;

impl DocumentRenderer for PdfResumeRenderer {
    fn render(&self, record: &ApplicationRecord) -> Result<Vec<u8>, RenderError> {
        render(record)
    }
}

/// Renders a record to PDF bytes and validates the result.
pub fn render(record: &ApplicationRecord) -> Result<Vec<u8>, RenderError> {
    let document = build_document(record)?;
    let pages = layout::layout(&document);
    let bytes = pdf::write_pdf(&document.title, &pages)
        .map_err(|e| RenderError::Engine(format!("PDF serialization failed: {e}")))?;

    let check = check_pdf_bytes(&bytes);
    if !check.is_valid() {
        return Err(RenderError::Corrupt(check.describe()));
    }
    Ok(bytes)
}
