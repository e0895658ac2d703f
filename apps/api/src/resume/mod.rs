// Resume orchestration: single-document service, bulk pipeline, archive
// packaging, and the HTTP handlers over them.

pub mod archive;
pub mod bulk;
pub mod handlers;
pub mod runner;
pub mod service;
pub mod validation;

pub use bulk::BulkPipeline;
pub use runner::RenderRunner;
pub use service::ResumeService;
