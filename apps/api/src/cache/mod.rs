// Cache Store: application id → PDF bytes, durable storage plus an
// in-process existence accelerator.

pub mod existence;
pub mod storage;
pub mod store;

pub use existence::ExistenceCache;
pub use storage::S3ObjectStore;
pub use store::ResumeCache;
