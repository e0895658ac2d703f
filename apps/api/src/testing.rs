//! Test doubles shared by the unit tests: an in-memory object store with
//! failure switches, a scripted renderer, and record fixtures.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::applications::ApplicationSource;
use crate::cache::storage::{ObjectEntry, ObjectStore, StorageError, UploadOptions};
use crate::models::application::{
    ApplicationRecord, Education, Language, Project, PublishedPaper, TechnicalSkill,
    WorkExperience,
};
use crate::render::{DocumentRenderer, RenderError};

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

/// A fully populated record that renders every section.
pub fn sample_record() -> ApplicationRecord {
    let id = Uuid::parse_str("7d1f6c2a-3b4e-4f5a-8b6c-0d1e2f3a4b5c").unwrap();
    ApplicationRecord {
        id,
        full_name: Some("Jane Doe".to_string()),
        email: Some("jane@example.com".to_string()),
        phone: Some("+91 98765 43210".to_string()),
        address_line_1: Some("12 MG Road".to_string()),
        city: Some("Bengaluru".to_string()),
        state: Some("Karnataka".to_string()),
        pincode: Some("560001".to_string()),
        linkedin: Some("linkedin.com/in/janedoe".to_string()),
        professional_summary: Some("Backend engineer focused on storage systems.".to_string()),
        yoe: Some(6.0),
        current_ctc: Some(12.0),
        domain: vec!["Fintech".to_string()],
        preferred_job_role: vec!["Staff Engineer".to_string()],
        preferred_job_location: vec!["Remote".to_string(), "Bengaluru".to_string()],
        education: vec![Education {
            application_id: id,
            level: Some("graduation".to_string()),
            institution_name: Some("IIT Madras".to_string()),
            city: Some("Chennai".to_string()),
            country: Some("India".to_string()),
            degree_discipline: Some("B.Tech Computer Science".to_string()),
            cgpa: Some(8.7),
            graduation_date: Some("2018-05".to_string()),
            relevant_courses: Some(vec!["Operating Systems".to_string()]),
            ..Default::default()
        }],
        work_experience: vec![WorkExperience {
            application_id: id,
            company_name: Some("Acme Payments".to_string()),
            company_city: Some("Bengaluru".to_string()),
            company_country: Some("India".to_string()),
            designation: Some("Senior Engineer".to_string()),
            work_from: Some("2019".to_string()),
            work_to: Some("Present".to_string()),
            work_summary: Some(vec!["Built the ledger service".to_string()]),
            ..Default::default()
        }],
        projects: vec![Project {
            application_id: id,
            project_name: Some("Settlement Engine".to_string()),
            project_aim: Some("Daily merchant settlement".to_string()),
            tech_stack: Some(vec!["Rust".to_string(), "Postgres".to_string()]),
            achievements: Some(vec!["Cut batch time from 4h to 20m".to_string()]),
            ..Default::default()
        }],
        published_papers: vec![PublishedPaper {
            application_id: id,
            paper_title: Some("Idempotent Ledgers".to_string()),
            journal_name: Some("Journal of Systems".to_string()),
            publication_year: Some("2021".to_string()),
            ..Default::default()
        }],
        technical_skills: vec![TechnicalSkill {
            application_id: id,
            skill_category: "Languages".to_string(),
            skills: vec!["Rust".to_string(), "Go".to_string()],
            ..Default::default()
        }],
        languages: vec![Language {
            application_id: id,
            language_name: "English".to_string(),
            proficiency: "advanced".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// `sample_record` with a fresh v4 id and the given name.
pub fn named_record(name: &str) -> ApplicationRecord {
    ApplicationRecord {
        id: Uuid::new_v4(),
        full_name: Some(name.to_string()),
        ..sample_record()
    }
}

/// A small buffer that passes the header/length check.
pub fn valid_pdf_bytes() -> Bytes {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(256, b' ');
    Bytes::from(bytes)
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory object store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
    list_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_lists: AtomicBool,
    fail_downloads: AtomicBool,
    fail_removes: AtomicBool,
    stall_downloads: AtomicBool,
}

impl MemoryObjectStore {
    pub fn insert_raw(&self, key: &str, bytes: Bytes) {
        self.objects.lock().insert(key.to_string(), bytes);
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn fail_uploads(&self, on: bool) {
        self.fail_uploads.store(on, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, on: bool) {
        self.fail_lists.store(on, Ordering::SeqCst);
    }

    pub fn fail_downloads(&self, on: bool) {
        self.fail_downloads.store(on, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, on: bool) {
        self.fail_removes.store(on, Ordering::SeqCst);
    }

    pub fn stall_downloads(&self, on: bool) {
        self.stall_downloads.store(on, Ordering::SeqCst);
    }

    /// Waits for detached write-backs to land `key`.
    pub async fn wait_for(&self, key: &str) -> Bytes {
        for _ in 0..200 {
            if let Some(bytes) = self.object(key) {
                return bytes;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("object {key} never appeared");
    }

    fn failure(op: &'static str, key: &str) -> StorageError {
        StorageError::Request {
            op,
            key: key.to_string(),
            message: "injected failure".to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, key: &str, body: Bytes, _options: UploadOptions) -> Result<(), StorageError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Self::failure("upload", key));
        }
        self.objects.lock().insert(key.to_string(), body);
        Ok(())
    }

    async fn list(&self, prefix: &str, search: &str) -> Result<Vec<ObjectEntry>, StorageError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(Self::failure("list", prefix));
        }
        let folder = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .objects
            .lock()
            .keys()
            .filter_map(|key| {
                let name = key.strip_prefix(&folder)?;
                name.starts_with(search).then(|| ObjectEntry {
                    name: name.to_string(),
                })
            })
            .collect())
    }

    async fn download(&self, key: &str) -> Result<Bytes, StorageError> {
        if self.stall_downloads.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(Self::failure("download", key));
        }
        self.object(key)
            .ok_or_else(|| Self::failure("download", key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{key}")
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(Self::failure("remove", &keys.join(",")));
        }
        let mut objects = self.objects.lock();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted renderer
// ────────────────────────────────────────────────────────────────────────────

/// Delegates to the real renderer unless the record id is scripted to fail.
#[derive(Default)]
pub struct ScriptedRenderer {
    corrupt_ids: Mutex<HashSet<Uuid>>,
    /// Remaining engine failures before renders succeed.
    engine_failures: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedRenderer {
    pub fn corrupt_for(&self, id: Uuid) {
        self.corrupt_ids.lock().insert(id);
    }

    pub fn fail_engine_times(&self, times: usize) {
        self.engine_failures.store(times, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentRenderer for ScriptedRenderer {
    fn render(&self, record: &ApplicationRecord) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.engine_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.engine_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RenderError::Engine("scripted engine failure".to_string()));
        }
        if self.corrupt_ids.lock().contains(&record.id) {
            return Err(RenderError::Corrupt("scripted corrupt output".to_string()));
        }
        crate::render::render(record)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory application source
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryApplicationSource {
    records: Vec<ApplicationRecord>,
}

impl MemoryApplicationSource {
    pub fn new(records: Vec<ApplicationRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ApplicationSource for MemoryApplicationSource {
    async fn fetch_one(&self, id: Uuid) -> Result<Option<ApplicationRecord>, sqlx::Error> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    async fn fetch_many(&self, ids: &[Uuid]) -> Result<Vec<ApplicationRecord>, sqlx::Error> {
        Ok(ids
            .iter()
            .filter_map(|id| self.records.iter().find(|r| r.id == *id).cloned())
            .collect())
    }
}
