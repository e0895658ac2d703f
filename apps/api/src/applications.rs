//! Application records: read-only access to `job_applications` and the six
//! child tables, assembled into normalized [`ApplicationRecord`]s.
//!
//! `AppState` holds an `Arc<dyn ApplicationSource>` so handlers can be tested
//! without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::application::{
    ApplicationRecord, ApplicationRow, Education, Language, Project, PublishedPaper,
    TechnicalSkill, WorkExperience,
};

#[async_trait]
pub trait ApplicationSource: Send + Sync {
    async fn fetch_one(&self, id: Uuid) -> Result<Option<ApplicationRecord>, sqlx::Error>;

    /// Records for `ids` in request order. Unknown ids are skipped.
    async fn fetch_many(&self, ids: &[Uuid]) -> Result<Vec<ApplicationRecord>, sqlx::Error>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgApplicationSource {
    pool: PgPool,
}

impl PgApplicationSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn children<T>(&self, table: &str, ids: &[Uuid]) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        // `table` is always one of the literals in `assemble`
        let sql = format!("SELECT * FROM {table} WHERE application_id = ANY($1) ORDER BY application_id, id");
        sqlx::query_as::<_, T>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
    }

    async fn assemble(&self, rows: Vec<ApplicationRow>) -> Result<Vec<ApplicationRecord>, sqlx::Error> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

        let education: Vec<Education> = self.children("education", &ids).await?;
        let work: Vec<WorkExperience> = self.children("work_experience", &ids).await?;
        let projects: Vec<Project> = self.children("projects", &ids).await?;
        let papers: Vec<PublishedPaper> = self.children("published_papers", &ids).await?;
        let skills: Vec<TechnicalSkill> = self.children("technical_skills", &ids).await?;
        let languages: Vec<Language> = self.children("languages", &ids).await?;

        let mut records: HashMap<Uuid, ApplicationRecord> = rows
            .into_iter()
            .map(|row| (row.id, ApplicationRecord::from_row(row)))
            .collect();

        for entry in education {
            if let Some(record) = records.get_mut(&entry.application_id) {
                record.education.push(entry);
            }
        }
        for entry in work {
            if let Some(record) = records.get_mut(&entry.application_id) {
                record.work_experience.push(entry);
            }
        }
        for entry in projects {
            if let Some(record) = records.get_mut(&entry.application_id) {
                record.projects.push(entry);
            }
        }
        for entry in papers {
            if let Some(record) = records.get_mut(&entry.application_id) {
                record.published_papers.push(entry);
            }
        }
        for entry in skills {
            if let Some(record) = records.get_mut(&entry.application_id) {
                record.technical_skills.push(entry);
            }
        }
        for entry in languages {
            if let Some(record) = records.get_mut(&entry.application_id) {
                record.languages.push(entry);
            }
        }

        Ok(ids.iter().filter_map(|id| records.remove(id)).collect())
    }
}

#[async_trait]
impl ApplicationSource for PgApplicationSource {
    async fn fetch_one(&self, id: Uuid) -> Result<Option<ApplicationRecord>, sqlx::Error> {
        Ok(self.fetch_many(&[id]).await?.into_iter().next())
    }

    async fn fetch_many(&self, ids: &[Uuid]) -> Result<Vec<ApplicationRecord>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, full_name, email, phone, address_line_1, address_line_2,
                   city, state, pincode, linkedin, professional_summary,
                   yoe::float8 AS yoe, current_ctc::float8 AS current_ctc,
                   domain, preferred_job_role, preferred_job_location, created_at
            FROM job_applications
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut records = self.assemble(rows).await?;
        let position: HashMap<Uuid, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).rev().collect();
        records.sort_by_key(|record| position.get(&record.id).copied().unwrap_or(usize::MAX));
        Ok(records)
    }
}
