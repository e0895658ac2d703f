use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Database rows
// ────────────────────────────────────────────────────────────────────────────

/// Root row of `job_applications`. Collections are loaded separately and
/// joined into an [`ApplicationRecord`] by the repository.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub linkedin: Option<String>,
    pub professional_summary: Option<String>,
    pub yoe: Option<f64>,
    pub current_ctc: Option<f64>,
    pub domain: Option<Vec<String>>,
    pub preferred_job_role: Option<Vec<String>>,
    pub preferred_job_location: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Education {
    pub id: Uuid,
    pub application_id: Uuid,
    pub level: Option<String>,
    pub institution_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub degree_discipline: Option<String>,
    pub cgpa: Option<f64>,
    pub percentage: Option<f64>,
    pub graduation_date: Option<String>,
    pub relevant_courses: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkExperience {
    pub id: Uuid,
    pub application_id: Uuid,
    pub company_name: Option<String>,
    pub company_city: Option<String>,
    pub company_country: Option<String>,
    pub designation: Option<String>,
    pub work_from: Option<String>,
    pub work_to: Option<String>,
    pub work_summary: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub application_id: Uuid,
    pub project_name: Option<String>,
    pub project_aim: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub achievements: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PublishedPaper {
    pub id: Uuid,
    pub application_id: Uuid,
    pub paper_title: Option<String>,
    pub journal_name: Option<String>,
    pub volume_issue: Option<String>,
    pub publication_year: Option<String>,
    pub issn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TechnicalSkill {
    pub id: Uuid,
    pub application_id: Uuid,
    pub skill_category: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Proficiency is stored as free text (`beginner`, `intermediate`, `advanced`,
/// `native`); the renderer capitalises whatever it finds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Language {
    pub id: Uuid,
    pub application_id: Uuid,
    pub language_name: String,
    pub proficiency: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Normalized record (render boundary)
// ────────────────────────────────────────────────────────────────────────────

/// A complete application with all six related collections joined.
///
/// Collections are never `None` here: a record without education rows carries
/// an empty `education` vector. `full_name` and `email` stay optional so that
/// malformed rows reach the renderer and fail there as input errors instead of
/// failing the whole query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub linkedin: Option<String>,
    pub professional_summary: Option<String>,
    pub yoe: Option<f64>,
    pub current_ctc: Option<f64>,
    #[serde(default)]
    pub domain: Vec<String>,
    #[serde(default)]
    pub preferred_job_role: Vec<String>,
    #[serde(default)]
    pub preferred_job_location: Vec<String>,

    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub published_papers: Vec<PublishedPaper>,
    #[serde(default)]
    pub technical_skills: Vec<TechnicalSkill>,
    #[serde(default)]
    pub languages: Vec<Language>,
}

impl ApplicationRecord {
    /// Builds a record from its root row with empty collections.
    pub fn from_row(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            address_line_1: row.address_line_1,
            address_line_2: row.address_line_2,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            linkedin: row.linkedin,
            professional_summary: row.professional_summary,
            yoe: row.yoe,
            current_ctc: row.current_ctc,
            domain: row.domain.unwrap_or_default(),
            preferred_job_role: row.preferred_job_role.unwrap_or_default(),
            preferred_job_location: row.preferred_job_location.unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Cache identity of this record.
    pub fn cache_id(&self) -> String {
        self.id.to_string()
    }

    /// `full_name` with every character outside `[A-Za-z0-9]` replaced by `_`.
    /// Falls back to the record id when the name is missing.
    pub fn sanitized_name(&self) -> String {
        let name = self
            .full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.cache_id());
        sanitize_file_stem(&name)
    }

    /// Download file name, e.g. `Jane_Doe_Resume.pdf`.
    pub fn resume_file_name(&self) -> String {
        format!("{}_Resume.pdf", self.sanitized_name())
    }
}

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
