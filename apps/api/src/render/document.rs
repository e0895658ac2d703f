//! Record → `RenderedDocument`.
//!
//! This is where every presence rule lives. Numeric fields are suppressed only
//! when `None`: a CTC of zero is still data and renders as `₹0 LPA`. Text is
//! treated as absent when `None` or blank after trimming.

use crate::models::application::{
    ApplicationRecord, Education, Project, PublishedPaper, WorkExperience,
};
use crate::render::error::RenderError;

/// Sections in the order they appear on the page. Declaration order IS the
/// output order; `build_document` pushes them in this sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKind {
    Header,
    CurrentDetails,
    ProfessionalSummary,
    Education,
    WorkExperience,
    Projects,
    Publications,
    TechnicalSkills,
    Languages,
}

impl SectionKind {
    /// Printed section title. The header has none.
    pub fn title(self) -> Option<&'static str> {
        match self {
            SectionKind::Header => None,
            SectionKind::CurrentDetails => Some("CURRENT DETAILS"),
            SectionKind::ProfessionalSummary => Some("PROFESSIONAL SUMMARY"),
            SectionKind::Education => Some("EDUCATION"),
            SectionKind::WorkExperience => Some("PROFESSIONAL EXPERIENCE"),
            SectionKind::Projects => Some("PROJECTS"),
            SectionKind::Publications => Some("PUBLICATIONS"),
            SectionKind::TechnicalSkills => Some("TECHNICAL SKILLS"),
            SectionKind::Languages => Some("LANGUAGES"),
        }
    }
}

/// One visual unit inside a section.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Candidate name, large and centered.
    Title(String),
    /// Centered secondary header line (address, contact, LinkedIn).
    Centered(String),
    /// Emphasised line, e.g. a company or project name.
    Strong(String),
    /// Plain paragraph text.
    Text(String),
    /// Two-column label/value row.
    Row { label: String, value: String },
    /// Column headings for a two-column table.
    TableHeader { left: String, right: String },
    /// One bulleted item.
    Bullet(String),
    /// Vertical gap between repeated entries.
    Spacer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub blocks: Vec<Block>,
}

/// The fixed-layout resume prior to pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    /// Used for the PDF `/Title` entry.
    pub title: String,
    pub sections: Vec<Section>,
}

#[cfg(test)]
impl RenderedDocument {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

/// Builds the document, enforcing required fields and presence rules.
pub fn build_document(record: &ApplicationRecord) -> Result<RenderedDocument, RenderError> {
    let full_name = required(record, record.full_name.as_deref(), "full_name")?;
    let email = required(record, record.email.as_deref(), "email")?;

    let mut sections = vec![header_section(record, full_name, email)];

    let candidates = [
        current_details(record),
        professional_summary(record),
        education(&record.education),
        work_experience(&record.work_experience),
        projects(&record.projects),
        publications(&record.published_papers),
        technical_skills(record),
        languages(record),
    ];
    sections.extend(candidates.into_iter().flatten());

    Ok(RenderedDocument {
        title: format!("{full_name} - Resume"),
        sections,
    })
}

fn required<'a>(
    record: &ApplicationRecord,
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, RenderError> {
    present(value).ok_or_else(|| RenderError::Input {
        application_id: record.cache_id(),
        field,
    })
}

/// Trimmed text, or `None` when absent or blank.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Trimmed, non-blank list items in their original order.
fn items(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_present(parts: &[Option<&str>], sep: &str) -> Option<String> {
    let joined = parts
        .iter()
        .filter_map(|p| present(*p))
        .collect::<Vec<_>>()
        .join(sep);
    (!joined.is_empty()).then_some(joined)
}

/// Shortest round-trip formatting: `5.0` → `5`, `7.5` → `7.5`.
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

pub fn format_ctc(value: f64) -> String {
    format!("₹{} LPA", format_number(value))
}

pub fn format_experience(value: f64) -> String {
    format!("{} Years", format_number(value))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.trim().chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

fn row(label: &str, value: impl Into<String>) -> Block {
    Block::Row {
        label: label.to_string(),
        value: value.into(),
    }
}

fn section(kind: SectionKind, blocks: Vec<Block>) -> Option<Section> {
    (!blocks.is_empty()).then_some(Section { kind, blocks })
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

fn header_section(record: &ApplicationRecord, full_name: &str, email: &str) -> Section {
    let mut blocks = vec![Block::Title(full_name.to_string())];

    let street = join_present(
        &[
            record.address_line_1.as_deref(),
            record.address_line_2.as_deref(),
            record.city.as_deref(),
        ],
        ", ",
    );
    let region = join_present(&[record.state.as_deref(), record.pincode.as_deref()], " ");
    if let Some(address) = join_present(&[street.as_deref(), region.as_deref()], ", ") {
        blocks.push(Block::Centered(address));
    }

    let mut contact = format!("Email: {email}");
    if let Some(phone) = present(record.phone.as_deref()) {
        contact.push_str(&format!(" | Phone: {phone}"));
    }
    blocks.push(Block::Centered(contact));

    if let Some(linkedin) = present(record.linkedin.as_deref()) {
        blocks.push(Block::Centered(format!("LinkedIn: {linkedin}")));
    }

    Section {
        kind: SectionKind::Header,
        blocks,
    }
}

fn current_details(record: &ApplicationRecord) -> Option<Section> {
    let mut blocks = Vec::new();
    if let Some(ctc) = record.current_ctc {
        blocks.push(row("Current CTC:", format_ctc(ctc)));
    }
    if let Some(yoe) = record.yoe {
        blocks.push(row("Total Work Experience:", format_experience(yoe)));
    }
    let lists = [
        ("Domain of Expertise:", &record.domain),
        ("Preferred Job Role/Function:", &record.preferred_job_role),
        ("Preferred Job Location:", &record.preferred_job_location),
    ];
    for (label, values) in lists {
        let values = items(values);
        if !values.is_empty() {
            blocks.push(row(label, values.join(", ")));
        }
    }
    section(SectionKind::CurrentDetails, blocks)
}

fn professional_summary(record: &ApplicationRecord) -> Option<Section> {
    let summary = present(record.professional_summary.as_deref())?;
    section(
        SectionKind::ProfessionalSummary,
        vec![Block::Text(summary.to_string())],
    )
}

fn education(entries: &[Education]) -> Option<Section> {
    let mut blocks = Vec::new();
    for entry in entries {
        let cgpa = entry.cgpa.map(|v| format!("CGPA: {}/10", format_number(v)));
        let percentage = entry
            .percentage
            .map(|v| format!("Percentage: {}%", format_number(v)));
        let graduation = present(entry.graduation_date.as_deref()).map(|d| format!("Graduation: {d}"));

        let lines = [
            join_present(
                &[
                    entry.institution_name.as_deref(),
                    entry.city.as_deref(),
                    entry.country.as_deref(),
                ],
                ", ",
            ),
            join_present(
                &[
                    entry.degree_discipline.as_deref(),
                    cgpa.as_deref(),
                    percentage.as_deref(),
                ],
                " • ",
            ),
            graduation,
        ];
        let value = lines.into_iter().flatten().collect::<Vec<_>>().join("\n");
        let label = present(entry.level.as_deref())
            .map(str::to_uppercase)
            .unwrap_or_else(|| "EDUCATION".to_string());

        if !blocks.is_empty() {
            blocks.push(Block::Spacer);
        }
        blocks.push(row(&label, value));

        let courses = items(entry.relevant_courses.as_deref().unwrap_or_default());
        if !courses.is_empty() {
            blocks.push(Block::Text("Relevant Courses:".to_string()));
            blocks.extend(courses.into_iter().map(Block::Bullet));
        }
    }
    section(SectionKind::Education, blocks)
}

fn work_experience(entries: &[WorkExperience]) -> Option<Section> {
    let mut blocks = Vec::new();
    for entry in entries {
        let mut entry_blocks = Vec::new();
        if let Some(company) = present(entry.company_name.as_deref()) {
            entry_blocks.push(Block::Strong(company.to_string()));
        }
        if let Some(place) = join_present(
            &[entry.company_city.as_deref(), entry.company_country.as_deref()],
            ", ",
        ) {
            entry_blocks.push(Block::Text(place));
        }
        let period = join_present(&[entry.work_from.as_deref(), entry.work_to.as_deref()], " - ");
        if let Some(role) = join_present(
            &[entry.designation.as_deref(), period.as_deref()],
            " • ",
        ) {
            entry_blocks.push(Block::Text(role));
        }
        entry_blocks.extend(
            items(entry.work_summary.as_deref().unwrap_or_default())
                .into_iter()
                .map(Block::Bullet),
        );
        push_entry(&mut blocks, entry_blocks);
    }
    section(SectionKind::WorkExperience, blocks)
}

fn projects(entries: &[Project]) -> Option<Section> {
    let mut blocks = Vec::new();
    for entry in entries {
        let mut entry_blocks = Vec::new();
        if let Some(name) = present(entry.project_name.as_deref()) {
            entry_blocks.push(Block::Strong(name.to_string()));
        }
        if let Some(aim) = present(entry.project_aim.as_deref()) {
            entry_blocks.push(Block::Text(aim.to_string()));
        }
        let stack = items(entry.tech_stack.as_deref().unwrap_or_default());
        if !stack.is_empty() {
            entry_blocks.push(Block::Text("Tech Stack:".to_string()));
            entry_blocks.extend(stack.into_iter().map(Block::Bullet));
        }
        let achievements = items(entry.achievements.as_deref().unwrap_or_default());
        if !achievements.is_empty() {
            entry_blocks.push(Block::Text("Achievements:".to_string()));
            entry_blocks.extend(achievements.into_iter().map(Block::Bullet));
        }
        push_entry(&mut blocks, entry_blocks);
    }
    section(SectionKind::Projects, blocks)
}

fn publications(entries: &[PublishedPaper]) -> Option<Section> {
    let mut blocks = Vec::new();
    for entry in entries {
        let mut entry_blocks = Vec::new();
        if let Some(title) = present(entry.paper_title.as_deref()) {
            entry_blocks.push(Block::Strong(title.to_string()));
        }
        if let Some(details) = join_present(
            &[
                entry.journal_name.as_deref(),
                entry.volume_issue.as_deref(),
                entry.publication_year.as_deref(),
            ],
            ", ",
        ) {
            entry_blocks.push(Block::Text(details));
        }
        if let Some(issn) = present(entry.issn.as_deref()) {
            entry_blocks.push(Block::Text(format!("ISSN: {issn}")));
        }
        push_entry(&mut blocks, entry_blocks);
    }
    section(SectionKind::Publications, blocks)
}

fn technical_skills(record: &ApplicationRecord) -> Option<Section> {
    let rows: Vec<Block> = record
        .technical_skills
        .iter()
        .filter_map(|skill| {
            let category = present(Some(skill.skill_category.as_str()))?;
            Some(row(category, items(&skill.skills).join(", ")))
        })
        .collect();
    table(SectionKind::TechnicalSkills, "Category", "Skills", rows)
}

fn languages(record: &ApplicationRecord) -> Option<Section> {
    let rows: Vec<Block> = record
        .languages
        .iter()
        .filter_map(|language| {
            let name = present(Some(language.language_name.as_str()))?;
            Some(row(name, capitalize(&language.proficiency)))
        })
        .collect();
    table(SectionKind::Languages, "Name", "Proficiency Level", rows)
}

fn table(kind: SectionKind, left: &str, right: &str, rows: Vec<Block>) -> Option<Section> {
    if rows.is_empty() {
        return None;
    }
    let mut blocks = vec![Block::TableHeader {
        left: left.to_string(),
        right: right.to_string(),
    }];
    blocks.extend(rows);
    section(kind, blocks)
}

/// Appends one collection entry, separated from the previous one by a spacer.
/// Entries whose optional fields are all absent contribute nothing.
fn push_entry(blocks: &mut Vec<Block>, entry_blocks: Vec<Block>) {
    if entry_blocks.is_empty() {
        return;
    }
    if !blocks.is_empty() {
        blocks.push(Block::Spacer);
    }
    blocks.extend(entry_blocks);
}
