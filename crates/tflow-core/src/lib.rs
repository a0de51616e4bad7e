//! Core domain model for TalentFlow: jobs, candidates, timelines and assessments.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

pub const CRATE_NAME: &str = "tflow-core";

/// Fresh opaque record identifier.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// URL-safe slug: lower-case ASCII alphanumerics joined by single dashes.
pub fn slugify(title: &str) -> String {
    title
        .to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Upcoming,
    Archived,
    Closed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Active,
        JobStatus::Upcoming,
        JobStatus::Archived,
        JobStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Upcoming => "upcoming",
            JobStatus::Archived => "archived",
            JobStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a candidate in the hiring pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStage {
    Applied,
    Screen,
    Tech,
    Offer,
    Hired,
    Rejected,
}

impl CandidateStage {
    pub const ALL: [CandidateStage; 6] = [
        CandidateStage::Applied,
        CandidateStage::Screen,
        CandidateStage::Tech,
        CandidateStage::Offer,
        CandidateStage::Hired,
        CandidateStage::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStage::Applied => "applied",
            CandidateStage::Screen => "screen",
            CandidateStage::Tech => "tech",
            CandidateStage::Offer => "offer",
            CandidateStage::Hired => "hired",
            CandidateStage::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CandidateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job posting. `order` is the manual rank across all jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub status: JobStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    pub order: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stipend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub job_id: String,
    pub stage: CandidateStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    StageChange,
    Note,
}

/// Append-only audit entry in a candidate's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub candidate_id: String,
    #[serde(rename = "type")]
    pub kind: TimelineEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<CandidateStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub at: DateTime<Utc>,
}

impl TimelineEvent {
    pub fn stage_change(candidate_id: &str, stage: CandidateStage, at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            candidate_id: candidate_id.to_string(),
            kind: TimelineEventKind::StageChange,
            stage: Some(stage),
            note: None,
            at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultiChoice,
    ShortText,
    LongText,
    Numeric,
    File,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Value a `showIf` rule compares the referenced answer against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShowIfValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Conditional visibility rule. Persisted as-is; evaluation belongs to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowIf {
    pub question_id: String,
    pub equals: ShowIfValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_range: Option<NumericRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_if: Option<ShowIf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// The one-per-job container of assessment sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDocument {
    pub job_id: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl AssessmentDocument {
    pub fn empty(job_id: &str, updated_at: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.to_string(),
            sections: Vec::new(),
            updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub id: String,
    pub candidate_id: String,
    pub job_id: String,
    #[serde(default)]
    pub answers: Map<String, JsonValue>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub at: DateTime<Utc>,
}

impl AssessmentResponse {
    /// Identifier of one submission: candidate, job and submission millisecond.
    pub fn submission_id(candidate_id: &str, job_id: &str, at: DateTime<Utc>) -> String {
        format!("{candidate_id}-{job_id}-{}", at.timestamp_millis())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: JsonValue,
}

/// One page of a filtered listing; `total` counts matches before pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stipend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Body of `POST /candidates`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCandidate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<CandidateStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

/// Body and echo of `PATCH /jobs/{id}/reorder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reorder {
    #[serde(default)]
    pub from_order: Option<i64>,
    #[serde(default)]
    pub to_order: Option<i64>,
}

/// Body of `PUT /assessments/{jobId}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssessmentUpdate {
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Body of `POST /assessments/{jobId}/submit`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default)]
    pub answers: Map<String, JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("UI/UX Designer"), "ui-ux-designer");
        assert_eq!(slugify("  Senior SDE!! "), "senior-sde");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn job_uses_camel_case_and_epoch_millis() {
        let job = Job {
            id: "j1".into(),
            title: "Data Analyst".into(),
            slug: "data-analyst-1".into(),
            status: JobStatus::Archived,
            tags: vec!["Data".into()],
            order: 3,
            description: String::new(),
            requirements: vec![],
            stipend: None,
            deadline: None,
            scope: None,
            created_at: Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).single().unwrap(),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "archived");
        assert_eq!(value["createdAt"], 1_771_934_400_000i64);
        assert!(value.get("stipend").is_none());
    }

    #[test]
    fn show_if_accepts_scalars() {
        let rule: ShowIf = serde_json::from_str(r#"{"questionId":"q1","equals":"A"}"#).unwrap();
        assert_eq!(rule.equals, ShowIfValue::Text("A".into()));
        let rule: ShowIf = serde_json::from_str(r#"{"questionId":"q1","equals":true}"#).unwrap();
        assert_eq!(rule.equals, ShowIfValue::Bool(true));
        let rule: ShowIf = serde_json::from_str(r#"{"questionId":"q1","equals":3}"#).unwrap();
        assert_eq!(rule.equals, ShowIfValue::Number(3.0));
    }

    #[test]
    fn question_type_tag_is_snake_case() {
        let q: Question =
            serde_json::from_str(r#"{"id":"q","type":"multi_choice","label":"Pick"}"#).unwrap();
        assert_eq!(q.kind, QuestionType::MultiChoice);
    }
}
