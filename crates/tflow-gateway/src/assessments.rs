//! Per-job assessment documents and candidate submissions.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use tflow_core::{AssessmentDocument, AssessmentResponse, AssessmentUpdate, Submission};
use tflow_storage::Database;

use crate::error::ApiError;
use crate::faults::commit_write;
use crate::AppState;

/// The stored document, or an empty one stamped now when the job has none yet.
pub async fn get_assessment(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Json<AssessmentDocument> {
    let stored = state
        .store
        .read(|db| db.assessments.get(&job_id).cloned())
        .await;
    Json(stored.unwrap_or_else(|| AssessmentDocument::empty(&job_id, Utc::now())))
}

pub async fn put_assessment(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    payload: Result<Json<AssessmentUpdate>, JsonRejection>,
) -> Result<Json<AssessmentDocument>, ApiError> {
    let Json(update) = payload?;
    let document = AssessmentDocument {
        job_id,
        sections: update.sections,
        updated_at: Utc::now(),
    };
    let document = commit_write(&state, |db| {
        db.assessments.put(document.clone());
        Ok(document)
    })
    .await?;
    Ok(Json(document))
}

fn validated_submission(submission: &Submission) -> Result<String, ApiError> {
    let candidate_id = submission.candidate_id.trim();
    if candidate_id.is_empty() {
        return Err(ApiError::Validation("candidateId required".to_string()));
    }
    Ok(candidate_id.to_string())
}

/// Append one response record. Submissions landing in the same millisecond get a numeric suffix.
pub fn record_submission(
    db: &mut Database,
    candidate_id: &str,
    job_id: &str,
    submission: Submission,
    at: DateTime<Utc>,
) -> Result<AssessmentResponse, ApiError> {
    let base = AssessmentResponse::submission_id(candidate_id, job_id, at);
    let mut id = base.clone();
    let mut n = 1;
    while db.responses.contains(&id) {
        id = format!("{base}-{n}");
        n += 1;
    }
    let response = AssessmentResponse {
        id,
        candidate_id: candidate_id.to_string(),
        job_id: job_id.to_string(),
        answers: submission.answers,
        at,
    };
    db.responses.insert(response.clone())?;
    Ok(response)
}

pub async fn submit_assessment(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Result<(StatusCode, Json<AssessmentResponse>), ApiError> {
    let Json(submission) = payload?;
    let candidate_id = validated_submission(&submission)?;

    let response = commit_write(&state, |db| {
        record_submission(db, &candidate_id, &job_id, submission, Utc::now())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Map};

    fn answers(value: serde_json::Value) -> Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn same_millisecond_submissions_stay_distinct() {
        let at = Utc.timestamp_millis_opt(1_771_934_400_000).single().unwrap();
        let mut db = Database::default();
        let first = Submission {
            candidate_id: "c1".into(),
            answers: answers(json!({ "q1": "Yes" })),
        };
        let a = record_submission(&mut db, "c1", "j1", first.clone(), at).unwrap();
        let b = record_submission(&mut db, "c1", "j1", first, at).unwrap();

        assert_eq!(a.id, "c1-j1-1771934400000");
        assert_eq!(b.id, "c1-j1-1771934400000-1");
        assert_eq!(db.responses.count(), 2);
        assert_eq!(db.responses.where_equals("jobId", "j1").unwrap().len(), 2);
    }

    #[test]
    fn blank_candidate_is_rejected() {
        let submission = Submission {
            candidate_id: "  ".into(),
            answers: Map::new(),
        };
        assert!(matches!(
            validated_submission(&submission),
            Err(ApiError::Validation(_))
        ));
    }
}
