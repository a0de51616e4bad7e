//! Candidate routes, including the stage-change audit trail.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use tflow_core::{new_id, Candidate, CandidateStage, Items, NewCandidate, Page, TimelineEvent};
use tflow_storage::Database;

use crate::error::ApiError;
use crate::faults::commit_write;
use crate::listing::{exact_filter, search_needle, Paging, DEFAULT_CANDIDATES_PAGE_SIZE};
use crate::{merge_patch, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesParams {
    search: Option<String>,
    stage: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

pub async fn list_candidates(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CandidatesParams>, QueryRejection>,
) -> Result<Json<Page<Candidate>>, ApiError> {
    let Query(params) = params?;
    let paging = Paging::parse(
        params.page.as_deref(),
        params.page_size.as_deref(),
        DEFAULT_CANDIDATES_PAGE_SIZE,
    )?;
    let needle = search_needle(params.search.as_deref());
    let stage = exact_filter(params.stage.as_deref());

    let matches = state
        .store
        .read(|db| {
            db.candidates
                .filter(|c| {
                    let text_ok = needle.as_deref().map_or(true, |n| {
                        c.name.to_lowercase().contains(n) || c.email.to_lowercase().contains(n)
                    });
                    text_ok && stage.map_or(true, |s| c.stage.as_str() == s)
                })
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
        .await;
    Ok(Json(paging.apply(matches)))
}

pub async fn create_candidate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewCandidate>, JsonRejection>,
) -> Result<(StatusCode, Json<Candidate>), ApiError> {
    let Json(input) = payload?;
    let name = input.name.trim().to_string();
    let email = input.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() {
        return Err(ApiError::Validation("Name and email required".to_string()));
    }

    let candidate = Candidate {
        id: new_id(),
        name,
        email,
        job_id: input.job_id.unwrap_or_default(),
        stage: input.stage.unwrap_or(CandidateStage::Applied),
        resume_url: Some(input.resume_url.unwrap_or_else(|| "#".to_string())),
        skills: None,
        address: None,
        age: None,
        experience: None,
        linkedin: None,
        gender: None,
        created_at: Utc::now(),
    };
    let candidate = commit_write(&state, |db| {
        db.candidates.insert(candidate.clone())?;
        Ok(candidate)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

const CANDIDATE_PROTECTED_FIELDS: [&str; 2] = ["id", "createdAt"];

fn patched_candidate(
    db: &Database,
    id: &str,
    patch: &Map<String, JsonValue>,
) -> Result<Candidate, ApiError> {
    let existing = db.candidates.get(id).ok_or_else(ApiError::not_found)?;
    let mut updated: Candidate = merge_patch(existing, patch, &CANDIDATE_PROTECTED_FIELDS)?;
    updated.email = updated.email.trim().to_lowercase();
    if updated.name.trim().is_empty() || updated.email.is_empty() {
        return Err(ApiError::Validation("Name and email required".to_string()));
    }
    Ok(updated)
}

/// Apply a candidate update; a stage differing from the stored one appends one audit event.
pub fn apply_candidate_update(
    db: &mut Database,
    updated: Candidate,
) -> Result<Candidate, ApiError> {
    let prior_stage = db
        .candidates
        .get(&updated.id)
        .map(|c| c.stage)
        .ok_or_else(ApiError::not_found)?;
    db.candidates.update(&updated.id, |row| *row = updated.clone())?;
    if updated.stage != prior_stage {
        db.timelines
            .insert(TimelineEvent::stage_change(&updated.id, updated.stage, Utc::now()))?;
    }
    Ok(updated)
}

pub async fn update_candidate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Map<String, JsonValue>>, JsonRejection>,
) -> Result<Json<Candidate>, ApiError> {
    let Json(patch) = payload?;
    state.store.read(|db| patched_candidate(db, &id, &patch)).await?;

    let candidate = commit_write(&state, |db| {
        let updated = patched_candidate(db, &id, &patch)?;
        apply_candidate_update(db, updated)
    })
    .await?;
    Ok(Json(candidate))
}

pub async fn candidate_timeline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Items<TimelineEvent>>, ApiError> {
    let mut items = state
        .store
        .read(|db| {
            db.timelines
                .where_equals("candidateId", id.as_str())
                .map(|rows| rows.into_iter().cloned().collect::<Vec<_>>())
        })
        .await?;
    items.sort_by_key(|event| event.at);
    Ok(Json(Items { items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tflow_core::TimelineEventKind;

    fn db_with_candidate(stage: CandidateStage) -> Database {
        let mut db = Database::default();
        db.candidates
            .insert(Candidate {
                id: "c1".into(),
                name: "Diya Iyer".into(),
                email: "diya.iyer@example.com".into(),
                job_id: "j1".into(),
                stage,
                resume_url: None,
                skills: None,
                address: None,
                age: None,
                experience: None,
                linkedin: None,
                gender: None,
                created_at: Utc::now(),
            })
            .unwrap();
        db
    }

    fn stage_patch(stage: &str) -> Map<String, JsonValue> {
        let mut patch = Map::new();
        patch.insert("stage".into(), JsonValue::from(stage));
        patch
    }

    #[test]
    fn stage_change_appends_exactly_one_event() {
        let mut db = db_with_candidate(CandidateStage::Applied);
        let updated = patched_candidate(&db, "c1", &stage_patch("tech")).unwrap();
        apply_candidate_update(&mut db, updated).unwrap();

        let events = db.timelines.where_equals("candidateId", "c1").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TimelineEventKind::StageChange);
        assert_eq!(events[0].stage, Some(CandidateStage::Tech));
    }

    #[test]
    fn unchanged_stage_appends_nothing() {
        let mut db = db_with_candidate(CandidateStage::Tech);
        let updated = patched_candidate(&db, "c1", &stage_patch("tech")).unwrap();
        apply_candidate_update(&mut db, updated).unwrap();

        let mut patch = Map::new();
        patch.insert("name".into(), JsonValue::from("Diya R. Iyer"));
        let updated = patched_candidate(&db, "c1", &patch).unwrap();
        apply_candidate_update(&mut db, updated).unwrap();

        assert_eq!(db.timelines.count(), 0);
        assert_eq!(db.candidates.get("c1").unwrap().name, "Diya R. Iyer");
    }

    #[test]
    fn patch_email_is_lower_cased_and_stage_validated() {
        let db = db_with_candidate(CandidateStage::Applied);
        let mut patch = Map::new();
        patch.insert("email".into(), JsonValue::from("Diya@Example.COM"));
        let updated = patched_candidate(&db, "c1", &patch).unwrap();
        assert_eq!(updated.email, "diya@example.com");

        assert!(matches!(
            patched_candidate(&db, "c1", &stage_patch("interviewing")),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            patched_candidate(&db, "nobody", &stage_patch("tech")),
            Err(ApiError::NotFound(_))
        ));
    }
}
