//! Job posting routes: listing, creation, patching and manual reordering.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use tflow_core::{new_id, slugify, Job, JobStatus, NewJob, Page, Reorder};
use tflow_storage::Database;

use crate::error::ApiError;
use crate::faults::commit_write;
use crate::listing::{exact_filter, search_needle, Paging, DEFAULT_JOBS_PAGE_SIZE};
use crate::{merge_patch, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsParams {
    search: Option<String>,
    status: Option<String>,
    sort: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobOrdering {
    Rank,
    NewestFirst,
}

impl JobOrdering {
    fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw.map(str::trim).unwrap_or_default() {
            "" | "order" => Ok(JobOrdering::Rank),
            "-createdAt" => Ok(JobOrdering::NewestFirst),
            other => Err(ApiError::Validation(format!("unsupported sort {other:?}"))),
        }
    }
}

pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    params: Result<Query<JobsParams>, QueryRejection>,
) -> Result<Json<Page<Job>>, ApiError> {
    let Query(params) = params?;
    let paging = Paging::parse(
        params.page.as_deref(),
        params.page_size.as_deref(),
        DEFAULT_JOBS_PAGE_SIZE,
    )?;
    let ordering = JobOrdering::parse(params.sort.as_deref())?;
    let needle = search_needle(params.search.as_deref());
    let status = exact_filter(params.status.as_deref());

    let mut matches = state
        .store
        .read(|db| {
            db.jobs
                .filter(|job| {
                    let text_ok = needle.as_deref().map_or(true, |n| {
                        job.title.to_lowercase().contains(n) || job.slug.to_lowercase().contains(n)
                    });
                    let status_ok = status.map_or(true, |s| job.status.as_str() == s);
                    text_ok && status_ok
                })
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
        .await;

    match ordering {
        JobOrdering::Rank => matches.sort_by_key(|job| job.order),
        JobOrdering::NewestFirst => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    Ok(Json(paging.apply(matches)))
}

fn ensure_slug_free(db: &Database, slug: &str) -> Result<(), ApiError> {
    if db.jobs.where_equals("slug", slug)?.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation("Slug must be unique".to_string()))
    }
}

pub async fn create_job(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewJob>, JsonRejection>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    let Json(input) = payload?;
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("Title required".to_string()));
    }
    let slug = input
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| slugify(&title))
        .to_lowercase();
    if slug.is_empty() {
        return Err(ApiError::Validation("Slug required".to_string()));
    }
    state.store.read(|db| ensure_slug_free(db, &slug)).await?;

    let job = commit_write(&state, |db| {
        ensure_slug_free(db, &slug)?;
        let job = Job {
            id: new_id(),
            title,
            slug,
            status: input.status.unwrap_or(JobStatus::Active),
            tags: input.tags.unwrap_or_default(),
            order: u32::try_from(db.jobs.count())
                .map_err(|_| ApiError::Internal("job count exceeds order range".to_string()))?,
            description: input.description.unwrap_or_default(),
            requirements: input.requirements.unwrap_or_default(),
            stipend: input.stipend,
            deadline: input.deadline,
            scope: input.scope,
            created_at: Utc::now(),
        };
        db.jobs.insert(job.clone())?;
        Ok(job)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// Fields a patch may never rewrite: identity, rank (owned by reorder) and creation time.
const JOB_PROTECTED_FIELDS: [&str; 3] = ["id", "order", "createdAt"];

fn patched_job(db: &Database, id: &str, patch: &Map<String, JsonValue>) -> Result<Job, ApiError> {
    let existing = db.jobs.get(id).ok_or_else(ApiError::not_found)?;
    let updated: Job = merge_patch(existing, patch, &JOB_PROTECTED_FIELDS)?;
    if updated.title.trim().is_empty() {
        return Err(ApiError::Validation("Title required".to_string()));
    }
    if updated.slug.trim().is_empty() {
        return Err(ApiError::Validation("Slug required".to_string()));
    }
    if updated.slug != existing.slug {
        ensure_slug_free(db, &updated.slug)?;
    }
    Ok(updated)
}

pub async fn update_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Map<String, JsonValue>>, JsonRejection>,
) -> Result<Json<Job>, ApiError> {
    let Json(patch) = payload?;
    state.store.read(|db| patched_job(db, &id, &patch)).await?;

    let job = commit_write(&state, |db| {
        let updated = patched_job(db, &id, &patch)?;
        db.jobs.update(&id, |row| *row = updated.clone())?;
        Ok(updated)
    })
    .await?;
    Ok(Json(job))
}

/// Move `id` to `to_index` in the full rank sequence and renumber every job densely.
pub fn reorder_in(db: &mut Database, id: &str, to_index: usize) -> Result<(), ApiError> {
    let mut ranked = db
        .jobs
        .order_by("order")?
        .into_iter()
        .map(|job| job.id.clone())
        .collect::<Vec<_>>();
    let from_index = ranked
        .iter()
        .position(|job_id| job_id == id)
        .ok_or_else(ApiError::not_found)?;
    let moved = ranked.remove(from_index);
    ranked.insert(to_index.min(ranked.len()), moved);

    for (rank, job_id) in ranked.iter().enumerate() {
        let rank = u32::try_from(rank)
            .map_err(|_| ApiError::Internal("job count exceeds order range".to_string()))?;
        db.jobs.update(job_id, |job| job.order = rank)?;
    }
    Ok(())
}

pub async fn reorder_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Reorder>, JsonRejection>,
) -> Result<Json<Reorder>, ApiError> {
    let Json(request) = payload?;
    let to_order = request
        .to_order
        .ok_or_else(|| ApiError::Validation("toOrder required".to_string()))?;
    let to_index = usize::try_from(to_order)
        .map_err(|_| ApiError::Validation("toOrder must not be negative".to_string()))?;
    if !state.store.read(|db| db.jobs.contains(&id)).await {
        return Err(ApiError::not_found());
    }

    commit_write(&state, |db| reorder_in(db, &id, to_index)).await?;
    Ok(Json(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn seeded_db(count: u32) -> Database {
        let base = Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).single().unwrap();
        let mut db = Database::default();
        for i in 0..count {
            db.jobs
                .insert(Job {
                    id: format!("job-{i}"),
                    title: format!("Job {i}"),
                    slug: format!("job-{i}"),
                    status: JobStatus::Active,
                    tags: vec![],
                    order: i,
                    description: String::new(),
                    requirements: vec![],
                    stipend: None,
                    deadline: None,
                    scope: None,
                    created_at: base + Duration::days(i64::from(i)),
                })
                .unwrap();
        }
        db
    }

    fn ranked_ids(db: &Database) -> Vec<String> {
        db.jobs
            .order_by("order")
            .unwrap()
            .into_iter()
            .map(|j| j.id.clone())
            .collect()
    }

    #[test]
    fn moving_fourth_to_front_shifts_the_rest() {
        let mut db = seeded_db(5);
        reorder_in(&mut db, "job-3", 0).unwrap();
        assert_eq!(ranked_ids(&db), vec!["job-3", "job-0", "job-1", "job-2", "job-4"]);
        let orders = db
            .jobs
            .order_by("order")
            .unwrap()
            .iter()
            .map(|j| j.order)
            .collect::<Vec<_>>();
        assert_eq!(orders, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn target_past_the_end_appends_and_stays_dense() {
        let mut db = seeded_db(4);
        reorder_in(&mut db, "job-0", 99).unwrap();
        assert_eq!(ranked_ids(&db), vec!["job-1", "job-2", "job-3", "job-0"]);
        assert_eq!(db.jobs.get("job-0").unwrap().order, 3);
    }

    #[test]
    fn unknown_job_is_not_found() {
        let mut db = seeded_db(2);
        assert!(matches!(reorder_in(&mut db, "ghost", 0), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn patch_cannot_steal_a_slug_or_move_rank() {
        let db = seeded_db(3);
        let mut patch = Map::new();
        patch.insert("slug".into(), JsonValue::from("job-2"));
        assert!(matches!(
            patched_job(&db, "job-0", &patch),
            Err(ApiError::Validation(_))
        ));

        let mut patch = Map::new();
        patch.insert("order".into(), JsonValue::from(9));
        patch.insert("title".into(), JsonValue::from("Renamed"));
        let updated = patched_job(&db, "job-0", &patch).unwrap();
        assert_eq!(updated.order, 0);
        assert_eq!(updated.title, "Renamed");
    }
}
