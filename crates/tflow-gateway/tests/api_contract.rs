use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Map, Value as JsonValue};
use tflow_client::{
    ApiRequest, CandidatePatch, CandidatesQuery, ClientError, JobPatch, JobsQuery, TalentClient,
    Transport,
};
use tflow_core::{CandidateStage, JobStatus, NewCandidate, NewJob, TimelineEventKind};
use tflow_gateway::{AppState, FaultPolicy, GatewayTransport};
use tflow_seed::{ensure_seeded, SeedOutcome};
use tflow_storage::Store;

async fn client() -> (TalentClient<GatewayTransport>, Store) {
    let store = Store::in_memory();
    ensure_seeded(&store, &mut StdRng::seed_from_u64(7))
        .await
        .unwrap();
    let state = AppState::new(store.clone(), FaultPolicy::disabled());
    (TalentClient::new(GatewayTransport::new(state)), store)
}

fn all_jobs() -> JobsQuery {
    JobsQuery {
        page_size: Some(100),
        ..JobsQuery::default()
    }
}

fn object(value: JsonValue) -> Map<String, JsonValue> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn reorder_keeps_orders_contiguous() {
    let (client, _store) = client().await;
    let before = client.list_jobs(&all_jobs()).await.unwrap().items;
    let moved = before[3].id.clone();

    let echo = client.reorder_job(&moved, 3, 0).await.unwrap();
    assert_eq!(echo.to_order, Some(0));

    let after = client.list_jobs(&all_jobs()).await.unwrap().items;
    assert_eq!(after[0].id, moved);
    assert_eq!(after[1].id, before[0].id);
    let orders = after.iter().map(|j| j.order).collect::<Vec<_>>();
    assert_eq!(orders, (0..25).collect::<Vec<u32>>());
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
    let (client, _store) = client().await;
    let created = client
        .create_job(&NewJob {
            title: "Platform Engineer".into(),
            ..NewJob::default()
        })
        .await
        .unwrap();
    assert_eq!(created.slug, "platform-engineer");
    assert_eq!(created.order, 25);
    assert_eq!(created.status, JobStatus::Active);

    let err = client
        .create_job(&NewJob {
            title: "Another".into(),
            slug: Some("platform-engineer".into()),
            ..NewJob::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert!(!err.is_transient());

    let patched = client
        .update_job(
            &created.id,
            &JobPatch {
                status: Some(JobStatus::Archived),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.status, JobStatus::Archived);
    assert_eq!(patched.slug, "platform-engineer");

    let deadline = Utc.with_ymd_and_hms(2026, 3, 3, 12, 0, 0).single().unwrap();
    let patched = client
        .update_job(
            &created.id,
            &JobPatch {
                deadline: Some(deadline),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.deadline, Some(deadline));
    assert_eq!(patched.status, JobStatus::Archived);
}

#[tokio::test]
async fn status_filter_counts_only_matches() {
    let (client, _store) = client().await;
    let everything = client.list_jobs(&all_jobs()).await.unwrap();
    let archived_count = everything
        .items
        .iter()
        .filter(|j| j.status == JobStatus::Archived)
        .count();

    let archived = client
        .list_jobs(&JobsQuery {
            status: Some(JobStatus::Archived),
            page_size: Some(100),
            ..JobsQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(archived.total, archived_count);
    assert!(archived.items.iter().all(|j| j.status == JobStatus::Archived));
}

#[tokio::test]
async fn candidate_search_and_stage_timeline() {
    let (client, _store) = client().await;
    let created = client
        .create_candidate(&NewCandidate {
            name: "  Zephyrine Quill ".into(),
            email: "Zephyrine.Quill@Example.com".into(),
            ..NewCandidate::default()
        })
        .await
        .unwrap();
    assert_eq!(created.name, "Zephyrine Quill");
    assert_eq!(created.email, "zephyrine.quill@example.com");
    assert_eq!(created.stage, CandidateStage::Applied);

    let found = client
        .list_candidates(&CandidatesQuery {
            search: Some("zephyrine".into()),
            ..CandidatesQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.page_size, 50);

    client
        .update_candidate(
            &created.id,
            &CandidatePatch {
                stage: Some(CandidateStage::Screen),
                ..CandidatePatch::default()
            },
        )
        .await
        .unwrap();
    let timeline = client.candidate_timeline(&created.id).await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].kind, TimelineEventKind::StageChange);
    assert_eq!(timeline[0].stage, Some(CandidateStage::Screen));

    assert!(client.candidate_timeline("nobody").await.unwrap().is_empty());
    assert!(client.candidate_timeline("no/such?id").await.unwrap().is_empty());
}

#[tokio::test]
async fn assessments_default_empty_and_submissions_accumulate() {
    let (client, store) = client().await;
    let missing = client.get_assessment("no-such-job").await.unwrap();
    assert_eq!(missing.job_id, "no-such-job");
    assert!(missing.sections.is_empty());

    let jobs = client.list_jobs(&all_jobs()).await.unwrap().items;
    let job_id = jobs[0].id.clone();
    let doc = client.get_assessment(&job_id).await.unwrap();
    assert_eq!(doc.sections.len(), 3);

    let saved = client
        .put_assessment(&job_id, doc.sections[..1].to_vec())
        .await
        .unwrap();
    assert_eq!(saved.sections.len(), 1);
    assert_eq!(client.get_assessment(&job_id).await.unwrap().sections.len(), 1);

    let answers = object(json!({ "q1": "Yes" }));
    let first = client
        .submit_assessment(&job_id, "cand-1", answers.clone())
        .await
        .unwrap();
    let second = client
        .submit_assessment(&job_id, "cand-1", answers)
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
    let stored = store
        .read(|db| db.responses.where_equals("jobId", job_id.as_str()).unwrap().len())
        .await;
    assert_eq!(stored, 2);
}

#[tokio::test]
async fn requests_outside_namespace_pass_through() {
    let (client, _store) = client().await;
    let err = client
        .transport()
        .send(ApiRequest::get("/assets/logo.svg"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unroutable(path) if path == "/assets/logo.svg"));
}

#[tokio::test]
async fn unknown_job_patch_is_not_found() {
    let (client, _store) = client().await;
    let err = client
        .update_job("ghost", &JobPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert!(matches!(err, ClientError::Api { ref message, .. } if message == "Not found"));
}

#[tokio::test]
async fn committed_writes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("talentflow-db.json");
    let store = Store::open(&path).await.unwrap();
    ensure_seeded(&store, &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();
    let state = AppState::new(store.clone(), FaultPolicy::disabled());
    let client = TalentClient::new(GatewayTransport::new(state));
    let job = client
        .create_job(&NewJob {
            title: "Durable Role".into(),
            ..NewJob::default()
        })
        .await
        .unwrap();
    store.close().await.unwrap();

    let reopened = Store::open(&path).await.unwrap();
    assert!(reopened.read(|db| db.jobs.contains(&job.id)).await);
    let again = ensure_seeded(&reopened, &mut StdRng::seed_from_u64(2))
        .await
        .unwrap();
    assert_eq!(again, SeedOutcome::AlreadySeeded);
}
