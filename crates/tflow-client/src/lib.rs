//! Request builders for the TalentFlow API, generic over the transport that answers them.

pub mod error;
pub mod transport;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tflow_core::{
    AssessmentDocument, AssessmentResponse, AssessmentUpdate, Candidate, CandidateStage, Items,
    Job, JobStatus, NewCandidate, NewJob, Page, Reorder, Section, Submission, TimelineEvent,
};
use tracing::debug;
use url::Url;

pub use crate::error::{ClientError, ClientResult};
pub use crate::transport::{ApiRequest, ApiResponse, HttpTransport, NoNetwork, Transport};

pub const CRATE_NAME: &str = "tflow-client";

/// Path prefix every API route lives under.
pub const API_NAMESPACE: &str = "/api";

const PATH_ROOT: &str = "http://localhost/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobSort {
    #[default]
    Order,
    NewestFirst,
}

impl JobSort {
    pub fn as_str(self) -> &'static str {
        match self {
            JobSort::Order => "order",
            JobSort::NewestFirst => "-createdAt",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobsQuery {
    pub search: Option<String>,
    pub status: Option<JobStatus>,
    pub sort: Option<JobSort>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct CandidatesQuery {
    pub search: Option<String>,
    pub stage: Option<CandidateStage>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Partial job update; unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stipend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Partial candidate update; unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<CandidateStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Typed bindings for every TalentFlow route. No retries and no caching.
#[derive(Debug, Clone)]
pub struct TalentClient<T> {
    transport: T,
}

impl<T: Transport> TalentClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn list_jobs(&self, query: &JobsQuery) -> ClientResult<Page<Job>> {
        let mut req = ApiRequest::get(api_path(&["jobs"])?);
        if let Some(search) = &query.search {
            req = req.query("search", search);
        }
        if let Some(status) = query.status {
            req = req.query("status", status);
        }
        if let Some(page) = query.page {
            req = req.query("page", page);
        }
        if let Some(page_size) = query.page_size {
            req = req.query("pageSize", page_size);
        }
        if let Some(sort) = query.sort {
            req = req.query("sort", sort.as_str());
        }
        self.execute(req).await
    }

    pub async fn create_job(&self, input: &NewJob) -> ClientResult<Job> {
        self.execute(ApiRequest::new(Method::POST, api_path(&["jobs"])?).json(input)?)
            .await
    }

    pub async fn update_job(&self, id: &str, patch: &JobPatch) -> ClientResult<Job> {
        let path = api_path(&["jobs", id])?;
        self.execute(ApiRequest::new(Method::PATCH, path).json(patch)?)
            .await
    }

    pub async fn reorder_job(
        &self,
        id: &str,
        from_order: i64,
        to_order: i64,
    ) -> ClientResult<Reorder> {
        let path = api_path(&["jobs", id, "reorder"])?;
        let body = Reorder {
            from_order: Some(from_order),
            to_order: Some(to_order),
        };
        self.execute(ApiRequest::new(Method::PATCH, path).json(&body)?)
            .await
    }

    pub async fn list_candidates(&self, query: &CandidatesQuery) -> ClientResult<Page<Candidate>> {
        let mut req = ApiRequest::get(api_path(&["candidates"])?);
        if let Some(search) = &query.search {
            req = req.query("search", search);
        }
        if let Some(stage) = query.stage {
            req = req.query("stage", stage);
        }
        if let Some(page) = query.page {
            req = req.query("page", page);
        }
        if let Some(page_size) = query.page_size {
            req = req.query("pageSize", page_size);
        }
        self.execute(req).await
    }

    pub async fn create_candidate(&self, input: &NewCandidate) -> ClientResult<Candidate> {
        self.execute(ApiRequest::new(Method::POST, api_path(&["candidates"])?).json(input)?)
            .await
    }

    pub async fn update_candidate(
        &self,
        id: &str,
        patch: &CandidatePatch,
    ) -> ClientResult<Candidate> {
        let path = api_path(&["candidates", id])?;
        self.execute(ApiRequest::new(Method::PATCH, path).json(patch)?)
            .await
    }

    pub async fn candidate_timeline(&self, id: &str) -> ClientResult<Vec<TimelineEvent>> {
        let path = api_path(&["candidates", id, "timeline"])?;
        let items: Items<TimelineEvent> = self.execute(ApiRequest::get(path)).await?;
        Ok(items.items)
    }

    pub async fn get_assessment(&self, job_id: &str) -> ClientResult<AssessmentDocument> {
        self.execute(ApiRequest::get(api_path(&["assessments", job_id])?))
            .await
    }

    pub async fn put_assessment(
        &self,
        job_id: &str,
        sections: Vec<Section>,
    ) -> ClientResult<AssessmentDocument> {
        let path = api_path(&["assessments", job_id])?;
        let body = AssessmentUpdate { sections };
        self.execute(ApiRequest::new(Method::PUT, path).json(&body)?)
            .await
    }

    pub async fn submit_assessment(
        &self,
        job_id: &str,
        candidate_id: &str,
        answers: Map<String, JsonValue>,
    ) -> ClientResult<AssessmentResponse> {
        let path = api_path(&["assessments", job_id, "submit"])?;
        let body = Submission {
            candidate_id: candidate_id.to_string(),
            answers,
        };
        self.execute(ApiRequest::new(Method::POST, path).json(&body)?)
            .await
    }

    async fn execute<R: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<R> {
        let method = request.method.clone();
        let uri = request.uri();
        let resp = self.transport.send(request).await?;
        debug!(%method, %uri, status = resp.status.as_u16(), "api call finished");

        if !resp.status.is_success() {
            return Err(ClientError::Api {
                status: resp.status,
                message: error_message(&resp),
            });
        }
        Ok(serde_json::from_slice(&resp.body)?)
    }
}

/// Absolute route path under the namespace; every segment is percent-encoded.
fn api_path(segments: &[&str]) -> ClientResult<String> {
    let mut url = Url::parse(PATH_ROOT)?;
    url.path_segments_mut()
        .map_err(|()| ClientError::Transport(format!("{PATH_ROOT} cannot hold a path")))?
        .pop_if_empty()
        .extend(API_NAMESPACE.split('/').filter(|s| !s.is_empty()))
        .extend(segments);
    Ok(url.path().to_string())
}

fn error_message(resp: &ApiResponse) -> String {
    serde_json::from_slice::<ErrorBody>(&resp.body)
        .ok()
        .and_then(|b| b.message)
        .or_else(|| {
            let text = String::from_utf8_lossy(&resp.body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| format!("request failed with status {}", resp.status))
}
