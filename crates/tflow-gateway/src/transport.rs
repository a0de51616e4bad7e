//! In-process transport: requests under the API namespace are answered by the gateway router,
//! everything else goes to the passthrough transport unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use http_body_util::BodyExt;
use tflow_client::{
    ApiRequest, ApiResponse, ClientError, ClientResult, NoNetwork, Transport, API_NAMESPACE,
};
use tower::ServiceExt;
use tracing::trace;

use crate::{app, AppState};

#[derive(Clone)]
pub struct GatewayTransport {
    router: Router,
    passthrough: Arc<dyn Transport>,
}

impl GatewayTransport {
    /// Gateway over `state`; requests outside the namespace fail as unroutable.
    pub fn new(state: AppState) -> Self {
        Self::with_passthrough(state, NoNetwork)
    }

    pub fn with_passthrough(state: AppState, passthrough: impl Transport + 'static) -> Self {
        Self {
            router: app(state),
            passthrough: Arc::new(passthrough),
        }
    }

    pub fn intercepts(path: &str) -> bool {
        path == API_NAMESPACE
            || path
                .strip_prefix(API_NAMESPACE)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[async_trait]
impl Transport for GatewayTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        if !Self::intercepts(&request.path) {
            trace!(path = %request.path, "passing request through");
            return self.passthrough.send(request).await;
        }

        let mut builder = Request::builder()
            .method(request.method.clone())
            .uri(request.uri());
        let body = match &request.body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(json)?)
            }
            None => Body::empty(),
        };
        let http_request = builder
            .body(body)
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        let resp = self
            .router
            .clone()
            .oneshot(http_request)
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?
            .to_bytes()
            .to_vec();
        Ok(ApiResponse { status, body })
    }
}
