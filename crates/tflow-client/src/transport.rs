//! The seam between API bindings and whatever answers their requests.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value as JsonValue;
use url::{form_urlencoded, Url};

use crate::error::{ClientError, ClientResult};

/// An HTTP-shaped request: method, absolute path, query pairs and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Add a query parameter; empty values are omitted.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.query.push((key.to_string(), value));
        }
        self
    }

    pub fn json(mut self, body: &impl Serialize) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    /// Path plus encoded query, as it would appear on the wire.
    pub fn uri(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json(status: StatusCode, body: &JsonValue) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        (**self).send(request).await
    }
}

/// Sends requests over the real network, relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent("tflow-client/0.1")
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_url(base_url: &str) -> ClientResult<Self> {
        Self::new(Url::parse(base_url)?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let mut url = self.base_url.join(&request.path)?;
        if !request.query.is_empty() {
            url.set_query(Some(&request.query_string()));
        }

        let mut builder = self.client.request(request.method, url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        Ok(ApiResponse { status, body })
    }
}

/// Transport that refuses everything; the passthrough target when no real network is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNetwork;

#[async_trait]
impl Transport for NoNetwork {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        Err(ClientError::Unroutable(request.uri()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_values_are_dropped() {
        let req = ApiRequest::get("/api/jobs")
            .query("search", "data eng")
            .query("status", "")
            .query("page", 2);
        assert_eq!(req.uri(), "/api/jobs?search=data+eng&page=2");
    }

    #[test]
    fn bare_path_has_no_question_mark() {
        assert_eq!(ApiRequest::get("/api/candidates").uri(), "/api/candidates");
    }

    #[tokio::test]
    async fn no_network_rejects_with_the_uri() {
        let err = NoNetwork
            .send(ApiRequest::get("/assets/app.css"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unroutable(uri) if uri == "/assets/app.css"));
    }
}
