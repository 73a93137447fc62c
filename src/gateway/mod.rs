//! API gateway: the single entry point for every backend request.
//!
//! Two strategies implement [`ApiGateway`]: [`HttpGateway`] talks to the
//! real backend, [`FixtureGateway`] answers from canned demo data. One is
//! picked at startup by [`select_gateway`].

mod fixture;
mod http;
#[cfg(test)]
pub(crate) mod stub;

pub use fixture::{FixtureGateway, DEMO_TOKEN};
pub use http::HttpGateway;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ApiConfig, ApiMode, DemoConfig};
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One backend call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Path (and query) appended to the base URL, e.g. `/api/v1/cards`
    pub endpoint: String,
    pub method: Method,
    pub body: Option<Value>,
    /// Bearer token, attached as `Authorization: Bearer <token>`
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: None,
            bearer: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, endpoint).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// Failure of a single gateway call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Backend answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Backend could not be reached
    #[error("{0}")]
    Network(String),

    /// Success status but the body was not valid JSON
    #[error("{0}")]
    Decode(String),

    /// Demo mode has no canned answer for this request
    #[error("{0}")]
    NoFixture(String),
}

impl From<GatewayError> for ClientError {
    fn from(err: GatewayError) -> Self {
        ClientError::Transport(err.to_string())
    }
}

#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// Perform the request and return the decoded JSON body
    async fn request(&self, request: &ApiRequest) -> Result<Value, GatewayError>;

    /// Which mode this gateway serves
    fn mode(&self) -> ApiMode;
}

/// Build the gateway for the configured mode
pub fn select_gateway(api: &ApiConfig, demo: &DemoConfig) -> Result<Arc<dyn ApiGateway>> {
    match api.mode {
        ApiMode::Live => {
            let gateway = HttpGateway::new(&api.base_url, api.timeout())?;
            tracing::info!("Using live API at {}", api.base_url);
            Ok(Arc::new(gateway))
        }
        ApiMode::Demo => {
            tracing::info!("Demo mode: answering requests from fixtures");
            Ok(Arc::new(FixtureGateway::new(demo.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::post("/api/v1/auth/login", json!({"a": 1}))
            .with_bearer(Some("tok".to_string()));
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body, Some(json!({"a": 1})));
        assert_eq!(req.bearer.as_deref(), Some("tok"));

        let req = ApiRequest::get("/api/v1/cards");
        assert_eq!(req.method.to_string(), "GET");
        assert!(req.body.is_none());
        assert!(req.bearer.is_none());
    }

    #[test]
    fn test_gateway_error_becomes_transport() {
        let err: ClientError = GatewayError::Status {
            status: 401,
            message: "Invalid credentials".to_string(),
        }
        .into();
        assert_eq!(err, ClientError::Transport("Invalid credentials".to_string()));
    }

    #[test]
    fn test_select_gateway_by_mode() {
        let mut api = ApiConfig::default();
        let demo = DemoConfig::instant();

        let gateway = select_gateway(&api, &demo).unwrap();
        assert_eq!(gateway.mode(), ApiMode::Live);

        api.mode = ApiMode::Demo;
        let gateway = select_gateway(&api, &demo).unwrap();
        assert_eq!(gateway.mode(), ApiMode::Demo);
    }
}
