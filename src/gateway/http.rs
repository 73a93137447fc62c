use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

use super::{ApiGateway, ApiRequest, GatewayError};
use crate::config::ApiMode;

const NETWORK_ERROR: &str = "Network error or server unreachable.";
const NOT_JSON_ERROR: &str = "Server error or invalid response (Not JSON)";

/// Gateway backed by the real FuelPoa backend
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn request(&self, request: &ApiRequest) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.base_url, request.endpoint);
        debug!(method = %request.method, url = %url, "API request");

        let mut builder = self
            .client
            .request(request.method.into(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!("API call to {} failed: {}", request.endpoint, e);
            let message = e.to_string();
            GatewayError::Network(if message.is_empty() {
                NETWORK_ERROR.to_string()
            } else {
                message
            })
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            error!("Failed to read response from {}: {}", request.endpoint, e);
            GatewayError::Network(NETWORK_ERROR.to_string())
        })?;

        if !status.is_success() {
            let message = error_message(status, &text);
            error!(status = status.as_u16(), "API call to {} failed: {}", request.endpoint, message);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(json!({}));
        }

        serde_json::from_str(&text).map_err(|e| {
            error!("Invalid JSON from {}: {}", request.endpoint, e);
            GatewayError::Decode(NOT_JSON_ERROR.to_string())
        })
    }

    fn mode(&self) -> ApiMode {
        ApiMode::Live
    }
}

/// Message for a non-success response.
///
/// Prefers the server's own `message` (top level, or nested under `error`).
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .get("message")
            .or_else(|| value.pointer("/error/message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("API call failed with status {}", status.as_u16())),
        Err(_) => NOT_JSON_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn gateway(server: &MockServer) -> HttpGateway {
        HttpGateway::new(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_error_message_extraction() {
        let status = StatusCode::UNAUTHORIZED;
        assert_eq!(
            error_message(status, r#"{"message":"Invalid credentials"}"#),
            "Invalid credentials"
        );
        assert_eq!(
            error_message(status, r#"{"error":{"message":"Token expired"}}"#),
            "Token expired"
        );
        assert_eq!(
            error_message(status, r#"{"detail":"nope"}"#),
            "API call failed with status 401"
        );
        assert_eq!(error_message(status, "<html>502</html>"), NOT_JSON_ERROR);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let gateway = HttpGateway::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_post_sends_json_and_bearer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/payments/stk_push")
                    .header("content-type", "application/json")
                    .header("authorization", "Bearer tok-123")
                    .json_body(serde_json::json!({"amount": 500, "phone": "0712345678"}));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({"message": "queued"}));
            })
            .await;

        let request = ApiRequest::post(
            "/api/v1/payments/stk_push",
            serde_json::json!({"amount": 500, "phone": "0712345678"}),
        )
        .with_bearer(Some("tok-123".to_string()));

        let body = gateway(&server).request(&request).await.unwrap();
        mock.assert_async().await;
        assert_eq!(body["message"], "queued");
    }

    #[tokio::test]
    async fn test_empty_success_body_is_empty_object() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/cards/activate");
                then.status(204);
            })
            .await;

        let request = ApiRequest::post("/api/v1/cards/activate", serde_json::json!({}));
        let body = gateway(&server).request(&request).await.unwrap();
        assert_eq!(body, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_error_status_uses_server_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/auth/login");
                then.status(401)
                    .json_body(serde_json::json!({"message": "Invalid credentials"}));
            })
            .await;

        let request = ApiRequest::post("/api/v1/auth/login", serde_json::json!({}));
        let err = gateway(&server).request(&request).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Status {
                status: 401,
                message: "Invalid credentials".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_error_status_without_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/cards");
                then.status(500).json_body(serde_json::json!({"ok": false}));
            })
            .await;

        let err = gateway(&server)
            .request(&ApiRequest::get("/api/v1/cards"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API call failed with status 500");
    }

    #[tokio::test]
    async fn test_error_status_with_html_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/dashboard/stats");
                then.status(502).body("<html>Bad Gateway</html>");
            })
            .await;

        let err = gateway(&server)
            .request(&ApiRequest::get("/api/v1/dashboard/stats"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), NOT_JSON_ERROR);
    }

    #[tokio::test]
    async fn test_query_string_is_kept() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/transactions/customer")
                    .query_param("limit", "50");
                then.status(200)
                    .json_body(serde_json::json!({"transactions": []}));
            })
            .await;

        let body = gateway(&server)
            .request(&ApiRequest::get("/api/v1/transactions/customer?limit=50"))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(body["transactions"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let gateway = HttpGateway::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = gateway
            .request(&ApiRequest::get("/api/v1/cards"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Network(ref m) if !m.is_empty()));
    }
}
