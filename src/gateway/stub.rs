//! Scripted gateway for unit tests: fixed answers per endpoint and a log
//! of every request made.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ApiGateway, ApiRequest, GatewayError};
use crate::config::ApiMode;

#[derive(Default)]
pub(crate) struct StubGateway {
    answers: HashMap<String, Result<Value, GatewayError>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl StubGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, endpoint: &str, body: Value) -> Self {
        self.answers.insert(endpoint.to_string(), Ok(body));
        self
    }

    pub(crate) fn fail(mut self, endpoint: &str, err: GatewayError) -> Self {
        self.answers.insert(endpoint.to_string(), Err(err));
        self
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiGateway for StubGateway {
    async fn request(&self, request: &ApiRequest) -> Result<Value, GatewayError> {
        self.calls.lock().unwrap().push(request.clone());
        self.answers
            .get(&request.endpoint)
            .cloned()
            .unwrap_or_else(|| {
                Err(GatewayError::NoFixture(format!(
                    "unexpected request {} {}",
                    request.method, request.endpoint
                )))
            })
    }

    fn mode(&self) -> ApiMode {
        ApiMode::Demo
    }
}
