pub mod admin;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod money;
pub mod pos;
pub mod router;
pub mod session;
pub mod validation;
pub mod wallet;

pub use error::{ClientError, ClientResult};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{AuthGate, LoginOutcome, LoginRequest};
use crate::config::Config;
use crate::gateway::{select_gateway, ApiGateway, ApiRequest, Method};
use crate::router::{Navigation, Route};
use crate::session::{AreaSession, FileStateStore, LoginRole, Session, SessionStore, StateStore};
use crate::validation::RegistrationForm;

/// Client context passed to every operation: configuration, the selected
/// gateway, and the auth gate with its session and router.
pub struct FuelPoa {
    config: Config,
    gateway: Arc<dyn ApiGateway>,
    auth: AuthGate,
}

impl FuelPoa {
    pub fn new(config: Config, gateway: Arc<dyn ApiGateway>, storage: Box<dyn StateStore>) -> Self {
        Self {
            config,
            gateway,
            auth: AuthGate::new(SessionStore::new(storage)),
        }
    }

    /// Select the gateway from configuration, open the state file and
    /// resume any saved session.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let gateway = select_gateway(&config.api, &config.demo)?;
        let storage = FileStateStore::new(&config.session.state_file);
        let mut client = Self::new(config, gateway, Box::new(storage));
        if let Some(session) = client.restore() {
            debug!(user = %session.identity().id, "Resumed saved session");
        }
        Ok(client)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &dyn ApiGateway {
        self.gateway.as_ref()
    }

    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    pub async fn login(&mut self, request: &LoginRequest) -> ClientResult<LoginOutcome> {
        self.auth.login(self.gateway.as_ref(), request).await
    }

    pub async fn register(
        &mut self,
        form: &RegistrationForm,
        account_type: LoginRole,
    ) -> ClientResult<String> {
        self.auth
            .register(self.gateway.as_ref(), form, account_type)
            .await
    }

    pub fn logout(&mut self) {
        self.auth.logout();
    }

    pub fn restore(&mut self) -> Option<Session> {
        self.auth.restore()
    }

    pub fn visit(&mut self, route: Route) -> Navigation {
        self.auth.visit(route)
    }

    /// Open a protected route and hand back the matching session variant.
    ///
    /// A redirect or forced logout becomes an authentication error naming
    /// where the user should sign in.
    pub fn enter<S: AreaSession>(&mut self, route: Route) -> ClientResult<S> {
        debug_assert_eq!(route.required_role(), Some(S::ROLE));
        match self.visit(route) {
            Navigation::Allowed(_) => self
                .auth
                .current_session()
                .and_then(S::from_session)
                .ok_or_else(|| {
                    ClientError::authentication(format!(
                        "{} requires a {} account.",
                        route,
                        S::ROLE
                    ))
                }),
            Navigation::RedirectToLogin(login) => Err(ClientError::authentication(format!(
                "Please sign in to continue (redirected to {}).",
                login
            ))),
            Navigation::ForcedLogout(login) => Err(ClientError::authentication(format!(
                "{} is not available to your account. You have been signed out (redirected to {}).",
                route, login
            ))),
        }
    }

    /// GET an endpoint with the session token attached
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ClientResult<T> {
        self.send(ApiRequest::get(endpoint)).await
    }

    /// POST a JSON body with the session token attached
    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| {
            ClientError::application(format!("Failed to encode request for {}: {}", endpoint, e))
        })?;
        self.send(ApiRequest::new(Method::Post, endpoint).with_body(body))
            .await
    }

    async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let request = request.with_bearer(self.auth.token());
        let body = self.gateway.request(&request).await?;
        serde_json::from_value(body).map_err(|e| {
            ClientError::transport(format!(
                "Failed to parse response from {}: {}",
                request.endpoint, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiMode, DemoConfig};
    use crate::gateway::stub::StubGateway;
    use crate::gateway::{FixtureGateway, DEMO_TOKEN};
    use crate::session::{AdminSession, CustomerSession, MemoryStateStore};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn demo_client() -> FuelPoa {
        FuelPoa::new(
            Config::default(),
            Arc::new(FixtureGateway::new(DemoConfig::instant())),
            Box::new(MemoryStateStore::new()),
        )
    }

    #[tokio::test]
    async fn test_enter_requires_login() {
        let mut client = demo_client();
        let err = client.enter::<CustomerSession>(Route::Dashboard).unwrap_err();
        assert!(err.message().contains("/login"));
    }

    #[tokio::test]
    async fn test_enter_after_login() {
        let mut client = demo_client();
        client
            .login(&LoginRequest::new("0712345678", "pw", LoginRole::Customer))
            .await
            .unwrap();

        let session = client.enter::<CustomerSession>(Route::History).unwrap();
        assert_eq!(session.0.id, "C1001");
    }

    #[tokio::test]
    async fn test_enter_wrong_area_signs_out() {
        let mut client = demo_client();
        client
            .login(&LoginRequest::new("0712345678", "pw", LoginRole::Customer))
            .await
            .unwrap();

        let err = client.enter::<AdminSession>(Route::AdminDashboard).unwrap_err();
        assert!(err.message().contains("signed out"));
        assert!(client.auth().current_identity().is_none());
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_token() {
        let stub = Arc::new(
            StubGateway::new()
                .respond("/api/v1/auth/login", json!({"token": DEMO_TOKEN}))
                .respond("/api/v1/cards", json!({"cards": []})),
        );
        let mut client = FuelPoa::new(
            Config::default(),
            stub.clone(),
            Box::new(MemoryStateStore::new()),
        );

        let _: Value = client.get("/api/v1/cards").await.unwrap();
        client
            .login(&LoginRequest::new("0712345678", "pw", LoginRole::Customer))
            .await
            .unwrap();
        let _: Value = client.get("/api/v1/cards").await.unwrap();

        let calls = stub.calls();
        assert_eq!(calls[0].bearer, None);
        assert_eq!(calls[2].bearer.as_deref(), Some(DEMO_TOKEN));
    }

    #[tokio::test]
    async fn test_bad_response_shape_is_transport_error() {
        let stub = Arc::new(StubGateway::new().respond("/api/v1/cards", json!("nope")));
        let client = FuelPoa::new(Config::default(), stub, Box::new(MemoryStateStore::new()));

        let err = client
            .get::<Vec<String>>("/api/v1/cards")
            .await
            .unwrap_err();
        assert!(err.message().starts_with("Failed to parse response from /api/v1/cards"));
    }

    #[tokio::test]
    async fn test_from_config_restores_saved_session() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.api.mode = ApiMode::Demo;
        config.demo = DemoConfig::instant();
        config.session.state_file = dir.path().join("session.json");

        let mut first = FuelPoa::from_config(config.clone()).unwrap();
        first
            .login(&LoginRequest::attendant("EMP-1", "pw"))
            .await
            .unwrap();

        let second = FuelPoa::from_config(config.clone()).unwrap();
        let identity = second.auth().current_identity().unwrap();
        assert_eq!(identity.id, "A201");
        assert_eq!(second.auth().router().current(), Route::AttendantTransaction);

        let mut third = FuelPoa::from_config(config.clone()).unwrap();
        third.logout();
        let fourth = FuelPoa::from_config(config).unwrap();
        assert!(fourth.auth().current_identity().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_state_file_recovers_after_logout() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.api.mode = ApiMode::Demo;
        config.demo = DemoConfig::instant();
        config.session.state_file = dir.path().join("session.json");
        std::fs::write(&config.session.state_file, "{truncated").unwrap();

        let mut client = FuelPoa::from_config(config.clone()).unwrap();
        assert!(client.auth().current_identity().is_none());

        client.logout();
        let outcome = client
            .login(&LoginRequest::new("0712345678", "password", LoginRole::Customer))
            .await
            .unwrap();
        assert_eq!(outcome.redirect, Route::Dashboard);
        assert_eq!(client.auth().token().as_deref(), Some(DEMO_TOKEN));

        let resumed = FuelPoa::from_config(config).unwrap();
        assert_eq!(resumed.auth().current_identity().unwrap().id, "C1001");
    }

    #[tokio::test]
    async fn test_corrupt_state_file_login_without_logout() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.api.mode = ApiMode::Demo;
        config.demo = DemoConfig::instant();
        config.session.state_file = dir.path().join("session.json");
        std::fs::write(&config.session.state_file, "{truncated").unwrap();

        let mut client = FuelPoa::from_config(config).unwrap();
        client
            .login(&LoginRequest::attendant("EMP-1", "password"))
            .await
            .unwrap();
        assert_eq!(client.auth().current_identity().unwrap().id, "A201");
    }
}
