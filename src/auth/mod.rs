//! Authentication gate: login, registration, logout and session restore.
//!
//! The gate owns the session store and the role router and keeps them in
//! lockstep: a successful login enters exactly the signed-in role's area,
//! logout (or a forced logout from the router) leaves it.

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};
use crate::gateway::{ApiGateway, ApiRequest};
use crate::router::{Navigation, RoleRouter, Route};
use crate::session::{Identity, LoginRole, Session, SessionStore};
use crate::validation::RegistrationForm;

pub const LOGIN_ENDPOINT: &str = "/api/v1/auth/login";
pub const ONBOARD_ENDPOINT: &str = "/api/v1/customers/onboard";

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
    pub role: LoginRole,
    /// Alternative login endpoint; defaults to `/api/v1/auth/login`
    pub endpoint: Option<String>,
}

impl LoginRequest {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>, role: LoginRole) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
            role,
            endpoint: None,
        }
    }

    /// Attendant portal login: employee id as the identifier
    pub fn attendant(employee_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(employee_id, password, LoginRole::FuelAttendant)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub session: Session,
    /// Home route of the signed-in role
    pub redirect: Route,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<Identity>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

pub struct AuthGate {
    session: SessionStore,
    router: RoleRouter,
}

impl AuthGate {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            router: RoleRouter::new(),
        }
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.session.current_identity()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.session()
    }

    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn router(&self) -> &RoleRouter {
        &self.router
    }

    /// Sign in. Every failure is reported as an authentication error and
    /// leaves the session as it was.
    pub async fn login(
        &mut self,
        gateway: &dyn ApiGateway,
        request: &LoginRequest,
    ) -> ClientResult<LoginOutcome> {
        let endpoint = request.endpoint.as_deref().unwrap_or(LOGIN_ENDPOINT);
        let api_request = ApiRequest::post(
            endpoint,
            json!({
                "identifier": request.identifier,
                "password": request.password,
                "role": request.role.label(),
            }),
        )
        .with_bearer(self.session.token());

        let body = gateway.request(&api_request).await.map_err(|e| {
            warn!("Login failed for {}: {}", request.identifier, e);
            ClientError::authentication(e.to_string())
        })?;

        let response: LoginResponse = serde_json::from_value(body).map_err(|e| {
            ClientError::authentication(format!("Unexpected login response: {}", e))
        })?;

        let identity = response
            .user
            .unwrap_or_else(|| Identity::placeholder(request.role.role()));

        self.session
            .begin(identity.clone(), response.token.as_deref())
            .map_err(|e| {
                ClientError::authentication(format!("Could not save session: {:#}", e))
            })?;

        let redirect = self.router.signed_in(identity.role);
        info!(user = %identity.id, role = %identity.role, "Signed in, redirecting to {}", redirect);

        Ok(LoginOutcome {
            session: Session::from_identity(identity),
            redirect,
        })
    }

    /// Submit the sign-up form; on success a signed-out router moves to
    /// `/login`, a signed-in one stays where it is.
    ///
    /// Form checks are the caller's job (`RegistrationForm::validate`).
    pub async fn register(
        &mut self,
        gateway: &dyn ApiGateway,
        form: &RegistrationForm,
        account_type: LoginRole,
    ) -> ClientResult<String> {
        let request = ApiRequest::post(
            ONBOARD_ENDPOINT,
            json!({
                "name": form.name,
                "national_id": form.national_id,
                "phone": form.phone,
                "email": form.email,
                "role": account_type.label(),
                "password": form.password,
            }),
        )
        .with_bearer(self.session.token());

        let body = gateway.request(&request).await?;
        let message = serde_json::from_value::<MessageResponse>(body)
            .ok()
            .and_then(|r| r.message)
            .unwrap_or_else(|| "Registration successful! Proceed to login.".to_string());

        self.router
            .visit(Route::Login, self.session.current_identity());
        info!("Registered {}", form.phone);
        Ok(message)
    }

    /// Clear identity and token. Safe to call when already signed out.
    pub fn logout(&mut self) {
        if let Some(identity) = self.session.current_identity() {
            info!(user = %identity.id, "Signing out");
        }
        self.session.clear();
        self.router.signed_out(Route::Login);
    }

    /// Resume a session saved by an earlier run
    pub fn restore(&mut self) -> Option<Session> {
        let identity = self.session.restore()?.clone();
        self.router.signed_in(identity.role);
        Some(Session::from_identity(identity))
    }

    /// Guard a visit; a role mismatch signs the user out
    pub fn visit(&mut self, route: Route) -> Navigation {
        let navigation = self.router.visit(route, self.session.current_identity());
        if let Navigation::ForcedLogout(_) = navigation {
            self.session.clear();
        }
        navigation
    }
}
