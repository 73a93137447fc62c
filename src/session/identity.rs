//! Identity, roles and the role-tagged session.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Application role; decides which area of the client a user may open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    /// Wallet, cards and history
    Customer,
    /// Point-of-sale terminal
    Attendant,
    /// Station reporting dashboard
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Attendant => "attendant",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "customer" => Ok(Role::Customer),
            "attendant" | "fuel_attendant" => Ok(Role::Attendant),
            "admin" | "super_admin" | "station_admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// The "Login As" choice on the sign-in form, sent verbatim to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoginRole {
    #[default]
    #[serde(rename = "Customer")]
    Customer,
    #[serde(rename = "Fuel Attendant")]
    FuelAttendant,
    #[serde(rename = "Station Admin")]
    StationAdmin,
    #[serde(rename = "Super Admin")]
    SuperAdmin,
}

impl LoginRole {
    pub const ALL: [LoginRole; 4] = [
        LoginRole::Customer,
        LoginRole::FuelAttendant,
        LoginRole::StationAdmin,
        LoginRole::SuperAdmin,
    ];

    /// Label shown on the form and sent as the `role` field
    pub fn label(&self) -> &'static str {
        match self {
            LoginRole::Customer => "Customer",
            LoginRole::FuelAttendant => "Fuel Attendant",
            LoginRole::StationAdmin => "Station Admin",
            LoginRole::SuperAdmin => "Super Admin",
        }
    }

    /// Application role this choice signs in as
    pub fn role(&self) -> Role {
        match self {
            LoginRole::Customer => Role::Customer,
            LoginRole::FuelAttendant => Role::Attendant,
            LoginRole::StationAdmin | LoginRole::SuperAdmin => Role::Admin,
        }
    }
}

impl std::fmt::Display for LoginRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for LoginRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "customer" => Ok(LoginRole::Customer),
            "fuel attendant" | "attendant" => Ok(LoginRole::FuelAttendant),
            "station admin" | "admin" => Ok(LoginRole::StationAdmin),
            "super admin" => Ok(LoginRole::SuperAdmin),
            _ => Err(format!(
                "Unknown login role: {} (expected one of: Customer, Fuel Attendant, Station Admin, Super Admin)",
                s
            )),
        }
    }
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    /// Any other attributes the backend returns
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            phone: None,
            station: None,
            extra: Map::new(),
        }
    }

    /// Identity used when the backend accepts a login but returns no user
    pub fn placeholder(role: Role) -> Self {
        Self::new("mock", "Mock User", role)
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_station(mut self, station: impl Into<String>) -> Self {
        self.station = Some(station.into());
        self
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSession(pub Identity);

#[derive(Debug, Clone, PartialEq)]
pub struct AttendantSession(pub Identity);

#[derive(Debug, Clone, PartialEq)]
pub struct AdminSession(pub Identity);

/// A signed-in session, tagged by role
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Customer(CustomerSession),
    Attendant(AttendantSession),
    Admin(AdminSession),
}

impl Session {
    pub fn from_identity(identity: Identity) -> Self {
        match identity.role {
            Role::Customer => Session::Customer(CustomerSession(identity)),
            Role::Attendant => Session::Attendant(AttendantSession(identity)),
            Role::Admin => Session::Admin(AdminSession(identity)),
        }
    }

    pub fn identity(&self) -> &Identity {
        match self {
            Session::Customer(CustomerSession(identity))
            | Session::Attendant(AttendantSession(identity))
            | Session::Admin(AdminSession(identity)) => identity,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Session::Customer(_) => Role::Customer,
            Session::Attendant(_) => Role::Attendant,
            Session::Admin(_) => Role::Admin,
        }
    }
}

/// A session variant that can be extracted from a `Session`
pub trait AreaSession: Sized {
    const ROLE: Role;

    fn from_session(session: Session) -> Option<Self>;

    fn identity(&self) -> &Identity;
}

impl AreaSession for CustomerSession {
    const ROLE: Role = Role::Customer;

    fn from_session(session: Session) -> Option<Self> {
        match session {
            Session::Customer(s) => Some(s),
            _ => None,
        }
    }

    fn identity(&self) -> &Identity {
        &self.0
    }
}

impl AreaSession for AttendantSession {
    const ROLE: Role = Role::Attendant;

    fn from_session(session: Session) -> Option<Self> {
        match session {
            Session::Attendant(s) => Some(s),
            _ => None,
        }
    }

    fn identity(&self) -> &Identity {
        &self.0
    }
}

impl AreaSession for AdminSession {
    const ROLE: Role = Role::Admin;

    fn from_session(session: Session) -> Option<Self> {
        match session {
            Session::Admin(s) => Some(s),
            _ => None,
        }
    }

    fn identity(&self) -> &Identity {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_from_str() {
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("ATTENDANT".parse::<Role>().unwrap(), Role::Attendant);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Station Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_value(Role::Attendant).unwrap(), json!("attendant"));
        let role: Role = serde_json::from_value(json!("super_admin")).unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_login_role_mapping() {
        assert_eq!(LoginRole::Customer.role(), Role::Customer);
        assert_eq!(LoginRole::FuelAttendant.role(), Role::Attendant);
        assert_eq!(LoginRole::StationAdmin.role(), Role::Admin);
        assert_eq!(LoginRole::SuperAdmin.role(), Role::Admin);
        assert_eq!(LoginRole::default(), LoginRole::Customer);
    }

    #[test]
    fn test_login_role_labels() {
        assert_eq!(LoginRole::FuelAttendant.to_string(), "Fuel Attendant");
        assert_eq!(
            serde_json::to_value(LoginRole::SuperAdmin).unwrap(),
            json!("Super Admin")
        );
        assert_eq!(
            "fuel-attendant".parse::<LoginRole>().unwrap(),
            LoginRole::FuelAttendant
        );
        assert_eq!(
            "Station Admin".parse::<LoginRole>().unwrap(),
            LoginRole::StationAdmin
        );
        assert!("nobody".parse::<LoginRole>().is_err());
    }

    #[test]
    fn test_identity_deserialize_keeps_extra_fields() {
        let identity: Identity = serde_json::from_value(json!({
            "id": 42,
            "name": "Jane",
            "role": "attendant",
            "station": "Nairobi West",
            "shift": "morning"
        }))
        .unwrap();

        assert_eq!(identity.id, "42");
        assert_eq!(identity.role, Role::Attendant);
        assert_eq!(identity.station.as_deref(), Some("Nairobi West"));
        assert_eq!(identity.extra.get("shift"), Some(&json!("morning")));
    }

    #[test]
    fn test_session_from_identity() {
        let session = Session::from_identity(Identity::new("C1", "John", Role::Customer));
        assert_eq!(session.role(), Role::Customer);
        assert_eq!(session.identity().name, "John");

        let customer = CustomerSession::from_session(session.clone());
        assert!(customer.is_some());
        assert!(AdminSession::from_session(session).is_none());
    }

    #[test]
    fn test_placeholder_identity() {
        let identity = Identity::placeholder(Role::Admin);
        assert_eq!(identity.id, "mock");
        assert_eq!(identity.name, "Mock User");
        assert_eq!(identity.role, Role::Admin);
    }
}
