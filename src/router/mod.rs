//! Role router: which area the client is in and which routes it may open.
//!
//! This is the only place role-to-area access is decided. Visiting a route
//! yields a [`Navigation`]; the caller acts on a forced logout by clearing
//! the session.

use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::session::{Identity, Role};

/// Client areas; each signed-in role owns exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Unauthenticated,
    Customer,
    Attendant,
    Admin,
}

impl Area {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Customer => Area::Customer,
            Role::Attendant => Area::Attendant,
            Role::Admin => Area::Admin,
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Area::Unauthenticated => write!(f, "unauthenticated"),
            Area::Customer => write!(f, "customer"),
            Area::Attendant => write!(f, "attendant"),
            Area::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    AttendantLogin,
    Dashboard,
    History,
    WalletTopUp,
    Cards,
    AttendantHome,
    AttendantTransaction,
    AdminDashboard,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::Login,
        Route::Register,
        Route::AttendantLogin,
        Route::Dashboard,
        Route::History,
        Route::WalletTopUp,
        Route::Cards,
        Route::AttendantHome,
        Route::AttendantTransaction,
        Route::AdminDashboard,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::AttendantLogin => "/attendant/login",
            Route::Dashboard => "/dashboard",
            Route::History => "/history",
            Route::WalletTopUp => "/wallet/topup",
            Route::Cards => "/cards",
            Route::AttendantHome => "/attendant",
            Route::AttendantTransaction => "/attendant/transaction",
            Route::AdminDashboard => "/admin/dashboard",
        }
    }

    /// Role that owns this route; `None` for public routes
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::Login | Route::Register | Route::AttendantLogin => None,
            Route::Dashboard | Route::History | Route::WalletTopUp | Route::Cards => {
                Some(Role::Customer)
            }
            Route::AttendantHome | Route::AttendantTransaction => Some(Role::Attendant),
            Route::AdminDashboard => Some(Role::Admin),
        }
    }

    pub fn is_public(&self) -> bool {
        self.required_role().is_none()
    }

    /// Where an unauthenticated visitor is sent
    pub fn login_route(&self) -> Route {
        match self.required_role() {
            Some(Role::Attendant) => Route::AttendantLogin,
            _ => Route::Login,
        }
    }

    /// Landing route after a successful login
    pub fn home(role: Role) -> Route {
        match role {
            Role::Customer => Route::Dashboard,
            Role::Attendant => Route::AttendantTransaction,
            Role::Admin => Route::AdminDashboard,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim_end_matches('/');
        let path = if path.is_empty() { "/" } else { path };
        Route::ALL
            .iter()
            .copied()
            .find(|r| r.path() == path)
            .ok_or_else(|| format!("Unknown route: {}", s))
    }
}

/// Outcome of visiting a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The route opened
    Allowed(Route),
    /// No identity; sent to the route's login page
    RedirectToLogin(Route),
    /// Identity belongs to another area; the session must be cleared
    ForcedLogout(Route),
}

impl Navigation {
    pub fn route(&self) -> Route {
        match self {
            Navigation::Allowed(r) | Navigation::RedirectToLogin(r) | Navigation::ForcedLogout(r) => {
                *r
            }
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Navigation::Allowed(_))
    }
}

#[derive(Debug, Clone)]
pub struct RoleRouter {
    area: Area,
    route: Route,
}

impl Default for RoleRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleRouter {
    /// Starts unauthenticated at `/login`
    pub fn new() -> Self {
        Self {
            area: Area::Unauthenticated,
            route: Route::Login,
        }
    }

    pub fn area(&self) -> Area {
        self.area
    }

    pub fn current(&self) -> Route {
        self.route
    }

    /// Enter the role's area at its home route
    pub fn signed_in(&mut self, role: Role) -> Route {
        let home = Route::home(role);
        self.area = Area::for_role(role);
        self.route = home;
        debug!(area = %self.area, route = %home, "Entered area");
        home
    }

    /// Back to the unauthenticated area at the given public route
    pub fn signed_out(&mut self, at: Route) {
        self.area = Area::Unauthenticated;
        self.route = if at.is_public() { at } else { at.login_route() };
    }

    /// Guard a visit to `route` by the current identity.
    ///
    /// Public routes are always allowed. A signed-in identity stays in its
    /// own area at its current route, so area and route never disagree.
    pub fn visit(&mut self, route: Route, identity: Option<&Identity>) -> Navigation {
        let Some(required) = route.required_role() else {
            if identity.is_none() {
                self.route = route;
            }
            return Navigation::Allowed(route);
        };

        match identity {
            None => {
                let login = route.login_route();
                warn!("{} requires sign-in, redirecting to {}", route, login);
                self.signed_out(login);
                Navigation::RedirectToLogin(login)
            }
            Some(identity) if identity.role != required => {
                warn!(
                    "{} is not available to role {}; signing out",
                    route, identity.role
                );
                self.signed_out(Route::Login);
                Navigation::ForcedLogout(Route::Login)
            }
            Some(identity) => {
                self.area = Area::for_role(identity.role);
                self.route = route;
                Navigation::Allowed(route)
            }
        }
    }
}
