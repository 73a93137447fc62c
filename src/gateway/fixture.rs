//! Demo-mode gateway with deterministic canned responses.
//!
//! Requests are matched by path fragment, auth endpoints first. The fixture
//! never touches the session store; signing in with its answers goes
//! through the same code path as a live login.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::{ApiGateway, ApiRequest, GatewayError, Method};
use crate::config::{ApiMode, DemoConfig};

/// Token handed out by every demo login
pub const DEMO_TOKEN: &str = "mock_jwt_token_for_ui_testing";

pub struct FixtureGateway {
    latency: DemoConfig,
}

impl FixtureGateway {
    pub fn new(latency: DemoConfig) -> Self {
        Self { latency }
    }

    async fn simulate(&self, millis: u64) {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

#[async_trait]
impl ApiGateway for FixtureGateway {
    async fn request(&self, request: &ApiRequest) -> Result<Value, GatewayError> {
        let path = request
            .endpoint
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&request.endpoint);
        debug!(method = %request.method, endpoint = %request.endpoint, "Fixture request");

        if path.contains("/login") || path.contains("/onboard") || path.contains("/register") {
            self.simulate(self.latency.auth_latency_ms).await;
            let user = fixture_user(request.body.as_ref());
            if path.contains("/login") {
                return Ok(json!({ "token": DEMO_TOKEN, "user": user }));
            }
            return Ok(json!({ "message": "Action successful! Proceed to login." }));
        }

        if request.method == Method::Get {
            self.simulate(self.latency.read_latency_ms).await;
            if path.contains("/dashboard/stats") {
                return Ok(wallet_stats());
            }
            if path.contains("/cards/lookup") {
                return Ok(card_lookup());
            }
            if path.ends_with("/cards") {
                return Ok(customer_cards());
            }
            if path.contains("/transactions/customer") {
                return Ok(customer_history());
            }
            if path.contains("/admin/summary") {
                return Ok(admin_summary());
            }
            if path.contains("/admin/attendants") {
                return Ok(admin_attendants());
            }
            if path.contains("/admin/transactions") {
                return Ok(admin_transactions());
            }

            warn!("No fixture for GET {}", request.endpoint);
            return Err(GatewayError::NoFixture(format!(
                "No demo data for GET {}",
                request.endpoint
            )));
        }

        self.simulate(self.latency.write_latency_ms).await;
        Ok(json!({
            "message": "Mock API Success",
            "newBalance": 17000.50,
        }))
    }

    fn mode(&self) -> ApiMode {
        ApiMode::Demo
    }
}

/// User record for the login role in the request body (default `Customer`)
fn fixture_user(body: Option<&Value>) -> Value {
    let role = body
        .and_then(|b| b.get("role"))
        .and_then(Value::as_str)
        .unwrap_or("Customer");
    let identifier = body
        .and_then(|b| b.get("identifier"))
        .cloned()
        .unwrap_or(Value::Null);

    match role {
        "Customer" => json!({
            "id": "C1001",
            "name": "John Doe Customer",
            "role": "customer",
            "phone": identifier,
        }),
        "Fuel Attendant" => json!({
            "id": "A201",
            "name": "Jane Smith Attendant",
            "role": "attendant",
            "station": "Nairobi West",
        }),
        other => json!({
            "id": "ADM301",
            "name": format!("{} User", other),
            "role": "admin",
        }),
    }
}

fn wallet_stats() -> Value {
    json!({
        "balance": 15000.50,
        "loyalty_points": 350,
        "total_litres_consumed": 125.8,
        "active_cards": 2,
    })
}

fn card_lookup() -> Value {
    json!({
        "customer_id": "C1001",
        "customer_name": "John Doe",
        "wallet_balance": 15000.50,
        "daily_limit": 5000.00,
        "status": "active",
    })
}

fn customer_cards() -> Value {
    json!({
        "cards": [
            { "id": "1", "color": "green", "numberLast4": "1234", "dailyLimit": 5000, "usedToday": 1250, "status": "ACTIVE" },
            { "id": "2", "color": "blue", "numberLast4": "5678", "dailyLimit": 3000, "usedToday": 0, "status": "ACTIVE" },
        ]
    })
}

fn customer_history() -> Value {
    json!({
        "transactions": [
            { "id": "1", "type": "fuel_purchase", "amount": -850, "litres": 8.5, "status": "completed", "date": "2025-10-22T09:15:00Z", "stationName": "Shell Westlands", "reference": "FP-000001", "cardLast4": "1234", "earnedPoints": 0 },
            { "id": "2", "type": "wallet_topup", "amount": 2000, "status": "completed", "date": "2025-10-22T08:05:00Z", "reference": "RKL3XYAMN9" },
            { "id": "3", "type": "fuel_purchase", "amount": -1200, "litres": 12.0, "status": "completed", "date": "2025-10-21T17:40:00Z", "stationName": "Total Kilimani", "reference": "FP-000003", "cardLast4": "5678", "earnedPoints": 10 },
            { "id": "4", "type": "wallet_topup", "amount": 1500, "status": "completed", "date": "2025-10-21T07:30:00Z", "reference": "RKL2ABSCD8" },
            { "id": "5", "type": "fuel_purchase", "amount": -600, "litres": 6.0, "status": "completed", "date": "2025-10-20T18:20:00Z", "stationName": "Rubis Karen", "reference": "FP-000005", "cardLast4": "1234", "earnedPoints": 0 },
            { "id": "6", "type": "fuel_purchase", "amount": -950, "litres": 9.5, "status": "completed", "date": "2025-10-20T08:10:00Z", "stationName": "Shell Westlands", "reference": "FP-000006", "cardLast4": "1234", "earnedPoints": 0 },
            { "id": "7", "type": "wallet_topup", "amount": 3000, "status": "completed", "date": "2025-10-19T12:00:00Z", "reference": "RKL1MN3PQ7" },
        ]
    })
}

fn admin_summary() -> Value {
    json!({
        "totalSales": 125400,
        "salesChange": 12,
        "transactions": 87,
        "transactionsChange": 8,
        "litresDispensed": 1254,
        "litresChange": 15,
        "loyaltyAwarded": 340,
        "activeAttendants": 3,
    })
}

fn admin_attendants() -> Value {
    json!({
        "attendants": [
            { "name": "James Kamau", "status": "active", "transactions": 32, "sales": 45600 },
            { "name": "Mary Wanjiru", "status": "active", "transactions": 28, "sales": 38200 },
            { "name": "Peter Omondi", "status": "active", "transactions": 27, "sales": 41600 },
            { "name": "Grace Muthoni", "status": "offline", "transactions": 0, "sales": 0 },
        ]
    })
}

fn admin_transactions() -> Value {
    json!({
        "transactions": [
            { "id": "tx_089", "time": "16:45", "attendant": "James Kamau", "card": "****1234", "litres": 12.0, "amount": 1200 },
            { "id": "tx_088", "time": "16:42", "attendant": "Mary Wanjiru", "card": "****5678", "litres": 8.5, "amount": 850 },
            { "id": "tx_087", "time": "16:38", "attendant": "Peter Omondi", "card": "****9012", "litres": 15.0, "amount": 1500 },
            { "id": "tx_086", "time": "16:35", "attendant": "James Kamau", "card": "****3456", "litres": 9.5, "amount": 950 },
            { "id": "tx_085", "time": "16:30", "attendant": "Mary Wanjiru", "card": "****7890", "litres": 20.0, "amount": 2000 },
            { "id": "tx_084", "time": "16:20", "attendant": "Peter Omondi", "card": "****1234", "litres": 10.0, "amount": 1000 },
            { "id": "tx_083", "time": "16:15", "attendant": "James Kamau", "card": "****5678", "litres": 5.0, "amount": 500 },
            { "id": "tx_082", "time": "16:05", "attendant": "Mary Wanjiru", "card": "****9012", "litres": 18.0, "amount": 1800 },
            { "id": "tx_081", "time": "15:58", "attendant": "Peter Omondi", "card": "****3456", "litres": 11.0, "amount": 1100 },
            { "id": "tx_080", "time": "15:50", "attendant": "James Kamau", "card": "****7890", "litres": 14.0, "amount": 1400 },
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> FixtureGateway {
        FixtureGateway::new(DemoConfig::instant())
    }

    fn login(role: &str) -> ApiRequest {
        ApiRequest::post(
            "/api/v1/auth/login",
            json!({"identifier": "0712345678", "password": "password", "role": role}),
        )
    }

    #[tokio::test]
    async fn test_login_customer() {
        let body = gateway().request(&login("Customer")).await.unwrap();
        assert_eq!(body["token"], DEMO_TOKEN);
        assert_eq!(body["user"]["id"], "C1001");
        assert_eq!(body["user"]["role"], "customer");
        assert_eq!(body["user"]["phone"], "0712345678");
    }

    #[tokio::test]
    async fn test_login_attendant_and_admin() {
        let body = gateway().request(&login("Fuel Attendant")).await.unwrap();
        assert_eq!(body["user"]["id"], "A201");
        assert_eq!(body["user"]["station"], "Nairobi West");

        let body = gateway().request(&login("Super Admin")).await.unwrap();
        assert_eq!(body["user"]["id"], "ADM301");
        assert_eq!(body["user"]["name"], "Super Admin User");
        assert_eq!(body["user"]["role"], "admin");
    }

    #[tokio::test]
    async fn test_login_without_role_defaults_to_customer() {
        let request = ApiRequest::post("/api/v1/auth/login", json!({"identifier": "x"}));
        let body = gateway().request(&request).await.unwrap();
        assert_eq!(body["user"]["role"], "customer");
    }

    #[tokio::test]
    async fn test_onboard_message() {
        let request = ApiRequest::post("/api/v1/customers/onboard", json!({"role": "Customer"}));
        let body = gateway().request(&request).await.unwrap();
        assert_eq!(body["message"], "Action successful! Proceed to login.");
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_read_fixtures() {
        let gw = gateway();
        let stats = gw.request(&ApiRequest::get("/api/v1/dashboard/stats")).await.unwrap();
        assert_eq!(stats["loyalty_points"], 350);

        let card = gw
            .request(&ApiRequest::get("/api/v1/cards/lookup/1234567890"))
            .await
            .unwrap();
        assert_eq!(card["customer_name"], "John Doe");

        let cards = gw.request(&ApiRequest::get("/api/v1/cards")).await.unwrap();
        assert_eq!(cards["cards"].as_array().unwrap().len(), 2);

        let history = gw
            .request(&ApiRequest::get("/api/v1/transactions/customer?limit=50"))
            .await
            .unwrap();
        assert_eq!(history["transactions"].as_array().unwrap().len(), 7);

        let log = gw
            .request(&ApiRequest::get("/api/v1/admin/transactions?period=today"))
            .await
            .unwrap();
        assert_eq!(log["transactions"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_generic_write() {
        let request = ApiRequest::post("/api/v1/transactions/fuel_purchase", json!({}));
        let body = gateway().request(&request).await.unwrap();
        assert_eq!(body["message"], "Mock API Success");
        assert_eq!(body["newBalance"], 17000.50);
    }

    #[tokio::test]
    async fn test_unknown_get_is_an_error() {
        let err = gateway()
            .request(&ApiRequest::get("/api/v1/unknown"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NoFixture(_)));
        assert!(err.to_string().contains("/api/v1/unknown"));
    }

    #[tokio::test]
    async fn test_latency_is_simulated() {
        let gw = FixtureGateway::new(DemoConfig {
            auth_latency_ms: 0,
            read_latency_ms: 25,
            write_latency_ms: 0,
        });
        let started = std::time::Instant::now();
        gw.request(&ApiRequest::get("/api/v1/cards")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(25));
    }
}
