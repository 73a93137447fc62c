//! Customer wallet: balance and loyalty, M-Pesa top-up, history and cards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ClientError, ClientResult, ValidationErrorBuilder};
use crate::session::{AreaSession, CustomerSession};
use crate::validation::{validate_phone, validate_pin};
use crate::FuelPoa;

pub const STATS_ENDPOINT: &str = "/api/v1/dashboard/stats";
pub const STK_PUSH_ENDPOINT: &str = "/api/v1/payments/stk_push";
pub const HISTORY_ENDPOINT: &str = "/api/v1/transactions/customer?limit=50";
pub const CARDS_ENDPOINT: &str = "/api/v1/cards";
pub const ACTIVATE_ENDPOINT: &str = "/api/v1/cards/activate";

/// Litres of fuel that earn one loyalty award
pub const LOYALTY_THRESHOLD_LITRES: u32 = 100;
/// Points per award
pub const LOYALTY_POINTS_PER_AWARD: u32 = 10;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletStats {
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub loyalty_points: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_litres_consumed: Decimal,
    pub active_cards: u32,
}

/// Progress toward the next loyalty award
#[derive(Debug, Clone, PartialEq)]
pub struct LoyaltyProgress {
    pub progress_litres: Decimal,
    pub litres_needed: Decimal,
    /// 0 to 100
    pub percent: Decimal,
}

impl LoyaltyProgress {
    pub fn from_litres(total_litres: Decimal) -> Self {
        let threshold = Decimal::from(LOYALTY_THRESHOLD_LITRES);
        let progress = if total_litres > Decimal::ZERO {
            total_litres % threshold
        } else {
            Decimal::ZERO
        };
        Self {
            progress_litres: progress,
            litres_needed: threshold - progress,
            percent: progress / threshold * Decimal::ONE_HUNDRED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletOverview {
    pub stats: WalletStats,
    pub loyalty: LoyaltyProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    FuelPurchase,
    WalletTopup,
    LoyaltyRedemption,
}

impl TransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::FuelPurchase => "Fuel Purchase",
            TransactionKind::WalletTopup => "Wallet Top-Up",
            TransactionKind::LoyaltyRedemption => "Loyalty Redemption",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One entry of the customer's history; display only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub litres: Option<Decimal>,
    pub status: TransactionStatus,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub card_last4: Option<String>,
    #[serde(default)]
    pub earned_points: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for CardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardStatus::Active => write!(f, "ACTIVE"),
            CardStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

/// A fuel card linked to the customer's wallet
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelCard {
    pub id: String,
    #[serde(default)]
    pub color: String,
    pub number_last4: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_limit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub used_today: Decimal,
    pub status: CardStatus,
}

impl FuelCard {
    pub fn remaining_today(&self) -> Decimal {
        (self.daily_limit - self.used_today).max(Decimal::ZERO)
    }
}

#[derive(Debug, Deserialize)]
struct CardsResponse {
    #[serde(default)]
    cards: Vec<FuelCard>,
}

#[derive(Debug, Serialize)]
struct StkPushPayload<'a> {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    phone: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ActivatePayload<'a> {
    card_id: &'a str,
    pin: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopUpReceipt {
    pub amount: Decimal,
    pub phone: String,
    pub message: String,
}

/// Balance, points and loyalty progress
pub async fn dashboard(client: &FuelPoa, _session: &CustomerSession) -> ClientResult<WalletOverview> {
    let stats: WalletStats = client.get(STATS_ENDPOINT).await?;
    let loyalty = LoyaltyProgress::from_litres(stats.total_litres_consumed);
    Ok(WalletOverview { stats, loyalty })
}

/// Ask the backend to send an M-Pesa STK push to `phone`
pub async fn top_up(
    client: &FuelPoa,
    session: &CustomerSession,
    amount: Decimal,
    phone: &str,
) -> ClientResult<TopUpReceipt> {
    if amount <= Decimal::ZERO {
        return Err(ClientError::validation("amount", "Please enter a valid amount."));
    }
    validate_phone(phone).map_err(|message| ClientError::validation("phone", message))?;

    let phone = phone.trim();
    let payload = StkPushPayload {
        amount,
        phone,
        user_id: &session.identity().id,
    };
    let _: serde_json::Value = client.post(STK_PUSH_ENDPOINT, &payload).await?;

    info!(user = %session.identity().id, "STK push requested for {}", phone);
    Ok(TopUpReceipt {
        amount,
        phone: phone.to_string(),
        message: format!(
            "STK Push initiated successfully! Please check your phone ({}) and enter your M-Pesa PIN to complete the payment.",
            phone
        ),
    })
}

/// Recent transactions, newest first
pub async fn history(client: &FuelPoa, _session: &CustomerSession) -> ClientResult<Vec<TransactionRecord>> {
    let response: HistoryResponse = client.get(HISTORY_ENDPOINT).await?;
    let mut transactions = response.transactions;
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(transactions)
}

pub async fn cards(client: &FuelPoa, _session: &CustomerSession) -> ClientResult<Vec<FuelCard>> {
    let response: CardsResponse = client.get(CARDS_ENDPOINT).await?;
    Ok(response.cards)
}

/// Activate a physical card with its 4-digit PIN
pub async fn activate_card(
    client: &FuelPoa,
    session: &CustomerSession,
    card_id: &str,
    pin: &str,
) -> ClientResult<String> {
    let mut errors = ValidationErrorBuilder::new();
    if card_id.trim().is_empty() {
        errors.add("card_id", "Card ID is required.");
    }
    errors.check("pin", validate_pin(pin));
    errors.finish()?;

    let card_id = card_id.trim();
    let _: serde_json::Value = client
        .post(ACTIVATE_ENDPOINT, &ActivatePayload { card_id, pin })
        .await?;

    info!(user = %session.identity().id, "Card {} submitted for activation", card_id);
    Ok(format!("Card ID {} submitted for activation.", card_id))
}
