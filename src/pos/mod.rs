//! Attendant point of sale.
//!
//! A [`PosTerminal`] walks through card lookup and fuel sale the way the
//! attendant's screen does, keeping a status and message after every step
//! and a running summary of completed sales.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::money::{format_amount, litres_for, round2};
use crate::session::{AreaSession, AttendantSession};
use crate::validation::validate_card_number;
use crate::FuelPoa;

pub const FUEL_PURCHASE_ENDPOINT: &str = "/api/v1/transactions/fuel_purchase";

pub fn lookup_endpoint(card_number: &str) -> String {
    format!("/api/v1/cards/lookup/{}", card_number)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FuelProduct {
    pub id: u32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_litre: Decimal,
}

impl FuelProduct {
    pub fn new(id: u32, name: impl Into<String>, price_per_litre: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price_per_litre,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    Active,
    Inactive,
    Suspended,
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardState::Active => write!(f, "active"),
            CardState::Inactive => write!(f, "inactive"),
            CardState::Suspended => write!(f, "suspended"),
        }
    }
}

/// Card as seen by the attendant after a lookup
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardDetails {
    #[serde(default)]
    pub customer_id: String,
    pub customer_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub wallet_balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_limit: Decimal,
    pub status: CardState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Idle,
    Scanning,
    Ready,
    Processing,
    Success,
    Error,
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalStatus::Idle => write!(f, "idle"),
            TerminalStatus::Scanning => write!(f, "scanning"),
            TerminalStatus::Ready => write!(f, "ready"),
            TerminalStatus::Processing => write!(f, "processing"),
            TerminalStatus::Success => write!(f, "success"),
            TerminalStatus::Error => write!(f, "error"),
        }
    }
}

/// Totals for sales completed on this terminal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySummary {
    pub transactions: u32,
    pub total_sales: Decimal,
    pub litres_dispensed: Decimal,
}

impl DailySummary {
    fn record(&mut self, amount: Decimal, litres: Decimal) {
        self.transactions += 1;
        self.total_sales += amount;
        self.litres_dispensed += litres;
    }
}

/// Litres for an amount of the given product
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub product: FuelProduct,
    pub amount: Decimal,
    pub litres: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleReceipt {
    pub card_number: String,
    pub customer_name: String,
    pub product: FuelProduct,
    pub amount: Decimal,
    pub litres: Decimal,
    pub new_balance: Option<Decimal>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FuelPurchasePayload<'a> {
    card_number: &'a str,
    product_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    litres: Decimal,
    attendant_id: &'a str,
    station_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FuelPurchaseResponse {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    new_balance: Option<Decimal>,
}

pub struct PosTerminal {
    catalog: Vec<FuelProduct>,
    default_station: String,
    status: TerminalStatus,
    message: String,
    card_number: Option<String>,
    card: Option<CardDetails>,
    summary: DailySummary,
}

impl PosTerminal {
    pub fn new(catalog: Vec<FuelProduct>, default_station: impl Into<String>) -> Self {
        Self {
            catalog,
            default_station: default_station.into(),
            status: TerminalStatus::Idle,
            message: "Welcome! Swipe or enter the customer card number.".to_string(),
            card_number: None,
            card: None,
            summary: DailySummary::default(),
        }
    }

    /// Terminal for the configured station catalog
    pub fn for_client(client: &FuelPoa) -> Self {
        let station = &client.config().station;
        Self::new(station.products.clone(), station.station_id.clone())
    }

    pub fn catalog(&self) -> &[FuelProduct] {
        &self.catalog
    }

    pub fn product(&self, id: u32) -> Option<&FuelProduct> {
        self.catalog.iter().find(|p| p.id == id)
    }

    pub fn status(&self) -> TerminalStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn card(&self) -> Option<&CardDetails> {
        self.card.as_ref()
    }

    pub fn summary(&self) -> &DailySummary {
        &self.summary
    }

    fn set(&mut self, status: TerminalStatus, message: impl Into<String>) {
        self.status = status;
        self.message = message.into();
        debug!(status = %self.status, "{}", self.message);
    }

    fn fail(&mut self, err: ClientError) -> ClientError {
        self.set(TerminalStatus::Error, err.message());
        err
    }

    /// Litres for `amount` of product `product_id`
    pub fn quote(&self, product_id: u32, amount: Decimal) -> ClientResult<Quote> {
        let product = self
            .product(product_id)
            .cloned()
            .ok_or_else(|| unknown_product(product_id))?;
        let litres = litres_for(amount, product.price_per_litre);
        Ok(Quote {
            product,
            amount,
            litres,
        })
    }

    /// Look a card up. Only an active card leaves the terminal ready to sell.
    pub async fn lookup_card(&mut self, client: &FuelPoa, card_number: &str) -> ClientResult<&CardDetails> {
        let card_number = card_number.trim();
        if let Err(message) = validate_card_number(card_number) {
            return Err(self.fail(ClientError::validation("card_number", message)));
        }

        self.set(
            TerminalStatus::Scanning,
            format!("Looking up card {}...", card_number),
        );

        let details: CardDetails = match client.get(&lookup_endpoint(card_number)).await {
            Ok(details) => details,
            Err(e) => {
                warn!("Card lookup for {} failed: {}", card_number, e);
                self.card = None;
                self.card_number = None;
                let message = if e.message().is_empty() {
                    "Card lookup failed. Please check the number.".to_string()
                } else {
                    e.message().to_string()
                };
                return Err(self.fail(ClientError::transport(message)));
            }
        };

        let status = details.status;
        let customer = details.customer_name.clone();
        self.card_number = Some(card_number.to_string());
        let card = self.card.insert(details);

        if status != CardState::Active {
            let err =
                ClientError::application(format!("Card is {}. Cannot process transaction.", status));
            self.status = TerminalStatus::Error;
            self.message = err.message().to_string();
            return Err(err);
        }

        self.status = TerminalStatus::Ready;
        self.message = format!("Card found for {}. Ready for transaction.", customer);
        Ok(card)
    }

    /// Charge the scanned card for `amount` of product `product_id`
    pub async fn submit_sale(
        &mut self,
        client: &FuelPoa,
        attendant: &AttendantSession,
        product_id: u32,
        amount: Decimal,
    ) -> ClientResult<SaleReceipt> {
        let active = self
            .card
            .as_ref()
            .filter(|card| card.status == CardState::Active)
            .cloned();
        let (card_number, card) = match (self.card_number.clone(), active) {
            (Some(number), Some(card)) => (number, card),
            _ => {
                return Err(self.fail(ClientError::validation(
                    "card_number",
                    "Please scan and validate an active card first.",
                )))
            }
        };

        if amount <= Decimal::ZERO {
            return Err(self.fail(ClientError::validation(
                "amount",
                "Enter a valid amount to process.",
            )));
        }

        let quote = match self.quote(product_id, amount) {
            Ok(quote) => quote,
            Err(e) => return Err(self.fail(e)),
        };

        if amount > card.wallet_balance {
            return Err(self.fail(ClientError::application(format!(
                "Insufficient balance (KES {}). Transaction failed.",
                format_amount(card.wallet_balance)
            ))));
        }

        self.set(
            TerminalStatus::Processing,
            format!("Processing KES {} purchase...", format_amount(amount)),
        );

        let identity = attendant.identity();
        let station_id = identity
            .station
            .as_deref()
            .unwrap_or(self.default_station.as_str());
        let payload = FuelPurchasePayload {
            card_number: &card_number,
            product_id: quote.product.id.to_string(),
            amount,
            litres: quote.litres,
            attendant_id: &identity.id,
            station_id,
        };

        let response: FuelPurchaseResponse = match client.post(FUEL_PURCHASE_ENDPOINT, &payload).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e)),
        };

        let new_balance = response.new_balance.map(round2);
        let message = match new_balance {
            Some(balance) => format!(
                "Transaction COMPLETE! KES {} deducted. New balance: KES {}.",
                format_amount(amount),
                format_amount(balance)
            ),
            None => format!("Transaction COMPLETE! KES {} deducted.", format_amount(amount)),
        };

        self.summary.record(amount, quote.litres);
        self.card = None;
        self.card_number = None;
        self.set(TerminalStatus::Success, message.clone());
        info!(
            attendant = %identity.id,
            card = %card_number,
            "Fuel sale of {} ({} L)",
            amount,
            quote.litres
        );

        Ok(SaleReceipt {
            card_number,
            customer_name: card.customer_name,
            product: quote.product,
            amount,
            litres: quote.litres,
            new_balance,
            message,
        })
    }

    /// Back to idle, keeping the summary
    pub fn reset(&mut self) {
        self.card = None;
        self.card_number = None;
        self.set(
            TerminalStatus::Idle,
            "Welcome! Swipe or enter the customer card number.",
        );
    }
}

fn unknown_product(id: u32) -> ClientError {
    ClientError::validation("product", format!("Unknown fuel product: {}", id))
}
