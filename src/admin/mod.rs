//! Station admin reporting: summary metrics, attendant performance and the
//! station transaction log.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ClientResult;
use crate::money::round2;
use crate::session::AdminSession;
use crate::FuelPoa;

pub const SUMMARY_ENDPOINT: &str = "/api/v1/admin/summary";
pub const ATTENDANTS_ENDPOINT: &str = "/api/v1/admin/attendants";
pub const TRANSACTIONS_ENDPOINT: &str = "/api/v1/admin/transactions";

const CSV_HEADER: &str = "id,time,attendant,card,litres,amount";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
}

impl DateFilter {
    pub const ALL: [DateFilter; 4] = [
        DateFilter::Today,
        DateFilter::Yesterday,
        DateFilter::ThisWeek,
        DateFilter::ThisMonth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DateFilter::Today => "Today",
            DateFilter::Yesterday => "Yesterday",
            DateFilter::ThisWeek => "This Week",
            DateFilter::ThisMonth => "This Month",
        }
    }

    /// Value of the `period` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            DateFilter::Today => "today",
            DateFilter::Yesterday => "yesterday",
            DateFilter::ThisWeek => "this_week",
            DateFilter::ThisMonth => "this_month",
        }
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "today" => Ok(DateFilter::Today),
            "yesterday" => Ok(DateFilter::Yesterday),
            "this_week" | "week" => Ok(DateFilter::ThisWeek),
            "this_month" | "month" => Ok(DateFilter::ThisMonth),
            _ => Err(format!(
                "Unknown period '{}'. Use today, yesterday, this_week or this_month.",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_sales: Decimal,
    /// Percent change against the previous period, may be fractional
    #[serde(default, with = "rust_decimal::serde::float")]
    pub sales_change: Decimal,
    pub transactions: u64,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub transactions_change: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub litres_dispensed: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub litres_change: Decimal,
    #[serde(default)]
    pub loyalty_awarded: u64,
    #[serde(default)]
    pub active_attendants: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendantStatus {
    Active,
    Offline,
}

impl fmt::Display for AttendantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendantStatus::Active => write!(f, "active"),
            AttendantStatus::Offline => write!(f, "offline"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttendantRow {
    pub name: String,
    pub status: AttendantStatus,
    pub transactions: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub sales: Decimal,
}

/// One sale in the station log. `card` is the masked card number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationTransaction {
    #[serde(default)]
    pub id: Option<String>,
    pub time: String,
    pub attendant: String,
    #[serde(alias = "cardLast4")]
    pub card: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub litres: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct AttendantsResponse {
    #[serde(default)]
    attendants: Vec<AttendantRow>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<StationTransaction>,
}

fn with_period(endpoint: &str, filter: DateFilter) -> String {
    format!("{}?period={}", endpoint, filter.as_query())
}

pub async fn summary(
    client: &FuelPoa,
    _session: &AdminSession,
    filter: DateFilter,
) -> ClientResult<AdminSummary> {
    client.get(&with_period(SUMMARY_ENDPOINT, filter)).await
}

pub async fn attendants(client: &FuelPoa, _session: &AdminSession) -> ClientResult<Vec<AttendantRow>> {
    let response: AttendantsResponse = client.get(ATTENDANTS_ENDPOINT).await?;
    Ok(response.attendants)
}

/// Station log for the period, newest first as served
pub async fn transactions(
    client: &FuelPoa,
    _session: &AdminSession,
    filter: DateFilter,
) -> ClientResult<Vec<StationTransaction>> {
    let response: TransactionsResponse = client
        .get(&with_period(TRANSACTIONS_ENDPOINT, filter))
        .await?;
    Ok(response.transactions)
}

pub fn recent(log: &[StationTransaction], n: usize) -> &[StationTransaction] {
    &log[..n.min(log.len())]
}

/// Render the log as CSV, one row per transaction
pub fn export_csv(log: &[StationTransaction]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for tx in log {
        let row = [
            csv_field(tx.id.as_deref().unwrap_or("")),
            csv_field(&tx.time),
            csv_field(&tx.attendant),
            csv_field(&tx.card),
            format!("{:.2}", round2(tx.litres)),
            format!("{:.2}", round2(tx.amount)),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
