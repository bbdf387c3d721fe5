use crate::enums::Role;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's cash account. One per registered user, created once and never
/// deleted. The balance is mutated only inside the ledger/engine
/// transactions and is constrained non-negative both here and in the schema.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub currency: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// An immutable cash-ledger entry: one row per deposit or withdrawal.
/// `amount` is the unsigned magnitude; the sign lives in `kind`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CashTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A listed instrument. Administratively created reference data, read-only
/// to the trading path. `reference_price` is the single static price every
/// trade of this symbol executes at.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Symbol {
    pub id: Uuid,
    pub ticker: String,
    pub name: String,
    pub exchange: String,
    pub sector: String,
    pub currency: String,
    pub total_shares: i64,
    pub reference_price: Decimal,
}

/// A materialized holding for one (account, symbol) pair.
///
/// A row exists only while `quantity > 0`; a sell that exhausts the
/// position deletes the row rather than zeroing it, so a stale average
/// cost can never leak into a future re-entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub account_id: Uuid,
    pub symbol_id: Uuid,
    pub quantity: i64,
    pub avg_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// An executed (or canceled) order. Append-only apart from the single
/// `open -> canceled` status transition.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub account_id: Uuid,
    pub symbol_id: Uuid,
    pub side: String,
    pub quantity: i64,
    pub price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
}

/// One row of the weekly market schedule, keyed by day-of-week
/// (0 = Sunday .. 6 = Saturday). `None` open/close times mean the market
/// does not trade that day. Pre-market close is definitionally `open_time`
/// and after-hours open is definitionally `close_time`; neither is stored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MarketScheduleEntry {
    pub weekday: i16,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub premarket_open: Option<NaiveTime>,
    pub afterhours_close: Option<NaiveTime>,
    pub notes: Option<String>,
}

/// A holiday override, keyed by calendar date.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MarketHolidayEntry {
    pub holiday_date: NaiveDate,
    pub description: String,
    pub session_type: String,
}

/// One line of a user's portfolio view: the shape returned by both the
/// materialized join and the order-history fallback derivation.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub ticker: String,
    pub name: String,
    pub quantity: i64,
    pub avg_cost: Decimal,
}

/// An authenticated caller, as supplied by the identity collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}
