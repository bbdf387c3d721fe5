use crate::{error::AppError, identity::Caller, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use core_types::{CashTransaction, MarketHolidayEntry, MarketScheduleEntry, Order, PortfolioEntry, Symbol};
use market_calendar::MarketStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub ticker: String,
    pub side: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CashRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub currency: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

// ==============================================================================
// Orders
// ==============================================================================

/// # POST /api/orders
/// Places an immediate, all-or-nothing order at the symbol's reference price.
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .engine
        .place_order(identity.user_id, &req.ticker, &req.side, req.quantity)
        .await?;
    Ok(Json(order))
}

/// # DELETE /api/orders/:order_id
/// Cancels an order. Status-only: settled cash/position effects stand.
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Caller(_identity): Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.engine.cancel_order(order_id).await?;
    Ok(Json(order))
}

/// # GET /api/orders
/// The caller's order history, newest first.
pub async fn get_order_history(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.engine.order_history(identity.user_id).await?;
    Ok(Json(orders))
}

// ==============================================================================
// Accounts (cash management)
// ==============================================================================

/// # POST /api/accounts/deposit
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Json(req): Json<CashRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    let account = state.engine.deposit(identity.user_id, req.amount).await?;
    Ok(Json(BalanceResponse {
        currency: account.currency,
        balance: account.balance,
    }))
}

/// # POST /api/accounts/withdraw
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Json(req): Json<CashRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    let account = state.engine.withdraw(identity.user_id, req.amount).await?;
    Ok(Json(BalanceResponse {
        currency: account.currency,
        balance: account.balance,
    }))
}

/// # GET /api/accounts/balance
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<Json<BalanceResponse>, AppError> {
    let account = state.engine.balance(identity.user_id).await?;
    Ok(Json(BalanceResponse {
        currency: account.currency,
        balance: account.balance,
    }))
}

/// # GET /api/accounts/transactions
/// The caller's cash-ledger history, newest first.
pub async fn get_transaction_history(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<Json<Vec<CashTransaction>>, AppError> {
    let transactions = state.engine.transaction_history(identity.user_id).await?;
    Ok(Json(transactions))
}

/// # GET /api/portfolio
pub async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<Json<Vec<PortfolioEntry>>, AppError> {
    let entries = state.engine.portfolio(identity.user_id).await?;
    Ok(Json(entries))
}

// ==============================================================================
// Market (read-only asset catalog)
// ==============================================================================

/// # GET /api/market/assets
pub async fn list_assets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Symbol>>, AppError> {
    let symbols = state.engine.list_symbols().await?;
    Ok(Json(symbols))
}

/// # GET /api/market/assets/:ticker
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Json<Symbol>, AppError> {
    let symbol = state.engine.get_symbol(&ticker).await?;
    Ok(Json(symbol))
}

// ==============================================================================
// Market calendar
// ==============================================================================

/// # GET /api/market/open
/// The market gate's verdict for right now.
pub async fn is_market_open(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MarketStatus>, AppError> {
    let status = state.engine.market_status().await?;
    Ok(Json(status))
}

/// # GET /api/market/schedule
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MarketScheduleEntry>>, AppError> {
    let schedule = state.engine.get_schedule().await?;
    Ok(Json(schedule))
}

/// # PUT /api/market/schedule (admin)
/// Upserts the posted weekday rows and returns the resulting schedule.
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Json(rows): Json<Vec<MarketScheduleEntry>>,
) -> Result<Json<Vec<MarketScheduleEntry>>, AppError> {
    let schedule = state.engine.update_schedule(&identity, rows).await?;
    Ok(Json(schedule))
}

/// # GET /api/market/holidays
pub async fn get_holidays(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MarketHolidayEntry>>, AppError> {
    let holidays = state.engine.get_holidays().await?;
    Ok(Json(holidays))
}

/// # POST /api/market/holidays (admin)
/// Upserts a holiday keyed on its date.
pub async fn add_holiday(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Json(entry): Json<MarketHolidayEntry>,
) -> Result<Json<MarketHolidayEntry>, AppError> {
    let saved = state.engine.add_holiday(&identity, entry).await?;
    Ok(Json(saved))
}

/// # DELETE /api/market/holidays/:date (admin)
pub async fn delete_holiday(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DeletedResponse>, AppError> {
    state.engine.delete_holiday(&identity, date).await?;
    Ok(Json(DeletedResponse { deleted: 1 }))
}

/// # DELETE /api/market/holidays (admin)
pub async fn delete_all_holidays(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<Json<DeletedResponse>, AppError> {
    let deleted = state.engine.delete_all_holidays(&identity).await?;
    Ok(Json(DeletedResponse { deleted }))
}
