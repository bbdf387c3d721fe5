//! # Bourse Trading Engine
//!
//! The orchestrator for everything that mutates trading state: order
//! execution, the cash ledger, the position book, and the market-calendar
//! administration operations. Read paths (balance, histories, portfolio)
//! live here too so the HTTP layer stays a thin shell.
//!
//! ## Atomicity contract
//!
//! Every mutating operation runs inside a single database transaction with
//! the affected account row locked `FOR UPDATE` first (and the position row
//! second, for orders). A failure at any step returns early, dropping the
//! transaction and rolling back everything written so far; no partially
//! applied state is ever visible to a concurrent reader.

use database::DbRepository;
use market_calendar::MarketCalendar;

pub mod error;
pub mod execution;
pub mod ledger;
pub mod portfolio;
pub mod calendar;

pub use error::EngineError;
pub use portfolio::derive_from_orders;

/// The central orchestrator for the trading core.
///
/// Cheap to clone: the repository holds a shared connection pool and the
/// calendar resolver is a copyable timezone offset.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    repo: DbRepository,
    calendar: MarketCalendar,
}

impl ExecutionEngine {
    pub fn new(repo: DbRepository, calendar: MarketCalendar) -> Self {
        Self { repo, calendar }
    }

    pub(crate) fn repo(&self) -> &DbRepository {
        &self.repo
    }

    pub(crate) fn calendar(&self) -> &MarketCalendar {
        &self.calendar
    }
}
