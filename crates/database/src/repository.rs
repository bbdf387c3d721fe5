use crate::DbError;
use chrono::NaiveDate;
use core_types::{
    Account, CashTransaction, MarketHolidayEntry, MarketScheduleEntry, Order, PortfolioEntry,
    Position, Symbol,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, Transaction};
use uuid::Uuid;

/// A database transaction handle.
///
/// The engine drives one of these through an entire order execution or cash
/// adjustment: every row lock taken inside it is held until `commit`, and
/// dropping the handle without committing rolls everything back.
pub type PgTx = Transaction<'static, Postgres>;

/// One order leg joined to its symbol, as consumed by the portfolio
/// fallback derivation. Canceled orders are filtered out in SQL.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderLeg {
    pub ticker: String,
    pub name: String,
    pub side: String,
    pub quantity: i64,
    pub price: Decimal,
}

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Starts a transaction for a mutating operation.
    pub async fn begin(&self) -> Result<PgTx, DbError> {
        Ok(self.pool.begin().await?)
    }

    // ==========================================================================
    // Accounts
    // ==========================================================================

    /// Fetches a user's cash account without locking it (read paths only).
    pub async fn get_account_by_user(&self, user_id: Uuid) -> Result<Option<Account>, DbError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, user_id, currency, balance, created_at FROM accounts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Creates the one cash account a user gets at registration.
    pub async fn create_account(
        &self,
        user_id: Uuid,
        currency: &str,
        opening_balance: Decimal,
    ) -> Result<Account, DbError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, user_id, currency, balance)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, currency, balance, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(currency)
        .bind(opening_balance)
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }

    /// Locks a user's account row for the remainder of the transaction.
    ///
    /// This is the serialization point for all mutations touching one
    /// account: concurrent operations on the same account queue here while
    /// operations on other accounts proceed untouched.
    pub async fn lock_account_by_user(
        &self,
        tx: &mut PgTx,
        user_id: Uuid,
    ) -> Result<Option<Account>, DbError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, currency, balance, created_at
            FROM accounts WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(account)
    }

    /// Persists a new balance for an already-locked account row.
    pub async fn update_account_balance(
        &self,
        tx: &mut PgTx,
        account_id: Uuid,
        new_balance: Decimal,
    ) -> Result<(), DbError> {
        sqlx::query("UPDATE accounts SET balance = $2 WHERE id = $1")
            .bind(account_id)
            .bind(new_balance)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    // ==========================================================================
    // Cash transactions
    // ==========================================================================

    /// Appends an immutable cash-ledger entry inside the caller's transaction.
    pub async fn insert_cash_transaction(
        &self,
        tx: &mut PgTx,
        account_id: Uuid,
        kind: &str,
        amount: Decimal,
    ) -> Result<CashTransaction, DbError> {
        let record = sqlx::query_as::<_, CashTransaction>(
            r#"
            INSERT INTO cash_transactions (id, account_id, kind, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id, account_id, kind, amount, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(kind)
        .bind(amount)
        .fetch_one(&mut **tx)
        .await?;
        Ok(record)
    }

    /// Fetches an account's cash-ledger history, newest first.
    pub async fn get_cash_transactions(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<CashTransaction>, DbError> {
        let rows = sqlx::query_as::<_, CashTransaction>(
            r#"
            SELECT id, account_id, kind, amount, created_at
            FROM cash_transactions
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ==========================================================================
    // Symbols (read-only reference data for the trading path)
    // ==========================================================================

    /// Looks up a symbol by its already-normalized ticker. No lock is taken:
    /// the reference price is a snapshot valid for the duration of one order.
    pub async fn get_symbol_by_ticker(&self, ticker: &str) -> Result<Option<Symbol>, DbError> {
        let symbol = sqlx::query_as::<_, Symbol>(
            r#"
            SELECT id, ticker, name, exchange, sector, currency, total_shares, reference_price
            FROM symbols WHERE ticker = $1
            "#,
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;
        Ok(symbol)
    }

    /// Lists the full instrument catalog, ticker ascending.
    pub async fn list_symbols(&self) -> Result<Vec<Symbol>, DbError> {
        let symbols = sqlx::query_as::<_, Symbol>(
            r#"
            SELECT id, ticker, name, exchange, sector, currency, total_shares, reference_price
            FROM symbols ORDER BY ticker ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(symbols)
    }

    /// Inserts a new listed instrument (administrative path).
    pub async fn insert_symbol(&self, symbol: &Symbol) -> Result<Symbol, DbError> {
        let inserted = sqlx::query_as::<_, Symbol>(
            r#"
            INSERT INTO symbols (id, ticker, name, exchange, sector, currency, total_shares, reference_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, ticker, name, exchange, sector, currency, total_shares, reference_price
            "#,
        )
        .bind(symbol.id)
        .bind(&symbol.ticker)
        .bind(&symbol.name)
        .bind(&symbol.exchange)
        .bind(&symbol.sector)
        .bind(&symbol.currency)
        .bind(symbol.total_shares)
        .bind(symbol.reference_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    // ==========================================================================
    // Positions
    // ==========================================================================

    /// Locks the (account, symbol) position row, if one exists. Always
    /// called after `lock_account_by_user`; account before position is the
    /// fixed lock order.
    pub async fn lock_position(
        &self,
        tx: &mut PgTx,
        account_id: Uuid,
        symbol_id: Uuid,
    ) -> Result<Option<Position>, DbError> {
        let position = sqlx::query_as::<_, Position>(
            r#"
            SELECT id, account_id, symbol_id, quantity, avg_cost, updated_at
            FROM positions
            WHERE account_id = $1 AND symbol_id = $2
            FOR UPDATE
            "#,
        )
        .bind(account_id)
        .bind(symbol_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(position)
    }

    /// Creates or replaces the position for an (account, symbol) pair with
    /// the given quantity and blended average cost.
    pub async fn upsert_position(
        &self,
        tx: &mut PgTx,
        account_id: Uuid,
        symbol_id: Uuid,
        quantity: i64,
        avg_cost: Decimal,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO positions (id, account_id, symbol_id, quantity, avg_cost, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (account_id, symbol_id) DO UPDATE SET
              quantity   = EXCLUDED.quantity,
              avg_cost   = EXCLUDED.avg_cost,
              updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(symbol_id)
        .bind(quantity)
        .bind(avg_cost)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Deletes a position row outright. Used when a sell exhausts the
    /// holding: a flat position must not persist a stale average cost.
    pub async fn delete_position(&self, tx: &mut PgTx, position_id: Uuid) -> Result<(), DbError> {
        sqlx::query("DELETE FROM positions WHERE id = $1")
            .bind(position_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// The primary portfolio read path: materialized positions joined to
    /// their symbols, ticker ascending for deterministic output.
    pub async fn get_portfolio_rows(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<PortfolioEntry>, DbError> {
        let rows = sqlx::query_as::<_, PortfolioEntry>(
            r#"
            SELECT s.ticker, s.name, p.quantity, p.avg_cost
            FROM positions AS p
            JOIN symbols AS s ON s.id = p.symbol_id
            WHERE p.account_id = $1
            ORDER BY s.ticker ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ==========================================================================
    // Orders
    // ==========================================================================

    /// Appends the order record for an executed trade inside the caller's
    /// transaction. Status starts (and for executed orders stays) `open`.
    pub async fn insert_order(
        &self,
        tx: &mut PgTx,
        account_id: Uuid,
        symbol_id: Uuid,
        side: &str,
        quantity: i64,
        price: Decimal,
    ) -> Result<Order, DbError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (id, account_id, symbol_id, side, quantity, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, account_id, symbol_id, side, quantity, price, status, created_at, canceled_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(symbol_id)
        .bind(side)
        .bind(quantity)
        .bind(price)
        .fetch_one(&mut **tx)
        .await?;
        Ok(order)
    }

    /// Fetches an account's order history, newest first.
    pub async fn get_orders_for_account(&self, account_id: Uuid) -> Result<Vec<Order>, DbError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, account_id, symbol_id, side, quantity, price, status, created_at, canceled_at
            FROM orders
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Fetches the non-canceled order legs for the portfolio fallback
    /// derivation, joined to symbols so the view can be built in one pass.
    pub async fn get_order_legs(&self, account_id: Uuid) -> Result<Vec<OrderLeg>, DbError> {
        let legs = sqlx::query_as::<_, OrderLeg>(
            r#"
            SELECT s.ticker, s.name, o.side, o.quantity, o.price
            FROM orders AS o
            JOIN symbols AS s ON s.id = o.symbol_id
            WHERE o.account_id = $1 AND o.status <> 'canceled'
            ORDER BY o.created_at ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(legs)
    }

    /// Flips an order's status to `canceled` and stamps the cancellation
    /// time. Returns `None` if no such order exists. Repeating the call is
    /// harmless: the original cancellation timestamp is preserved.
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<Option<Order>, DbError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = 'canceled', canceled_at = COALESCE(canceled_at, now())
            WHERE id = $1
            RETURNING id, account_id, symbol_id, side, quantity, price, status, created_at, canceled_at
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    // ==========================================================================
    // Market calendar (administrative reference data)
    // ==========================================================================

    /// Fetches the full weekly schedule, weekday ascending.
    pub async fn get_schedule(&self) -> Result<Vec<MarketScheduleEntry>, DbError> {
        let rows = sqlx::query_as::<_, MarketScheduleEntry>(
            r#"
            SELECT weekday, open_time, close_time, premarket_open, afterhours_close, notes
            FROM market_schedule ORDER BY weekday ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Upserts one weekday's schedule row inside the caller's transaction,
    /// so a multi-row update lands whole or not at all. The primary key on
    /// `weekday` guarantees the table never holds more than 7 rows.
    pub async fn upsert_schedule_entry(
        &self,
        tx: &mut PgTx,
        entry: &MarketScheduleEntry,
    ) -> Result<MarketScheduleEntry, DbError> {
        let row = sqlx::query_as::<_, MarketScheduleEntry>(
            r#"
            INSERT INTO market_schedule
              (weekday, open_time, close_time, premarket_open, afterhours_close, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (weekday) DO UPDATE SET
              open_time        = EXCLUDED.open_time,
              close_time       = EXCLUDED.close_time,
              premarket_open   = EXCLUDED.premarket_open,
              afterhours_close = EXCLUDED.afterhours_close,
              notes            = EXCLUDED.notes
            RETURNING weekday, open_time, close_time, premarket_open, afterhours_close, notes
            "#,
        )
        .bind(entry.weekday)
        .bind(entry.open_time)
        .bind(entry.close_time)
        .bind(entry.premarket_open)
        .bind(entry.afterhours_close)
        .bind(&entry.notes)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row)
    }

    /// Fetches all holiday overrides, date ascending.
    pub async fn get_holidays(&self) -> Result<Vec<MarketHolidayEntry>, DbError> {
        let rows = sqlx::query_as::<_, MarketHolidayEntry>(
            r#"
            SELECT holiday_date, description, session_type
            FROM market_holidays ORDER BY holiday_date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Fetches the holiday override for a single calendar date, if any.
    pub async fn get_holiday_on(
        &self,
        date: NaiveDate,
    ) -> Result<Option<MarketHolidayEntry>, DbError> {
        let row = sqlx::query_as::<_, MarketHolidayEntry>(
            r#"
            SELECT holiday_date, description, session_type
            FROM market_holidays WHERE holiday_date = $1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Upserts a holiday override keyed on its date.
    pub async fn upsert_holiday(
        &self,
        entry: &MarketHolidayEntry,
    ) -> Result<MarketHolidayEntry, DbError> {
        let row = sqlx::query_as::<_, MarketHolidayEntry>(
            r#"
            INSERT INTO market_holidays (holiday_date, description, session_type)
            VALUES ($1, $2, $3)
            ON CONFLICT (holiday_date) DO UPDATE SET
              description  = EXCLUDED.description,
              session_type = EXCLUDED.session_type
            RETURNING holiday_date, description, session_type
            "#,
        )
        .bind(entry.holiday_date)
        .bind(&entry.description)
        .bind(&entry.session_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Deletes one holiday override; returns the number of rows removed.
    pub async fn delete_holiday(&self, date: NaiveDate) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM market_holidays WHERE holiday_date = $1")
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Clears the entire holiday table; returns the number of rows removed.
    pub async fn delete_all_holidays(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM market_holidays")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
