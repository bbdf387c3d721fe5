//! Order execution: the atomic cash/position mutation protocol.

use crate::{error::EngineError, ExecutionEngine};
use chrono::{DateTime, Utc};
use core_types::{normalize_ticker, Order, OrderSide, Symbol};
use market_calendar::MarketStatus;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

/// The weighted-average cost of a position after a buy is blended in.
///
/// `(old_cost * old_qty + price * qty) / (old_qty + qty)`, exact to
/// `Decimal` precision. Callers guarantee `old_qty + qty > 0`.
pub fn blended_average_cost(
    old_avg_cost: Decimal,
    old_qty: i64,
    price: Decimal,
    qty: i64,
) -> Decimal {
    let existing_value = old_avg_cost * Decimal::from(old_qty);
    let new_value = price * Decimal::from(qty);
    (existing_value + new_value) / Decimal::from(old_qty + qty)
}

/// The quantity left in a position after a sell, or the reason the sell
/// cannot settle. `held` is `None` when the caller holds no position in the
/// symbol at all.
pub(crate) fn remaining_after_sell(
    ticker: &str,
    held: Option<i64>,
    requested: i64,
) -> Result<i64, EngineError> {
    let held = held.ok_or_else(|| EngineError::NoPositionToSell(ticker.to_string()))?;
    if requested > held {
        return Err(EngineError::SellExceedsPosition { requested, held });
    }
    Ok(held - requested)
}

impl ExecutionEngine {
    /// Resolves the market's open/closed status right now.
    pub async fn market_status(&self) -> Result<MarketStatus, EngineError> {
        self.market_status_at(Utc::now()).await
    }

    /// Resolves the market's open/closed status at a specific instant.
    /// Calendar tables are read without locks; they are administrative
    /// reference data from the trading path's perspective.
    pub async fn market_status_at(
        &self,
        instant: DateTime<Utc>,
    ) -> Result<MarketStatus, EngineError> {
        let schedule = self.repo().get_schedule().await?;
        let date = self.calendar().local_date(instant);
        let holidays: Vec<_> = self.repo().get_holiday_on(date).await?.into_iter().collect();
        Ok(self.calendar().status_at(instant, &schedule, &holidays))
    }

    /// Executes a market-price, all-or-nothing order for `user_id`.
    ///
    /// Preconditions (checked before any mutation): positive quantity, a
    /// recognized side, and an open market; the calendar gate applies
    /// identically to buys and sells. The trade then settles atomically:
    /// one account balance mutation, at most one position upsert/delete,
    /// and exactly one order insert, or none of the three.
    pub async fn place_order(
        &self,
        user_id: Uuid,
        ticker: &str,
        side: &str,
        quantity: i64,
    ) -> Result<Order, EngineError> {
        if quantity <= 0 {
            return Err(EngineError::InvalidQuantity(quantity));
        }
        let side: OrderSide = side
            .parse()
            .map_err(|_| EngineError::InvalidSide(side.to_string()))?;

        let status = self.market_status().await?;
        if !status.open {
            return Err(EngineError::MarketClosed {
                reason: status.reason,
            });
        }

        // Account lock first, position lock second; both held to commit.
        let mut tx = self.repo().begin().await?;
        let account = self
            .repo()
            .lock_account_by_user(&mut tx, user_id)
            .await?
            .ok_or(EngineError::AccountNotFound(user_id))?;

        let ticker = normalize_ticker(ticker);
        let symbol = self
            .repo()
            .get_symbol_by_ticker(&ticker)
            .await?
            .ok_or_else(|| EngineError::SymbolNotListed(ticker.clone()))?;
        if symbol.reference_price <= Decimal::ZERO {
            return Err(EngineError::InvalidPrice(ticker.clone()));
        }
        let price = symbol.reference_price;
        let notional = price * Decimal::from(quantity);

        match side {
            OrderSide::Buy => {
                self.settle_buy(&mut tx, &account, &symbol, quantity, notional)
                    .await?
            }
            OrderSide::Sell => {
                self.settle_sell(&mut tx, &account, &symbol, quantity, notional)
                    .await?
            }
        }

        let order = self
            .repo()
            .insert_order(&mut tx, account.id, symbol.id, side.as_str(), quantity, price)
            .await?;
        tx.commit().await.map_err(database::DbError::from)?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            %ticker,
            side = %side,
            quantity,
            %price,
            "order executed"
        );
        Ok(order)
    }

    async fn settle_buy(
        &self,
        tx: &mut database::PgTx,
        account: &core_types::Account,
        symbol: &Symbol,
        quantity: i64,
        notional: Decimal,
    ) -> Result<(), EngineError> {
        if account.balance < notional {
            return Err(EngineError::InsufficientFunds {
                required: notional,
                available: account.balance,
            });
        }
        self.repo()
            .update_account_balance(tx, account.id, account.balance - notional)
            .await?;

        let position = self.repo().lock_position(tx, account.id, symbol.id).await?;
        let (new_qty, new_avg_cost) = match &position {
            Some(p) => (
                p.quantity + quantity,
                blended_average_cost(p.avg_cost, p.quantity, symbol.reference_price, quantity),
            ),
            // First buy of this symbol: the entry price is the average.
            None => (quantity, symbol.reference_price),
        };
        self.repo()
            .upsert_position(tx, account.id, symbol.id, new_qty, new_avg_cost)
            .await?;
        Ok(())
    }

    async fn settle_sell(
        &self,
        tx: &mut database::PgTx,
        account: &core_types::Account,
        symbol: &Symbol,
        quantity: i64,
        notional: Decimal,
    ) -> Result<(), EngineError> {
        let position = self.repo().lock_position(tx, account.id, symbol.id).await?;
        let remaining = remaining_after_sell(
            &symbol.ticker,
            position.as_ref().map(|p| p.quantity),
            quantity,
        )?;
        // The guard above has rejected the no-position case.
        let position = position.ok_or_else(|| EngineError::NoPositionToSell(symbol.ticker.clone()))?;

        self.repo()
            .update_account_balance(tx, account.id, account.balance + notional)
            .await?;

        if remaining == 0 {
            // Average cost is meaningless for a flat position; delete the
            // row so a future re-entry starts a fresh average.
            self.repo().delete_position(tx, position.id).await?;
        } else {
            self.repo()
                .upsert_position(tx, account.id, symbol.id, remaining, position.avg_cost)
                .await?;
        }
        Ok(())
    }

    /// Cancels an order: flips `open -> canceled` and stamps the time.
    ///
    /// Status-only by design. It does not reverse the cash or position
    /// effects of the already-settled trade; execution reversal would be a
    /// distinct capability.
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<Order, EngineError> {
        let order = self
            .repo()
            .cancel_order(order_id)
            .await?
            .ok_or(EngineError::OrderNotFound(order_id))?;
        info!(order_id = %order.id, "order canceled");
        Ok(order)
    }

    /// Fetches a user's order history, newest first.
    pub async fn order_history(&self, user_id: Uuid) -> Result<Vec<Order>, EngineError> {
        let account = self
            .repo()
            .get_account_by_user(user_id)
            .await?
            .ok_or(EngineError::AccountNotFound(user_id))?;
        Ok(self.repo().get_orders_for_account(account.id).await?)
    }

    /// Lists the instrument catalog.
    pub async fn list_symbols(&self) -> Result<Vec<Symbol>, EngineError> {
        Ok(self.repo().list_symbols().await?)
    }

    /// Fetches one listed instrument by (case-insensitive) ticker.
    pub async fn get_symbol(&self, ticker: &str) -> Result<Symbol, EngineError> {
        let ticker = normalize_ticker(ticker);
        self.repo()
            .get_symbol_by_ticker(&ticker)
            .await?
            .ok_or(EngineError::SymbolNotListed(ticker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn first_buy_sets_average_to_entry_price() {
        // Scenario A: 10 units at 50 from flat.
        assert_eq!(blended_average_cost(dec!(0), 0, dec!(50), 10), dec!(50));
    }

    #[test]
    fn same_price_buys_keep_the_average() {
        // Scenario B: 10 @ 50 then 5 more @ 50.
        assert_eq!(blended_average_cost(dec!(50), 10, dec!(50), 5), dec!(50));
    }

    #[test]
    fn weighted_average_law() {
        // (p1*q1 + p2*q2) / (q1+q2) = (100*10 + 200*30) / 40 = 175
        assert_eq!(blended_average_cost(dec!(100), 10, dec!(200), 30), dec!(175));
    }

    #[test]
    fn blend_is_exact_in_decimal() {
        // 1 @ 10 then 3 @ 11 -> 43/4 = 10.75, with no float drift.
        assert_eq!(blended_average_cost(dec!(10), 1, dec!(11), 3), dec!(10.75));
        // Fractional prices stay exact too: (10.10 + 10.20) / 2 = 10.15.
        assert_eq!(blended_average_cost(dec!(10.10), 1, dec!(10.20), 1), dec!(10.15));
    }

    #[test]
    fn sell_without_a_position_is_rejected() {
        let err = remaining_after_sell("AAPL", None, 1).unwrap_err();
        assert!(matches!(err, EngineError::NoPositionToSell(t) if t == "AAPL"));
    }

    #[test]
    fn sell_beyond_the_held_quantity_is_rejected() {
        // Scenario: 10 held, 15 requested.
        let err = remaining_after_sell("AAPL", Some(10), 15).unwrap_err();
        assert!(matches!(
            err,
            EngineError::SellExceedsPosition {
                requested: 15,
                held: 10
            }
        ));
    }

    #[test]
    fn sell_within_the_position_reports_the_remainder() {
        assert_eq!(remaining_after_sell("AAPL", Some(15), 15).unwrap(), 0);
        assert_eq!(remaining_after_sell("AAPL", Some(15), 5).unwrap(), 10);
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(EngineError::InvalidQuantity(0).kind(), "invalid_quantity");
        assert_eq!(
            EngineError::InsufficientFunds {
                required: dec!(100),
                available: dec!(1)
            }
            .kind(),
            "insufficient_funds"
        );
        assert_eq!(
            EngineError::SellExceedsPosition {
                requested: 5,
                held: 1
            }
            .kind(),
            "sell_exceeds_position"
        );
        assert_eq!(EngineError::AdminRequired.kind(), "admin_required");
    }
}
