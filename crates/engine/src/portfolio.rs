//! The portfolio view: materialized positions first, order-history
//! reconciliation as a fallback.

use crate::{error::EngineError, ExecutionEngine};
use core_types::{OrderSide, PortfolioEntry};
use database::OrderLeg;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

impl ExecutionEngine {
    /// Returns the caller's holdings as `{ticker, name, quantity, avg_cost}`
    /// rows, ticker ascending.
    ///
    /// The primary path reads the materialized position book. When that
    /// yields nothing but order history exists (e.g. rows were never
    /// populated by a migration), an equivalent view is derived from the
    /// orders instead. The fallback never writes position rows.
    pub async fn portfolio(&self, user_id: Uuid) -> Result<Vec<PortfolioEntry>, EngineError> {
        let account = self
            .repo()
            .get_account_by_user(user_id)
            .await?
            .ok_or(EngineError::AccountNotFound(user_id))?;

        let rows = self.repo().get_portfolio_rows(account.id).await?;
        if !rows.is_empty() {
            return Ok(rows);
        }

        let legs = self.repo().get_order_legs(account.id).await?;
        if !legs.is_empty() {
            debug!(user_id = %user_id, legs = legs.len(), "deriving portfolio from order history");
        }
        Ok(derive_from_orders(&legs))
    }
}

/// Reconstructs a portfolio view from non-canceled order legs.
///
/// Net quantity per symbol is `sum(buys) - sum(sells)`; average cost is the
/// notional-weighted average of the buy legs only (0 with no buy legs).
/// Symbols with a non-positive net quantity are dropped. Output is ticker
/// ascending.
pub fn derive_from_orders(legs: &[OrderLeg]) -> Vec<PortfolioEntry> {
    struct Tally {
        name: String,
        net_qty: i64,
        buy_qty: i64,
        buy_notional: Decimal,
    }

    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    for leg in legs {
        let tally = tallies.entry(leg.ticker.clone()).or_insert_with(|| Tally {
            name: leg.name.clone(),
            net_qty: 0,
            buy_qty: 0,
            buy_notional: Decimal::ZERO,
        });
        match leg.side.parse::<OrderSide>() {
            Ok(OrderSide::Buy) => {
                tally.net_qty += leg.quantity;
                tally.buy_qty += leg.quantity;
                tally.buy_notional += leg.price * Decimal::from(leg.quantity);
            }
            Ok(OrderSide::Sell) => tally.net_qty -= leg.quantity,
            // The schema constrains side to buy/sell; anything else would
            // be corrupt data and contributes nothing.
            Err(_) => {}
        }
    }

    tallies
        .into_iter()
        .filter(|(_, t)| t.net_qty > 0)
        .map(|(ticker, t)| {
            let avg_cost = if t.buy_qty > 0 {
                t.buy_notional / Decimal::from(t.buy_qty)
            } else {
                Decimal::ZERO
            };
            PortfolioEntry {
                ticker,
                name: t.name,
                quantity: t.net_qty,
                avg_cost,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn leg(ticker: &str, side: &str, quantity: i64, price: Decimal) -> OrderLeg {
        OrderLeg {
            ticker: ticker.to_string(),
            name: format!("{ticker} Inc."),
            side: side.to_string(),
            quantity,
            price,
        }
    }

    #[test]
    fn empty_history_yields_empty_portfolio() {
        assert!(derive_from_orders(&[]).is_empty());
    }

    #[test]
    fn buys_accumulate_with_weighted_average() {
        let entries = derive_from_orders(&[
            leg("AAPL", "buy", 10, dec!(100)),
            leg("AAPL", "buy", 30, dec!(200)),
        ]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].quantity, 40);
        assert_eq!(entries[0].avg_cost, dec!(175));
    }

    #[test]
    fn sells_reduce_quantity_but_not_the_buy_average() {
        let entries = derive_from_orders(&[
            leg("AAPL", "buy", 10, dec!(100)),
            leg("AAPL", "sell", 4, dec!(150)),
        ]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].quantity, 6);
        assert_eq!(entries[0].avg_cost, dec!(100));
    }

    #[test]
    fn flat_and_net_short_symbols_are_dropped() {
        let entries = derive_from_orders(&[
            leg("AAPL", "buy", 10, dec!(100)),
            leg("AAPL", "sell", 10, dec!(120)),
            leg("MSFT", "sell", 5, dec!(300)),
            leg("TSLA", "buy", 1, dec!(250)),
        ]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ticker, "TSLA");
    }

    #[test]
    fn output_is_ticker_ascending() {
        let entries = derive_from_orders(&[
            leg("MSFT", "buy", 1, dec!(300)),
            leg("AAPL", "buy", 1, dec!(100)),
        ]);
        let tickers: Vec<_> = entries.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn full_round_trip_matches_trade_scenarios() {
        // Scenarios A-C: buy 10 @ 50, buy 5 @ 50, sell 15 -> flat.
        let entries = derive_from_orders(&[
            leg("X", "buy", 10, dec!(50)),
            leg("X", "buy", 5, dec!(50)),
            leg("X", "sell", 15, dec!(50)),
        ]);
        assert!(entries.is_empty());
    }
}
