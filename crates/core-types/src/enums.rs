use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The direction of an order.
///
/// Persisted as lower-case text (`"buy"` / `"sell"`) in the orders table, so
/// the string forms here are part of the storage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl FromStr for OrderSide {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(CoreError::InvalidInput(
                "side".to_string(),
                other.to_string(),
            )),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle state of an order.
///
/// Executed orders stay `open`; the only observed transition is
/// `open -> canceled`, and a canceled order never transitions back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Canceled => "canceled",
        }
    }
}

/// The kind of a cash-ledger entry. Trade settlement mutates the balance
/// without writing a ledger row, so only these two kinds are ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashTxKind {
    Deposit,
    Withdrawal,
}

impl CashTxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashTxKind::Deposit => "deposit",
            CashTxKind::Withdrawal => "withdrawal",
        }
    }
}

/// The session type recorded for a market holiday.
///
/// Only `closed` is consulted by the open/closed gate; `early_close` is
/// recorded and listed but not yet enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidaySession {
    Closed,
    EarlyClose,
}

impl HolidaySession {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidaySession::Closed => "closed",
            HolidaySession::EarlyClose => "early_close",
        }
    }
}

impl FromStr for HolidaySession {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "closed" => Ok(HolidaySession::Closed),
            "early_close" => Ok(HolidaySession::EarlyClose),
            other => Err(CoreError::InvalidInput(
                "session_type".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// The role carried by an authenticated caller. Identity itself is an
/// external collaborator; the core only branches on this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_round_trips_through_storage_form() {
        assert_eq!("buy".parse::<OrderSide>().unwrap(), OrderSide::Buy);
        assert_eq!("sell".parse::<OrderSide>().unwrap(), OrderSide::Sell);
        assert_eq!(OrderSide::Buy.as_str(), "buy");
        assert!("BUY".parse::<OrderSide>().is_err());
        assert!("hold".parse::<OrderSide>().is_err());
    }

    #[test]
    fn holiday_session_parses_storage_form() {
        assert_eq!(
            "early_close".parse::<HolidaySession>().unwrap(),
            HolidaySession::EarlyClose
        );
        assert!("half_day".parse::<HolidaySession>().is_err());
    }
}
