pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{CashTxKind, HolidaySession, OrderSide, OrderStatus, Role};
pub use error::CoreError;
pub use structs::{
    Account, CashTransaction, Identity, MarketHolidayEntry, MarketScheduleEntry, Order,
    PortfolioEntry, Position, Symbol,
};

/// Normalizes a user-supplied ticker for catalog lookups.
///
/// Tickers are stored upper-case and matched case-insensitively, so every
/// path that touches the symbols table goes through this one function.
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_is_trimmed_and_uppercased() {
        assert_eq!(normalize_ticker("  aapl "), "AAPL");
        assert_eq!(normalize_ticker("Msft"), "MSFT");
        assert_eq!(normalize_ticker("BRK.B"), "BRK.B");
    }
}
