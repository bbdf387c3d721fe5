use rust_decimal::Decimal;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: Server,
    pub market: Market,
    pub accounts: Accounts,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// The address the web server binds to (e.g., "0.0.0.0:3000").
    pub bind_addr: String,
}

/// Market-calendar settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    /// The operating timezone as a fixed offset from UTC, in minutes
    /// (east positive, e.g. -300 for US Eastern standard time). The
    /// schedule table's open/close times are interpreted in this zone.
    pub utc_offset_minutes: i32,
}

/// Account-provisioning settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Accounts {
    /// The cash balance a freshly opened account starts with when the
    /// `open-account` command is not given an explicit amount.
    pub opening_balance: Decimal,
    /// The settlement currency for new accounts.
    pub currency: String,
}
