use chrono::NaiveDate;
use market_calendar::GateReason;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Order quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    #[error("Order side must be 'buy' or 'sell', got '{0}'")]
    InvalidSide(String),

    #[error("Amount must be strictly positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("Weekday index must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidWeekday(i16),

    #[error("Holiday session type must be 'closed' or 'early_close', got '{0}'")]
    InvalidSessionType(String),

    #[error("The market is closed ({reason:?})")]
    MarketClosed { reason: GateReason },

    #[error("No cash account exists for user {0}")]
    AccountNotFound(Uuid),

    #[error("Symbol '{0}' is not listed")]
    SymbolNotListed(String),

    #[error("Symbol '{0}' has no valid reference price")]
    InvalidPrice(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("No open position in '{0}' to sell")]
    NoPositionToSell(String),

    #[error("Sell quantity {requested} exceeds held position of {held}")]
    SellExceedsPosition { requested: i64, held: i64 },

    #[error("Order {0} not found")]
    OrderNotFound(Uuid),

    #[error("No holiday is recorded for {0}")]
    HolidayNotFound(NaiveDate),

    #[error("This operation requires the admin role")]
    AdminRequired,

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
}

impl EngineError {
    /// A stable, machine-readable kind for each failure so clients can
    /// branch on cause instead of parsing the human-readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidQuantity(_) => "invalid_quantity",
            EngineError::InvalidSide(_) => "invalid_side",
            EngineError::InvalidAmount(_) => "invalid_amount",
            EngineError::InvalidWeekday(_) => "invalid_weekday",
            EngineError::InvalidSessionType(_) => "invalid_session_type",
            EngineError::MarketClosed { .. } => "market_closed",
            EngineError::AccountNotFound(_) => "account_not_found",
            EngineError::SymbolNotListed(_) => "symbol_not_listed",
            EngineError::InvalidPrice(_) => "invalid_price",
            EngineError::InsufficientFunds { .. } => "insufficient_funds",
            EngineError::NoPositionToSell(_) => "no_position_to_sell",
            EngineError::SellExceedsPosition { .. } => "sell_exceeds_position",
            EngineError::OrderNotFound(_) => "order_not_found",
            EngineError::HolidayNotFound(_) => "holiday_not_found",
            EngineError::AdminRequired => "admin_required",
            EngineError::Database(_) => "storage_error",
        }
    }
}
