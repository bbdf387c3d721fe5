use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use engine::EngineError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Every failure maps to a stable `kind` in the JSON body so clients branch
/// on cause (insufficient funds vs. market closed vs. not found) rather
/// than parsing free-text messages.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            AppError::Engine(err) => {
                let status = match err {
                    EngineError::InvalidQuantity(_)
                    | EngineError::InvalidSide(_)
                    | EngineError::InvalidAmount(_)
                    | EngineError::InvalidWeekday(_)
                    | EngineError::InvalidSessionType(_) => StatusCode::BAD_REQUEST,
                    // The calendar gate failed; the caller may retry later.
                    EngineError::MarketClosed { .. } => StatusCode::CONFLICT,
                    EngineError::AccountNotFound(_)
                    | EngineError::SymbolNotListed(_)
                    | EngineError::OrderNotFound(_)
                    | EngineError::HolidayNotFound(_) => StatusCode::NOT_FOUND,
                    EngineError::InvalidPrice(_)
                    | EngineError::InsufficientFunds { .. }
                    | EngineError::NoPositionToSell(_)
                    | EngineError::SellExceedsPosition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    EngineError::AdminRequired => StatusCode::FORBIDDEN,
                    EngineError::Database(db_err) => {
                        tracing::error!(error = ?db_err, "Database error.");
                        // The operation is atomic, so a storage failure left
                        // no partial state and the whole call is retryable.
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({
                                "error": {
                                    "kind": "storage_error",
                                    "message": "An internal database error occurred",
                                }
                            })),
                        )
                            .into_response();
                    }
                };
                (status, err.kind(), err.to_string())
            }
            AppError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", message.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "kind": kind,
                "message": message,
            }
        }));
        (status, body).into_response()
    }
}
