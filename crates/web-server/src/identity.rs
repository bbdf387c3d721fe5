//! Identity extraction.
//!
//! Authentication itself is an external collaborator: an upstream gateway
//! verifies the caller and injects `X-User-Id` / `X-User-Role` headers. This
//! module only turns those trusted headers into a typed [`Identity`].

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use core_types::{Identity, Role};
use uuid::Uuid;

const USER_ID_HEADER: &str = "x-user-id";
const ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller, extracted from gateway headers.
pub struct Caller(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing X-User-Id header".to_string()))?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| AppError::Unauthorized("X-User-Id is not a valid UUID".to_string()))?;

        // Any value other than the literal "admin" is an ordinary user.
        let role = match parts
            .headers
            .get(ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some("admin") => Role::Admin,
            _ => Role::User,
        };

        Ok(Caller(Identity { user_id, role }))
    }
}
