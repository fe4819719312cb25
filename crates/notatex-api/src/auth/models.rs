use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use notatex_core::models::AccountInfo;

use crate::error::ErrorResponse;

/// Authenticated account context, inserted into request extensions by the
/// bearer middleware.
#[derive(Debug, Clone)]
pub struct AccountContext {
    pub account: AccountInfo,
}

impl AccountContext {
    pub fn account_id(&self) -> i64 {
        self.account.id
    }
}

// Extract directly from request parts so handlers taking Multipart (which
// consumes the body) can still receive the context.
impl<S> FromRequestParts<S> for AccountContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccountContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("Missing account context", "UNAUTHORIZED")),
                )
            })
    }
}

/// Hash of the presented bearer token, kept for revocation (logout).
#[derive(Debug, Clone)]
pub struct TokenHash(pub String);

impl<S> FromRequestParts<S> for TokenHash
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<TokenHash>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Missing account context", "UNAUTHORIZED")),
            )
        })
    }
}
