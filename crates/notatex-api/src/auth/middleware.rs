use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use notatex_core::AppError;
use notatex_db::TokenRepository;

use crate::auth::models::{AccountContext, TokenHash};
use crate::auth::token::hash_token;
use crate::error::HttpAppError;

/// State for the bearer-token middleware.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenRepository,
}

/// Require a valid bearer token on every request it wraps.
///
/// A missing or malformed `Authorization` header fails before any other
/// validation runs. On success the account context and the presented
/// token's hash are inserted into request extensions.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    if !auth_header.starts_with("Bearer ") {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    }

    let token = &auth_header[7..]; // Remove "Bearer " prefix
    let token_hash = hash_token(token);

    // Unknown and expired tokens collapse into one outward signal.
    let account = match auth_state.tokens.verify(&token_hash).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return HttpAppError(AppError::Unauthorized(
                "Invalid or expired token".to_string(),
            ))
            .into_response();
        }
        Err(e) => return HttpAppError(e).into_response(),
    };

    request.extensions_mut().insert(AccountContext { account });
    request.extensions_mut().insert(TokenHash(token_hash));

    next.run(request).await
}
