//! Account registration and session handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Duration, Utc};
use notatex_core::{models::AccountInfo, AppError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::models::{AccountContext, TokenHash};
use crate::auth::password::{burn_password_check, hash_password, verify_password};
use crate::auth::token::{generate_token, hash_token, token_prefix};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

// Wrong password and unknown username must be indistinguishable.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub account_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub account: AccountInfo,
    /// Opaque bearer token; shown once, never stored in raw form
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEmailRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateEmailResponse {
    pub message: String,
    pub account: AccountInfo,
}

#[utoipa::path(
    post,
    path = "/api/v0/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account registered", body = RegisterResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, req), fields(operation = "register"))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput("Username and password are required".to_string()).into());
    }
    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty());

    // bcrypt is CPU-bound; keep it off the async workers.
    let password = req.password.clone();
    let (password_hash, password_salt) = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))??;

    let account = state
        .accounts
        .create(&username, &password_hash, &password_salt, email)
        .await?;

    tracing::info!(account_id = account.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account registered successfully".to_string(),
            account_id: account.id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v0/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, req), fields(operation = "login"))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput("Username and password are required".to_string()).into());
    }

    let account = state.accounts.find_by_username(&req.username).await?;

    // Verify off the async workers; unknown usernames burn the same bcrypt
    // cost as a real verification.
    let password = req.password;
    let account = tokio::task::spawn_blocking(move || match account {
        Some(account) if verify_password(&password, &account.password_hash) => Some(account),
        Some(_) => None,
        None => {
            burn_password_check(&password);
            None
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?;

    let Some(account) = account else {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
    };

    let token = generate_token();
    let expires_at = Utc::now() + Duration::minutes(state.config.token_ttl_minutes);
    let issued = state
        .tokens
        .insert(
            account.id,
            &hash_token(&token),
            &token_prefix(&token),
            expires_at,
        )
        .await?;

    tracing::info!(account_id = account.id, "Login successful");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        account: AccountInfo::from(account),
        token,
        expires_at: issued.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v0/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token_hash), fields(operation = "logout"))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    token_hash: TokenHash,
) -> Result<impl IntoResponse, HttpAppError> {
    state.tokens.revoke(&token_hash.0).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Authenticated account", body = AccountInfo),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn me(ctx: AccountContext) -> Json<AccountInfo> {
    Json(ctx.account)
}

#[utoipa::path(
    patch,
    path = "/api/v0/auth/email",
    tag = "auth",
    request_body = UpdateEmailRequest,
    responses(
        (status = 200, description = "Email updated", body = UpdateEmailResponse),
        (status = 400, description = "Missing email", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, req), fields(account_id = ctx.account_id(), operation = "update_email"))]
pub async fn update_email(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    ValidatedJson(req): ValidatedJson<UpdateEmailRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err(AppError::InvalidInput("Email is required".to_string()).into());
    }

    let updated = state.accounts.update_email(ctx.account_id(), email).await?;
    if !updated {
        return Err(AppError::NotFound("Account not found".to_string()).into());
    }

    let account = state
        .accounts
        .get_by_id(ctx.account_id())
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

    Ok(Json(UpdateEmailResponse {
        message: "Email updated".to_string(),
        account,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v0/auth/account",
    tag = "auth",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = ctx.account_id(), operation = "delete_account"))]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let deleted = state.accounts.delete(ctx.account_id()).await?;
    if !deleted {
        return Err(AppError::NotFound("Account not found".to_string()).into());
    }

    tracing::info!(account_id = ctx.account_id(), "Account deleted");

    Ok(Json(MessageResponse {
        message: "Account deleted".to_string(),
    }))
}
