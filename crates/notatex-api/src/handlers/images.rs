//! Owner-scoped image listing.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use notatex_core::{
    models::ImageResponse,
    AppError,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::models::AccountContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

const MIN_LIMIT: i64 = 1;
const MAX_LIMIT: i64 = 200;
const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListImagesQuery {
    /// Page size, 1..=200 (default 50)
    pub limit: Option<i64>,
    /// Rows to skip, >= 0 (default 0)
    pub offset: Option<i64>,
    /// Restrict to one batch
    pub batch_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListImagesResponse {
    pub count: usize,
    pub images: Vec<ImageResponse>,
    pub limit: i64,
    pub offset: i64,
    pub batch_id: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v0/images",
    tag = "images",
    params(ListImagesQuery),
    responses(
        (status = 200, description = "Images owned by the account, newest first", body = ListImagesResponse),
        (status = 400, description = "Pagination bounds out of range", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state),
    fields(account_id = ctx.account_id(), operation = "list_images")
)]
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    Query(query): Query<ListImagesQuery>,
) -> Result<Json<ListImagesResponse>, HttpAppError> {
    // Bounds are checked before any store access.
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::InvalidInput(format!(
            "limit must be between {} and {}",
            MIN_LIMIT, MAX_LIMIT
        ))
        .into());
    }
    let offset = query.offset.unwrap_or(0);
    if offset < 0 {
        return Err(AppError::InvalidInput("offset must be non-negative".to_string()).into());
    }

    let images = state
        .images
        .list(ctx.account_id(), query.batch_id, limit, offset)
        .await?;

    Ok(Json(ListImagesResponse {
        count: images.len(),
        images: images.into_iter().map(ImageResponse::from).collect(),
        limit,
        offset,
        batch_id: query.batch_id,
    }))
}
