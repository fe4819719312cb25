//! Document assembly: convert a set of owned images into one LaTeX file.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Response, StatusCode},
};
use notatex_core::AppError;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::models::AccountContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::transcription::{guess_mime, PageSource};
use crate::state::AppState;

/// Fixed download filename for the assembled document.
pub const LATEX_FILENAME: &str = "images_includes.tex";
const LATEX_CONTENT_TYPE: &str = "application/x-tex";
/// Response header listing requested ids that did not resolve.
pub const MISSING_IDS_HEADER: &str = "x-missing-image-ids";

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImagesToLatexRequest {
    pub image_ids: Vec<i64>,
}

#[utoipa::path(
    post,
    path = "/api/v0/tex/from-images",
    tag = "tex",
    request_body = ImagesToLatexRequest,
    responses(
        (status = 200, description = "LaTeX source as a downloadable file", content_type = "application/x-tex"),
        (status = 400, description = "Empty id list", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "No requested image belongs to the account", body = ErrorResponse),
        (status = 502, description = "Transcription failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, req),
    fields(account_id = ctx.account_id(), operation = "images_to_latex")
)]
pub async fn images_to_latex(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    ValidatedJson(req): ValidatedJson<ImagesToLatexRequest>,
) -> Result<Response<Body>, HttpAppError> {
    if req.image_ids.is_empty() {
        return Err(AppError::InvalidInput("No image IDs provided".to_string()).into());
    }

    // Only rows owned by the requester resolve; order is ascending by id.
    let resolved = state
        .images
        .resolve_for_account(ctx.account_id(), &req.image_ids)
        .await?;

    if resolved.is_empty() {
        return Err(AppError::NotFound("No matching images found".to_string()).into());
    }

    let found: HashSet<i64> = resolved.iter().map(|image| image.id).collect();
    let missing: Vec<i64> = req
        .image_ids
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(
            account_id = ctx.account_id(),
            missing_ids = ?missing,
            "Some requested images were not found or not owned"
        );
    }

    let mut pages = Vec::with_capacity(resolved.len());
    for image in &resolved {
        let data = state.storage.download(&image.file_path).await.map_err(|e| {
            AppError::Storage(format!("Failed to read image from storage: {}", e))
        })?;
        pages.push(PageSource {
            mime_type: guess_mime(&image.file_path)?,
            data,
        });
    }

    let latex = state.transcriber.generate(pages).await?;

    tracing::info!(
        page_count = resolved.len(),
        output_bytes = latex.len(),
        "Document assembled"
    );

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, LATEX_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", LATEX_FILENAME),
        );
    if !missing.is_empty() {
        let ids = missing
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        builder = builder.header(MISSING_IDS_HEADER, ids);
    }

    builder
        .body(Body::from(latex))
        .map_err(|e| HttpAppError(AppError::Internal(format!("Failed to build response: {}", e))))
}
