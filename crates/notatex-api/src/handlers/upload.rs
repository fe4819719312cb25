//! Single and batch image upload handlers.
//!
//! Files are written to storage first, then recorded in the database. A
//! failed insert triggers a compensating storage delete so no orphan file
//! survives. A batch and all of its image rows commit in one transaction.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use notatex_core::{AppError, Config};
use notatex_storage::{image_key, Storage};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::models::AccountContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BatchUploadQuery {
    /// Optional name; when present a batch row groups the uploaded images
    pub batch_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUploadResponse {
    pub image_id: i64,
    pub path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchUploadResponse {
    pub batch_id: Option<i64>,
    pub items: Vec<ImageUploadResponse>,
}

/// One multipart file, validated and not yet persisted.
struct PendingUpload {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

/// A file already written to storage, awaiting its metadata row.
struct StoredUpload {
    key: String,
    filename: String,
    content_type: String,
    size: usize,
}

#[utoipa::path(
    post,
    path = "/api/v0/images",
    tag = "images",
    responses(
        (status = 201, description = "Image uploaded", body = ImageUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(account_id = ctx.account_id(), operation = "upload_image")
)]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut pending: Option<PendingUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        pending = Some(read_field(&state.config, field).await?);
        break;
    }

    let upload = pending
        .ok_or_else(|| AppError::InvalidInput("Missing 'file' field".to_string()))?;

    let key = image_key(ctx.account_id(), &upload.filename);
    let size = upload.data.len();
    state.storage.upload(&key, upload.data).await?;

    let image = match state
        .images
        .create_image(
            &state.pool,
            ctx.account_id(),
            None,
            &key,
            &upload.filename,
            &upload.content_type,
            size as i64,
        )
        .await
    {
        Ok(image) => image,
        Err(e) => {
            cleanup_stored(state.storage.clone(), vec![key]);
            return Err(e.into());
        }
    };

    tracing::info!(image_id = image.id, size_bytes = size, "Image uploaded");

    Ok((
        StatusCode::CREATED,
        Json(ImageUploadResponse {
            image_id: image.id,
            path: image.file_path,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v0/images/batch",
    tag = "images",
    params(BatchUploadQuery),
    responses(
        (status = 201, description = "Batch uploaded", body = BatchUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(account_id = ctx.account_id(), operation = "upload_batch")
)]
pub async fn upload_batch(
    State(state): State<Arc<AppState>>,
    ctx: AccountContext,
    Query(query): Query<BatchUploadQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let batch_name = query
        .batch_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let mut uploads: Vec<PendingUpload> = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("files") {
            continue;
        }
        if uploads.len() >= state.config.max_batch_files {
            return Err(AppError::InvalidInput(format!(
                "Too many files in batch: max {}",
                state.config.max_batch_files
            ))
            .into());
        }
        uploads.push(read_field(&state.config, field).await?);
    }

    if uploads.is_empty() {
        return Err(AppError::InvalidInput("No files provided".to_string()).into());
    }

    // Write files in the order received; metadata rows follow the same order.
    let mut stored: Vec<StoredUpload> = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let key = image_key(ctx.account_id(), &upload.filename);
        let size = upload.data.len();
        if let Err(e) = state.storage.upload(&key, upload.data).await {
            cleanup_stored(
                state.storage.clone(),
                stored.into_iter().map(|s| s.key).collect(),
            );
            return Err(e.into());
        }
        stored.push(StoredUpload {
            key,
            filename: upload.filename,
            content_type: upload.content_type,
            size,
        });
    }

    let (batch_id, items) = match record_batch(&state, ctx.account_id(), batch_name, &stored).await
    {
        Ok(result) => result,
        Err(e) => {
            cleanup_stored(
                state.storage.clone(),
                stored.into_iter().map(|s| s.key).collect(),
            );
            return Err(e.into());
        }
    };

    tracing::info!(
        batch_id = ?batch_id,
        file_count = items.len(),
        "Batch uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(BatchUploadResponse { batch_id, items }),
    ))
}

/// Record an optional batch row plus one image row per stored file inside a
/// single transaction. The transaction rolls back on drop if any insert
/// fails.
async fn record_batch(
    state: &AppState,
    account_id: i64,
    batch_name: Option<&str>,
    stored: &[StoredUpload],
) -> Result<(Option<i64>, Vec<ImageUploadResponse>), AppError> {
    let mut tx = state.pool.begin().await?;

    let batch_id = match batch_name {
        Some(name) => Some(
            state
                .images
                .create_batch(&mut *tx, account_id, name)
                .await?
                .id,
        ),
        None => None,
    };

    let mut items = Vec::with_capacity(stored.len());
    for upload in stored {
        let image = state
            .images
            .create_image(
                &mut *tx,
                account_id,
                batch_id,
                &upload.key,
                &upload.filename,
                &upload.content_type,
                upload.size as i64,
            )
            .await?;
        items.push(ImageUploadResponse {
            image_id: image.id,
            path: image.file_path,
        });
    }

    tx.commit().await?;

    Ok((batch_id, items))
}

/// Read and validate one multipart file field.
async fn read_field(
    config: &Config,
    field: axum::extract::multipart::Field<'_>,
) -> Result<PendingUpload, AppError> {
    let filename = sanitize_filename(field.file_name())?;
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field.bytes().await.map_err(multipart_error)?.to_vec();

    validate_upload(config, &filename, &content_type, data.len())?;

    Ok(PendingUpload {
        filename,
        content_type,
        data,
    })
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::InvalidInput(format!("Invalid multipart body: {}", err))
}

/// Keep only the final path component of a client-supplied filename.
fn sanitize_filename(raw: Option<&str>) -> Result<String, AppError> {
    let name = raw.unwrap_or("").trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Missing filename".to_string()));
    }

    let name = name.rsplit(['/', '\\']).next().unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::InvalidInput("Invalid filename".to_string()));
    }

    Ok(name.to_string())
}

fn validate_upload(
    config: &Config,
    filename: &str,
    content_type: &str,
    size: usize,
) -> Result<(), AppError> {
    if size == 0 {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }
    if size > config.max_file_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "{} bytes exceeds max {} bytes",
            size, config.max_file_size_bytes
        )));
    }

    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    if !config
        .allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    {
        return Err(AppError::InvalidInput(format!(
            "Invalid extension '{}', allowed: {:?}",
            extension, config.allowed_extensions
        )));
    }

    if !config
        .allowed_content_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type '{}', allowed: {:?}",
            content_type, config.allowed_content_types
        )));
    }

    Ok(())
}

/// Delete files whose metadata insert failed, off the request path.
fn cleanup_stored(storage: Arc<dyn Storage>, keys: Vec<String>) {
    tokio::spawn(async move {
        for key in keys {
            if let Err(cleanup_err) = storage.delete(&key).await {
                tracing::warn!(
                    error = %cleanup_err,
                    storage_key = %key,
                    "Failed to clean up storage file after DB error"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_port: 8000,
            database_url: "postgres://localhost/notatex".to_string(),
            db_max_connections: 10,
            db_timeout_seconds: 30,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            storage_path: "uploads".to_string(),
            token_ttl_minutes: 60,
            max_file_size_bytes: 1024,
            max_batch_files: 20,
            allowed_extensions: vec!["jpg".to_string(), "png".to_string()],
            allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
        }
    }

    #[test]
    fn test_sanitize_filename_strips_path_components() {
        assert_eq!(sanitize_filename(Some("note.png")).unwrap(), "note.png");
        assert_eq!(
            sanitize_filename(Some("../../etc/passwd.png")).unwrap(),
            "passwd.png"
        );
        assert_eq!(
            sanitize_filename(Some("C:\\temp\\note.png")).unwrap(),
            "note.png"
        );
    }

    #[test]
    fn test_sanitize_filename_rejects_empty_and_dots() {
        assert!(sanitize_filename(None).is_err());
        assert!(sanitize_filename(Some("")).is_err());
        assert!(sanitize_filename(Some("   ")).is_err());
        assert!(sanitize_filename(Some("..")).is_err());
        assert!(sanitize_filename(Some("dir/")).is_err());
    }

    #[test]
    fn test_validate_upload_accepts_allowed_file() {
        let config = test_config();
        assert!(validate_upload(&config, "note.png", "image/png", 100).is_ok());
        assert!(validate_upload(&config, "note.PNG", "IMAGE/PNG", 100).is_ok());
    }

    #[test]
    fn test_validate_upload_rejects_empty_file() {
        let config = test_config();
        let result = validate_upload(&config, "note.png", "image/png", 0);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_upload_rejects_oversized_file() {
        let config = test_config();
        let result = validate_upload(&config, "note.png", "image/png", 2048);
        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
    }

    #[test]
    fn test_validate_upload_rejects_bad_extension_and_content_type() {
        let config = test_config();
        assert!(matches!(
            validate_upload(&config, "note.exe", "image/png", 100),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_upload(&config, "note.png", "text/html", 100),
            Err(AppError::InvalidInput(_))
        ));
    }
}
