use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Uploaded image row. Owner and file path are immutable once set.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Image {
    pub id: i64,
    pub account_id: i64,
    pub batch_id: Option<i64>,
    pub file_path: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Image fields returned to clients (owner id stays internal).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageResponse {
    pub id: i64,
    pub file_path: String,
    pub original_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub batch_id: Option<i64>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Image> for ImageResponse {
    fn from(image: Image) -> Self {
        Self {
            id: image.id,
            file_path: image.file_path,
            original_filename: image.original_filename,
            content_type: image.content_type,
            file_size: image.file_size,
            batch_id: image.batch_id,
            uploaded_at: image.uploaded_at,
        }
    }
}

/// Named group of images uploaded together.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Batch {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// (id, storage key) pair resolved for document assembly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResolvedImage {
    pub id: i64,
    pub file_path: String,
}
