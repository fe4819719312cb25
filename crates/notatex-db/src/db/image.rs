use notatex_core::models::{Batch, Image, ResolvedImage};
use notatex_core::AppError;
use sqlx::{PgPool, Postgres};

/// Repository for images and their optional batches.
///
/// Reads are always scoped by the owning account. Inserts are generic over
/// the executor so a batch and its images can be recorded inside one
/// transaction.
#[derive(Clone)]
pub struct ImageRepository {
    pool: PgPool,
}

impl ImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a batch row. Ownership of any image that later references the
    /// batch is established by the caller within one authenticated request.
    #[tracing::instrument(
        skip(self, executor),
        fields(db.table = "batches", db.operation = "insert")
    )]
    pub async fn create_batch<'e, E>(
        &self,
        executor: E,
        account_id: i64,
        name: &str,
    ) -> Result<Batch, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let batch = sqlx::query_as::<Postgres, Batch>(
            r#"
            INSERT INTO batches (account_id, name)
            VALUES ($1, $2)
            RETURNING id, account_id, name, created_at
            "#,
        )
        .bind(account_id)
        .bind(name)
        .fetch_one(executor)
        .await?;

        Ok(batch)
    }

    /// Insert an image row. The caller has already written the file bytes
    /// and, when `batch_id` is set, created that batch for the same account.
    #[tracing::instrument(
        skip(self, executor, file_path, original_filename, content_type),
        fields(db.table = "images", db.operation = "insert")
    )]
    #[allow(clippy::too_many_arguments)]
    pub async fn create_image<'e, E>(
        &self,
        executor: E,
        account_id: i64,
        batch_id: Option<i64>,
        file_path: &str,
        original_filename: &str,
        content_type: &str,
        file_size: i64,
    ) -> Result<Image, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let image = sqlx::query_as::<Postgres, Image>(
            r#"
            INSERT INTO images (account_id, batch_id, file_path, original_filename, content_type, file_size)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, account_id, batch_id, file_path, original_filename, content_type, file_size, uploaded_at
            "#,
        )
        .bind(account_id)
        .bind(batch_id)
        .bind(file_path)
        .bind(original_filename)
        .bind(content_type)
        .bind(file_size)
        .fetch_one(executor)
        .await?;

        Ok(image)
    }

    /// List an account's images, optionally filtered by batch, newest first.
    /// Ties on `uploaded_at` are broken by id so pagination is deterministic.
    /// Callers validate `limit`/`offset` bounds before reaching this method.
    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "select"))]
    pub async fn list(
        &self,
        account_id: i64,
        batch_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Image>, AppError> {
        let images = match batch_id {
            Some(batch_id) => {
                sqlx::query_as::<Postgres, Image>(
                    "SELECT id, account_id, batch_id, file_path, original_filename, content_type, file_size, uploaded_at \
                     FROM images \
                     WHERE account_id = $1 AND batch_id = $2 \
                     ORDER BY uploaded_at DESC, id DESC \
                     LIMIT $3 OFFSET $4",
                )
                .bind(account_id)
                .bind(batch_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<Postgres, Image>(
                    "SELECT id, account_id, batch_id, file_path, original_filename, content_type, file_size, uploaded_at \
                     FROM images \
                     WHERE account_id = $1 \
                     ORDER BY uploaded_at DESC, id DESC \
                     LIMIT $2 OFFSET $3",
                )
                .bind(account_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(images)
    }

    /// Resolve requested ids to (id, storage key) pairs for the given owner.
    ///
    /// Result order is ascending by id regardless of request order; ids that
    /// do not exist or belong to another account are omitted, not errors.
    #[tracing::instrument(skip(self, ids), fields(db.table = "images", db.operation = "select"))]
    pub async fn resolve_for_account(
        &self,
        account_id: i64,
        ids: &[i64],
    ) -> Result<Vec<ResolvedImage>, AppError> {
        let resolved = sqlx::query_as::<Postgres, ResolvedImage>(
            "SELECT id, file_path FROM images \
             WHERE account_id = $1 AND id = ANY($2) \
             ORDER BY id ASC",
        )
        .bind(account_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(resolved)
    }
}
