use chrono::{DateTime, Utc};
use notatex_core::models::{AccessToken, AccountInfo};
use notatex_core::AppError;
use sqlx::{PgPool, Postgres};

/// Repository for opaque bearer tokens.
///
/// Rows hold SHA-256 hashes of the tokens. Expiry is lazy: an expired row is
/// deleted the first time verification observes it; there is no background
/// sweep beyond the [delete_expired](TokenRepository::delete_expired) helper.
#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct TokenAccountRow {
    token_id: i64,
    expires_at: DateTime<Utc>,
    account_id: i64,
    username: String,
    email: Option<String>,
    account_created_at: DateTime<Utc>,
}

impl TokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly issued token hash. Accounts may hold any number of
    /// live tokens.
    #[tracing::instrument(
        skip(self, token_hash),
        fields(db.table = "access_tokens", db.operation = "insert")
    )]
    pub async fn insert(
        &self,
        account_id: i64,
        token_hash: &str,
        token_prefix: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<AccessToken, AppError> {
        let token = sqlx::query_as::<Postgres, AccessToken>(
            r#"
            INSERT INTO access_tokens (account_id, token_hash, token_prefix, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, account_id, token_hash, token_prefix, expires_at, created_at
            "#,
        )
        .bind(account_id)
        .bind(token_hash)
        .bind(token_prefix)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(token)
    }

    /// Resolve a token hash to its account's public fields.
    ///
    /// Absent hash: `None`. Present but expired: the row is deleted (lazy
    /// expiry) and `None` is returned, so a second verification of the same
    /// token also fails. The password hash is never part of this path.
    #[tracing::instrument(
        skip(self, token_hash),
        fields(db.table = "access_tokens", db.operation = "select")
    )]
    pub async fn verify(&self, token_hash: &str) -> Result<Option<AccountInfo>, AppError> {
        let row = sqlx::query_as::<Postgres, TokenAccountRow>(
            r#"
            SELECT t.id AS token_id, t.expires_at,
                   a.id AS account_id, a.username, a.email,
                   a.created_at AS account_created_at
            FROM access_tokens t
            JOIN accounts a ON a.id = t.account_id
            WHERE t.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if Utc::now() >= row.expires_at {
            sqlx::query("DELETE FROM access_tokens WHERE id = $1")
                .bind(row.token_id)
                .execute(&self.pool)
                .await?;
            tracing::debug!(token_id = row.token_id, "Expired token observed and removed");
            return Ok(None);
        }

        Ok(Some(AccountInfo {
            id: row.account_id,
            username: row.username,
            email: row.email,
            created_at: row.account_created_at,
        }))
    }

    /// Delete the row for a presented token (logout).
    #[tracing::instrument(
        skip(self, token_hash),
        fields(db.table = "access_tokens", db.operation = "delete")
    )]
    pub async fn revoke(&self, token_hash: &str) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM access_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Bulk-delete every expired row. Hygiene helper; correctness does not
    /// depend on it because verification removes expired rows on observation.
    #[tracing::instrument(skip(self), fields(db.table = "access_tokens", db.operation = "delete"))]
    pub async fn delete_expired(&self) -> Result<u64, AppError> {
        let rows_affected = sqlx::query("DELETE FROM access_tokens WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected > 0 {
            tracing::info!(count = rows_affected, "Removed expired tokens");
        }

        Ok(rows_affected)
    }
}
