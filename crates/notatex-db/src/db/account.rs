use notatex_core::models::{Account, AccountInfo};
use notatex_core::AppError;
use sqlx::{PgPool, Postgres};

use super::duplicate_or_db;

/// Repository for account records
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new account. A unique-constraint violation on username or
    /// email maps to `AppError::Duplicate`.
    #[tracing::instrument(
        skip(self, password_hash, password_salt),
        fields(db.table = "accounts", db.operation = "insert")
    )]
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        password_salt: &str,
        email: Option<&str>,
    ) -> Result<Account, AppError> {
        sqlx::query_as::<Postgres, Account>(
            r#"
            INSERT INTO accounts (username, password_hash, password_salt, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, password_salt, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(password_salt)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_or_db(e, "Username or email already exists"))
    }

    /// Fetch the full account row (including credential material) for
    /// password verification. Callers must never serialize the result.
    #[tracing::instrument(skip(self), fields(db.table = "accounts", db.operation = "select"))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<Postgres, Account>(
            "SELECT id, username, email, password_hash, password_salt, created_at \
             FROM accounts WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    #[tracing::instrument(skip(self), fields(db.table = "accounts", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: i64) -> Result<Option<AccountInfo>, AppError> {
        let account = sqlx::query_as::<Postgres, AccountInfo>(
            "SELECT id, username, email, created_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Update an account's email. Email is the only mutable account field.
    #[tracing::instrument(skip(self), fields(db.table = "accounts", db.operation = "update", db.record_id = %id))]
    pub async fn update_email(&self, id: i64, email: &str) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("UPDATE accounts SET email = $1 WHERE id = $2")
            .bind(email)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| duplicate_or_db(e, "Email already in use"))?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Delete an account. Tokens, batches, and images follow via FK cascade.
    #[tracing::instrument(skip(self), fields(db.table = "accounts", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let rows_affected = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
