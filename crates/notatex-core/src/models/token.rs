use chrono::{DateTime, Utc};

/// Access token row. Holds the SHA-256 hash of the opaque token; the raw
/// token is returned to the client exactly once, at login.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccessToken {
    pub id: i64,
    pub account_id: i64,
    pub token_hash: String,
    pub token_prefix: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
