use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account row as stored. Carries credential material and deliberately does
/// not implement `Serialize`; responses use [AccountInfo].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub password_salt: String,
    pub created_at: DateTime<Utc>,
}

/// Public account fields, safe for client responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct AccountInfo {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountInfo {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            created_at: account.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_info_never_exposes_credentials() {
        let account = Account {
            id: 1,
            username: "alice".to_string(),
            email: Some("a@example.com".to_string()),
            password_hash: "$2b$12$secret".to_string(),
            password_salt: "salt".to_string(),
            created_at: Utc::now(),
        };

        let info = AccountInfo::from(account);
        let json = serde_json::to_value(&info).expect("serialize");

        assert_eq!(json.get("username").and_then(|v| v.as_str()), Some("alice"));
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_salt").is_none());
    }
}
