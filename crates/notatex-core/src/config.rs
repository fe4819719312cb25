//! Configuration module
//!
//! Configuration is loaded from environment variables (optionally via a
//! `.env` file loaded by the binary). Every component receives its settings
//! through this struct; nothing reads the environment at request time.

use std::env;

use anyhow::{bail, Context};

const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;
const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_BATCH_FILES: usize = 20;
const DEFAULT_STORAGE_PATH: &str = "uploads";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Root directory for uploaded image files
    pub storage_path: String,
    /// Lifetime of an issued bearer token
    pub token_ttl_minutes: i64,
    pub max_file_size_bytes: usize,
    pub max_batch_files: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    /// Gemini API key; transcription requests fail until this is set
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let config = Config {
            server_port: env_parse("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS)?,
            cors_origins: env_list("CORS_ORIGINS", &["*"]),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            storage_path: env::var("STORAGE_PATH")
                .unwrap_or_else(|_| DEFAULT_STORAGE_PATH.to_string()),
            token_ttl_minutes: env_parse("TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?,
            max_file_size_bytes: env_parse("MAX_FILE_SIZE_BYTES", DEFAULT_MAX_FILE_SIZE_BYTES)?,
            max_batch_files: env_parse("MAX_BATCH_FILES", DEFAULT_MAX_BATCH_FILES)?,
            allowed_extensions: env_list("ALLOWED_EXTENSIONS", &["jpg", "jpeg", "png", "webp"]),
            allowed_content_types: env_list(
                "ALLOWED_CONTENT_TYPES",
                &["image/jpeg", "image/png", "image/webp"],
            ),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.is_empty() {
            bail!("DATABASE_URL must not be empty");
        }
        if self.db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        if self.token_ttl_minutes <= 0 {
            bail!("TOKEN_TTL_MINUTES must be positive");
        }
        if self.max_file_size_bytes == 0 {
            bail!("MAX_FILE_SIZE_BYTES must be positive");
        }
        if self.max_batch_files == 0 {
            bail!("MAX_BATCH_FILES must be at least 1");
        }
        if self.allowed_extensions.is_empty() {
            bail!("ALLOWED_EXTENSIONS must not be empty");
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Upper bound for a whole request body (one batch of maximum-size files)
    pub fn max_request_body_bytes(&self) -> usize {
        self.max_file_size_bytes.saturating_mul(self.max_batch_files)
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}", key)),
        Err(_) => Ok(default),
    }
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| default.iter().map(|s| s.to_string()).collect())
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
            max_file_size_bytes: 10 * 1024 * 1024,
            max_batch_files: 20,
            allowed_extensions: vec!["png".to_string()],
            allowed_content_types: vec!["image/png".to_string()],
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = test_config();
        config.token_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
        config.environment = "prod".to_string();
        assert!(config.is_production());
    }

    #[test]
    fn test_max_request_body_bytes() {
        let config = test_config();
        assert_eq!(
            config.max_request_body_bytes(),
            config.max_file_size_bytes * config.max_batch_files
        );
    }
}
