//! Repository implementations for database operations.

pub mod account;
pub mod image;
pub mod token;

pub use account::AccountRepository;
pub use image::ImageRepository;
pub use token::TokenRepository;

use notatex_core::AppError;

/// Map a unique-constraint violation to `Duplicate`, anything else to
/// `Database`. Duplicates are detected from the insert itself, never via a
/// pre-check, which closes the check-then-insert race.
pub(crate) fn duplicate_or_db(err: sqlx::Error, message: &str) -> AppError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => AppError::Duplicate(message.to_string()),
        _ => AppError::Database(err),
    }
}
