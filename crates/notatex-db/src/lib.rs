//! Database repositories for the data access layer
//!
//! Each repository owns a clone of the shared `PgPool` and is responsible for
//! one domain entity. Every query on owned entities is account-scoped: the
//! owner column leads each WHERE clause, so no operation can cross accounts.

pub mod db;

pub use db::{AccountRepository, ImageRepository, TokenRepository};
