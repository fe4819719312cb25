//! Application state.
//!
//! Everything a handler needs is constructed once in setup and injected
//! here; nothing reaches for process-wide state at request time.

use std::sync::Arc;

use notatex_core::Config;
use notatex_db::{AccountRepository, ImageRepository, TokenRepository};
use notatex_storage::Storage;
use sqlx::PgPool;

use crate::services::transcription::Transcriber;

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub accounts: AccountRepository,
    pub tokens: TokenRepository,
    pub images: ImageRepository,
    pub storage: Arc<dyn Storage>,
    pub transcriber: Arc<dyn Transcriber>,
}
