//! Basic service routes.

use axum::{response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "API is running" }))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
