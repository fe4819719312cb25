//! Route configuration and setup.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, patch, post},
    Json, Router,
};
use notatex_core::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::auth::middleware::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        tokens: state.tokens.clone(),
    });

    let public_routes = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/v0/auth/register", post(handlers::auth::register))
        .route("/api/v0/auth/login", post(handlers::auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/v0/auth/logout", post(handlers::auth::logout))
        .route("/api/v0/auth/me", get(handlers::auth::me))
        .route("/api/v0/auth/email", patch(handlers::auth::update_email))
        .route(
            "/api/v0/auth/account",
            delete(handlers::auth::delete_account),
        )
        .route(
            "/api/v0/images",
            post(handlers::upload::upload_image).get(handlers::images::list_images),
        )
        .route("/api/v0/images/batch", post(handlers::upload::upload_batch))
        .route("/api/v0/tex/from-images", post(handlers::tex::images_to_latex))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    let app = public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(config.max_request_body_bytes()))
        .layer(RequestBodyLimitLayer::new(config.max_request_body_bytes()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin: {}", origin))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Ok(cors)
}
