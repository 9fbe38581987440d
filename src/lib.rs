use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod push;
pub mod state;
pub mod webhook;

use api::create_api_router;
use state::AppState;
use std::path::Path;

/// Assemble the full application router: API + webhook endpoints, static PWA
/// assets with an `index.html` fallback, request tracing and permissive CORS
/// (the client app is served from arbitrary origins during development).
pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    let static_dir = app_state.config.static_dir.clone();
    let index = Path::new(&static_dir).join("index.html");
    let static_service = ServeDir::new(&static_dir).not_found_service(ServeFile::new(index));

    create_api_router()
        .with_state(app_state)
        .fallback_service(static_service)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
