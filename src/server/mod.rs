// src/server/mod.rs
// =============================================================================
// This module is the HTTP facade.
//
// Submodules:
// - state: shared AppState (outbound client, config, counter, token store)
// - routes: the request handlers
//
// The router maps every endpoint onto the handlers, mounts the two storage
// directories as static file trees, and applies CORS.
// =============================================================================

mod routes;
mod state;

pub use state::AppState;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

// Builds the application router over the shared state
pub fn router(state: AppState) -> Router {
    let cors = build_cors(&state.config.allow_origins);

    Router::new()
        .route("/", get(routes::root))
        .route("/visit", get(routes::visit))
        .route("/api/scrape", post(routes::scrape))
        .route("/api/generate-image", post(routes::generate))
        .route("/api/download", post(routes::download))
        .route("/api/bundle", post(routes::bundle))
        .route("/api/bundle/:token", delete(routes::delete_bundle))
        // Stored files are served straight off disk
        .nest_service("/temp", ServeDir::new(&state.config.temp_dir))
        .nest_service("/zips", ServeDir::new(&state.config.zip_dir))
        .layer(cors)
        .with_state(state)
}

// An empty origin list means any origin may call us; otherwise only the
// configured ones
fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
