// src/server/routes.rs
// =============================================================================
// HTTP handlers - the thin boundary between requests and the modules that
// do the work.
//
// Error convention: handlers return Result<Json<T>, (StatusCode,
// Json<ErrorBody>)> and the helpers at the bottom build the error arm.
// Caller mistakes are 4xx with a message; upstream trouble is 502; our own
// trouble is 500. An empty crawl and an unreachable site are deliberately
// indistinguishable - both are a 404.
// =============================================================================

use std::collections::HashSet;

use axum::extract::{Host, Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::crawl;
use crate::download;

use super::state::AppState;

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    pub max_images: usize,
    /// Optional extension filter; the crawler's defaults apply when absent
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct ImagesResponse {
    pub message: String,
    pub images_link: Vec<String>,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default = "default_generate_count")]
    pub number: usize,
}

fn default_generate_count() -> usize {
    5
}

#[derive(Deserialize)]
pub struct DownloadRequest {
    pub urls: Vec<String>,
}

#[derive(Serialize)]
pub struct BundleResponse {
    pub token: String,
    pub bundle_url: String,
    pub file_count: usize,
}

#[derive(Serialize)]
pub struct VisitResponse {
    pub count: u64,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// GET / - liveness check
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "App is running".to_string(),
    })
}

// GET /visit - bumps the persisted counter and marks the browser
pub async fn visit(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let count = state.visits.increment().await.map_err(internal_error)?;

    let cookie = "visited=true; Max-Age=31536000; HttpOnly; SameSite=Lax; Secure";
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(VisitResponse { count }),
    ))
}

// POST /api/scrape - crawls a site for image URLs
pub async fn scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ImagesResponse>, ApiError> {
    if request.url.trim().is_empty() {
        return Err(bad_request("url must not be empty"));
    }
    if request.max_images == 0 {
        return Err(bad_request("max_images must be at least 1"));
    }

    if state.config.respect_robots && !crawl::is_crawl_allowed(&state.http, &request.url).await {
        return Err(forbidden("crawling is disallowed by the site's robots.txt"));
    }

    let allowed: Option<HashSet<String>> = request
        .extensions
        .map(|extensions| extensions.into_iter().collect());

    let images = crawl::crawl_images(&request.url, request.max_images, allowed)
        .await
        .map_err(|e| bad_request(e.to_string()))?;

    if images.is_empty() {
        return Err(not_found("No images found at the provided URL."));
    }

    info!(url = %request.url, found = images.len(), "scrape completed");
    Ok(Json(ImagesResponse {
        message: format!(
            "Scraping completed for {}. Found {} images.",
            request.url,
            images.len()
        ),
        images_link: images,
    }))
}

// POST /api/generate-image - fans out prompt-to-image generation
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<ImagesResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(bad_request("prompt must not be empty"));
    }
    if request.number == 0 {
        return Err(bad_request("number must be at least 1"));
    }

    let generator = state
        .generator
        .as_ref()
        .ok_or_else(|| bad_request("image generation is not configured (missing API key)"))?;

    let outcomes = generator.generate_batch(&request.prompt, request.number).await;

    let images: Vec<String> = outcomes.into_iter().filter_map(Result::ok).collect();
    if images.is_empty() {
        return Err(bad_gateway("image generation failed for every attempt"));
    }

    Ok(Json(ImagesResponse {
        message: format!(
            "{} images generated for prompt: {}",
            images.len(),
            request.prompt
        ),
        images_link: images,
    }))
}

// POST /api/download - saves remote images locally, returns public URLs
pub async fn download(
    State(state): State<AppState>,
    Host(host): Host,
    Json(request): Json<DownloadRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    if request.urls.is_empty() {
        return Err(bad_request("No image URLs provided"));
    }

    let saved = download::download_all(&state.http, request.urls, &state.config.temp_dir).await;

    let base = public_base(&state, &host);
    let links = saved
        .iter()
        .filter_map(|name| download::public_url(&base, "temp", name))
        .collect();

    Ok(Json(links))
}

// POST /api/bundle - downloads a batch into a staging folder and zips it
pub async fn bundle(
    State(state): State<AppState>,
    Host(host): Host,
    Json(request): Json<DownloadRequest>,
) -> Result<Json<BundleResponse>, ApiError> {
    if request.urls.is_empty() {
        return Err(bad_request("No image URLs provided"));
    }

    let token = state.sessions.create();
    let staging = state.config.temp_dir.join(&token);
    tokio::fs::create_dir_all(&staging)
        .await
        .map_err(|e| internal_error(e.into()))?;

    let saved = download::download_all(&state.http, request.urls, &staging).await;
    if saved.is_empty() {
        // Nothing to bundle; roll the session back
        let _ = tokio::fs::remove_dir_all(&staging).await;
        state.sessions.invalidate(&token);
        return Err(not_found("None of the provided URLs could be downloaded."));
    }

    let zip_path = state.config.zip_dir.join(format!("{token}.zip"));
    let zip_target = zip_path.clone();
    let staging_dir = staging.clone();
    tokio::task::spawn_blocking(move || download::zip_directory(&staging_dir, &zip_target))
        .await
        .map_err(|e| internal_error(e.into()))?
        .map_err(internal_error)?;

    let base = public_base(&state, &host);
    let bundle_url = download::public_url(&base, "zips", &format!("{token}.zip"))
        .ok_or_else(|| internal_error(anyhow::anyhow!("invalid public base URL '{base}'")))?;

    info!(token = %token, files = saved.len(), "bundle created");
    Ok(Json(BundleResponse {
        token,
        bundle_url,
        file_count: saved.len(),
    }))
}

// DELETE /api/bundle/{token} - removes a bundle before its TTL runs out
pub async fn delete_bundle(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let session_id = state
        .sessions
        .validate(&token)
        .ok_or_else(|| not_found("unknown bundle token"))?;

    let zip_path = state.config.zip_dir.join(format!("{session_id}.zip"));
    let staging = state.config.temp_dir.join(&session_id);

    // The janitor may have beaten us to either path; that is fine
    if let Err(e) = tokio::fs::remove_file(&zip_path).await {
        warn!(path = %zip_path.display(), error = %e, "bundle zip already gone");
    }
    if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
        warn!(path = %staging.display(), error = %e, "bundle staging already gone");
    }

    state.sessions.invalidate(&token);

    Ok(Json(MessageResponse {
        message: format!("Bundle {token} removed"),
    }))
}

// Prefer the configured public base URL; otherwise trust the Host header
// the client connected with
fn public_base(state: &AppState, host: &str) -> String {
    match &state.config.public_base_url {
        Some(base) => base.clone(),
        None => format!("http://{host}"),
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

fn forbidden(message: impl Into<String>) -> ApiError {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

fn not_found(message: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

fn bad_gateway(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

fn internal_error(err: anyhow::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            message: err.to_string(),
        }),
    )
}
