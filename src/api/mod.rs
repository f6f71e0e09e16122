//! HTTP API module - chat, render and image endpoints

mod chat;
mod images;
mod render;

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::agent::Agent;
use crate::generator::ContentGenerator;

pub use chat::ChatRequest;
pub use render::{RenderCodeRequest, RenderDiagramRequest, RenderResponse};

/// Body of every failed request; details stay in the server log
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Agent,
    pub generator: ContentGenerator,
    /// Served at `image_prefix` when the local store is active
    pub public_dir: Option<PathBuf>,
    /// URL path the local store puts in front of artifact names
    pub image_prefix: String,
    /// Deadline for chat and render requests
    pub request_timeout: Duration,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .merge(chat::router())
        .merge(render::router());

    let app = match image_mount(&state.image_prefix) {
        Some("") => app.merge(images::router()),
        Some(mount) => app.nest(mount, images::router()),
        None => app,
    };

    app.with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Path the image route is mounted at, if the prefix is a local path
fn image_mount(prefix: &str) -> Option<&str> {
    let mount = prefix.trim_end_matches('/');
    if prefix.starts_with('/') {
        Some(mount)
    } else {
        None
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Fixed 500 response
pub(crate) fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(GENERIC_ERROR_MESSAGE)),
    )
        .into_response()
}

/// Fixed 500 response for a request that ran past its deadline
pub(crate) fn deadline_exceeded(what: &str, timeout: Duration) -> Response {
    error!("{} exceeded the {:?} request deadline", what, timeout);
    internal_error()
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "codeshot",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        storage: state.generator.store().backend(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    storage: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mount() {
        assert_eq!(image_mount("/generated-images"), Some("/generated-images"));
        assert_eq!(image_mount("/static/shots/"), Some("/static/shots"));
        assert_eq!(image_mount("/"), Some(""));
        assert_eq!(image_mount("https://cdn.example.com/images"), None);
    }
}
