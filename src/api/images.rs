//! Image serving endpoint
//!
//! GET {url_prefix}/{name} - serve a locally stored artifact

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::warn;

use super::AppState;
use crate::artifacts::{is_artifact_name, ARTIFACT_CONTENT_TYPE};

/// Build the images router
pub fn router() -> Router<AppState> {
    Router::new().route("/{name}", get(get_image))
}

/// Serve an image by artifact name
async fn get_image(Path(name): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    let Some(public_dir) = state.public_dir.as_ref() else {
        return (StatusCode::NOT_FOUND, "Image not found").into_response();
    };
    // Only `<uuid>.png` names map to files
    if !is_artifact_name(&name) {
        return (StatusCode::NOT_FOUND, "Image not found").into_response();
    }

    match tokio::fs::read(public_dir.join(&name)).await {
        Ok(data) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, ARTIFACT_CONTENT_TYPE),
                (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
            ],
            data,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Image not found").into_response()
        }
        Err(e) => {
            warn!("Failed to read image {}: {}", name, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error reading image").into_response()
        }
    }
}
