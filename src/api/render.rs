//! Direct render endpoints
//!
//! POST /api/render/code    - render one snippet
//! POST /api/render/diagram - render one diagram

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::{deadline_exceeded, internal_error, AppState, ErrorResponse};
use crate::artifacts::ArtifactReference;
use crate::generator::GenerateError;

/// Build render router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/render/code", post(render_code))
        .route("/api/render/diagram", post(render_diagram))
}

#[derive(Debug, Deserialize)]
pub struct RenderCodeRequest {
    pub source: String,
    #[serde(default)]
    pub preset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenderDiagramRequest {
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderResponse {
    pub reference: ArtifactReference,
}

async fn render_code(
    State(state): State<AppState>,
    Json(req): Json<RenderCodeRequest>,
) -> Response {
    if req.source.trim().is_empty() {
        return empty_source();
    }
    let deadline = state.request_timeout;
    let render = state
        .generator
        .generate_code_image(&req.source, req.preset.as_deref());
    match tokio::time::timeout(deadline, render).await {
        Ok(result) => respond(result),
        Err(_) => deadline_exceeded("Code render", deadline),
    }
}

async fn render_diagram(
    State(state): State<AppState>,
    Json(req): Json<RenderDiagramRequest>,
) -> Response {
    if req.source.trim().is_empty() {
        return empty_source();
    }
    let deadline = state.request_timeout;
    let render = state.generator.generate_diagram_image(&req.source);
    match tokio::time::timeout(deadline, render).await {
        Ok(result) => respond(result),
        Err(_) => deadline_exceeded("Diagram render", deadline),
    }
}

fn respond(result: Result<ArtifactReference, GenerateError>) -> Response {
    match result {
        Ok(reference) => (StatusCode::OK, Json(RenderResponse { reference })).into_response(),
        Err(e) => {
            error!("{}", e);
            internal_error()
        }
    }
}

fn empty_source() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("source is required")),
    )
        .into_response()
}
