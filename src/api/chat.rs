//! Chat endpoint
//!
//! POST /api/chat - plan and render images for one user message

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info};

use super::{deadline_exceeded, internal_error, AppState, ErrorResponse};

/// Build chat router
pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("message is required")),
        )
            .into_response();
    }

    let deadline = state.request_timeout;
    let Ok(result) = tokio::time::timeout(deadline, state.agent.run(&req.message)).await else {
        return deadline_exceeded("Chat request", deadline);
    };

    match result {
        Ok(reply) => {
            info!(
                "Chat reply with {} images and {} diagrams",
                reply.images.len(),
                reply.diagrams.len()
            );
            (StatusCode::OK, Json(reply)).into_response()
        }
        Err(e) => {
            error!("Chat request failed: {}", e);
            internal_error()
        }
    }
}
