//! HTTP API v1: chat sessions over JSON.
//!
//! Endpoints:
//!
//! - `GET    /v1/ui`                   - UI strings
//! - `POST   /v1/sessions`             - Create a session
//! - `GET    /v1/sessions/{id}`        - Render a session
//! - `DELETE /v1/sessions/{id}`        - Destroy a session
//! - `POST   /v1/sessions/{id}/messages` - Ask a question
//! - `POST   /v1/sessions/{id}/reset`  - Clear history back to the greeting

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tablechat_assistant::AssistantError;
use tablechat_config::UiConfig;
use tablechat_session::{SessionHandle, SessionId};

use crate::SharedState;
use crate::view::{ErrorView, SessionView, render};

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/ui", get(ui_handler))
        .route("/sessions", post(create_session_handler))
        .route(
            "/sessions/{id}",
            get(get_session_handler).delete(delete_session_handler),
        )
        .route("/sessions/{id}/messages", post(message_handler))
        .route("/sessions/{id}/reset", post(reset_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler failures. Generation failures still carry the rendered session.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Generation(SessionView),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Session '{id}' not found"),
                }),
            )
                .into_response(),
            Self::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            Self::Generation(view) => (StatusCode::BAD_GATEWAY, Json(view)).into_response(),
        }
    }
}

async fn find(state: &SharedState, id: &str) -> Result<SessionHandle, ApiError> {
    state
        .sessions
        .get(&SessionId::from(id))
        .await
        .ok_or_else(|| ApiError::NotFound(id.to_string()))
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn ui_handler(State(state): State<SharedState>) -> Json<UiConfig> {
    Json(state.ui.clone())
}

async fn create_session_handler(
    State(state): State<SharedState>,
) -> (StatusCode, Json<SessionView>) {
    let (id, handle) = state.sessions.create().await;
    info!(session = %id, "Session opened");
    let history = handle.lock().await;
    (StatusCode::CREATED, Json(render(&history, None)))
}

async fn get_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = find(&state, &id).await?;
    let history = handle.lock().await;
    Ok(Json(render(&history, None)))
}

async fn delete_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&SessionId::from(&id)).await {
        info!(session = %id, "Session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(id))
    }
}

async fn message_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = find(&state, &id).await?;

    // Held for the whole call: nothing else may touch this session meanwhile.
    let mut history = handle.lock().await;

    match state.assistant.respond(&mut history, &req.message).await {
        Ok(_) => Ok(Json(render(&history, None))),
        Err(AssistantError::EmptyPrompt) => Err(ApiError::BadRequest("message is empty".into())),
        Err(AssistantError::Generation(e)) => {
            warn!(session = %id, kind = e.kind(), "Reply failed");
            let error = ErrorView::from_generation(&e, &state.ui.error_prefix);
            Err(ApiError::Generation(render(&history, Some(error))))
        }
    }
}

async fn reset_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = find(&state, &id).await?;
    let mut history = handle.lock().await;
    history.reset();
    info!(session = %id, "Session history cleared");
    Ok(Json(render(&history, None)))
}

// ── Tests ─────────────────────────────────────────────────────────────────
