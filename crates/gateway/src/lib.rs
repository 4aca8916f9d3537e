//! HTTP gateway for TableChat.
//!
//! Serves the chat API under `/v1`, a health probe, and the embedded
//! single-page UI. Built on Axum.

pub mod api_v1;
pub mod frontend;
pub mod view;

#[cfg(test)]
mod test_helpers;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, extract::State, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use tablechat_assistant::Assistant;
use tablechat_config::{AppConfig, UiConfig};
use tablechat_core::Generator;
use tablechat_knowledge::KnowledgeBlob;
use tablechat_session::{Greetings, SessionRegistry};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub assistant: Assistant,
    pub sessions: SessionRegistry,
    pub ui: UiConfig,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(
        config: &AppConfig,
        generator: Arc<dyn Generator>,
        knowledge: Arc<KnowledgeBlob>,
    ) -> Self {
        let greetings = Greetings {
            welcome: config.session.welcome_greeting.clone(),
            reset: config.session.reset_greeting.clone(),
        };
        Self {
            assistant: Assistant::from_config(config, generator, knowledge),
            sessions: SessionRegistry::new(greetings, config.session.max_sessions)
                .with_max_stored_turns(config.session.stored_turns_cap()),
            ui: config.ui.clone(),
            started_at: chrono::Utc::now(),
        }
    }
}

/// Build the full router: health, v1 API, and the embedded frontend.
///
/// Layers applied:
/// - CORS restricted to `allowed_origin` (same-origin only when `None`)
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState, allowed_origin: Option<HeaderValue>) -> Router {
    let cors = match allowed_origin {
        Some(origin) => CorsLayer::new().allow_origin(AllowOrigin::exact(origin)),
        None => CorsLayer::new(),
    }
    .allow_methods([Method::GET, Method::POST, Method::DELETE])
    .allow_headers([header::CONTENT_TYPE])
    .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Bind the configured address and serve until the process stops.
///
/// Callers load the knowledge table and build the generator first, so a
/// missing key or file never reaches this point.
pub async fn serve(
    config: &AppConfig,
    generator: Arc<dyn Generator>,
    knowledge: Arc<KnowledgeBlob>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let origin = HeaderValue::from_str(&format!("http://{addr}")).ok();

    let state = Arc::new(GatewayState::new(config, generator, knowledge));
    let app = build_router(state, origin);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, model = %config.model, "Gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub knowledge_rows: usize,
    pub sessions: usize,
    pub uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        model: state.assistant.model().to_string(),
        knowledge_rows: state.assistant.knowledge().row_count(),
        sessions: state.sessions.len().await,
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_knowledge_rows() {
        let app = build_router(test_state("ok"), None);

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.knowledge_rows, 1);
        assert_eq!(health.sessions, 0);
        assert_eq!(health.model, "test-model");
    }

    #[tokio::test]
    async fn full_router_serves_api_and_frontend() {
        let state = test_state("ok");

        let req = Request::builder()
            .method("POST")
            .uri("/v1/sessions")
            .body(Body::empty())
            .unwrap();
        let response = build_router(state.clone(), None).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = build_router(state, None).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let state = test_state("ok");
        let (id, _) = state.sessions.create().await;
        let huge = serde_json::json!({"message": "x".repeat(2 * 1024 * 1024)}).to_string();

        let req = Request::builder()
            .method("POST")
            .uri(format!("/v1/sessions/{id}/messages"))
            .header("content-type", "application/json")
            .body(Body::from(huge))
            .unwrap();
        let response = build_router(state, None).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        // Rejections are plain text, so the page must not parse them as JSON.
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        assert!(!content_type.contains("application/json"), "{content_type}");
    }
}
