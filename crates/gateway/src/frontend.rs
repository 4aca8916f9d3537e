//! The chat page, compiled into the binary.
//!
//! `frontend/` holds one HTML page plus its stylesheet and script; all three
//! are embedded with `include_str!` so the gateway ships as a single file.

use axum::{
    Router,
    http::{HeaderValue, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};

const INDEX_HTML: &str = include_str!("../../../frontend/index.html");
const STYLE_CSS: &str = include_str!("../../../frontend/style.css");
const APP_JS: &str = include_str!("../../../frontend/app.js");

/// Fonts come from Google Fonts; everything else is same-origin.
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    style-src 'self' https://fonts.googleapis.com; \
    font-src https://fonts.gstatic.com; \
    connect-src 'self'";

pub fn frontend_router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/style.css", get(|| asset(STYLE_CSS, "text/css; charset=utf-8")))
        .route(
            "/static/app.js",
            get(|| asset(APP_JS, "application/javascript; charset=utf-8")),
        )
}

async fn index() -> Response {
    let mut response = Html(INDEX_HTML).into_response();
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    response
}

async fn asset(body: &'static str, content_type: &'static str) -> Response {
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}
