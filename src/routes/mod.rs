//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the embedded viewer page at `/`, the MJPEG frame
//! stream at `/frame`, and the two input endpoints the page posts to.

pub mod frame;
pub mod input;

use axum::Router;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Interactive viewer page.
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/frame", get(frame::handle_frame))
        .route("/mouse_events", post(input::handle_mouse_event))
        .route("/key_events", post(input::handle_key_event))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
