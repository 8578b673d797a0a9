//! Frame route — `GET /frame` streams the rendered scene as MJPEG.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use tracing::info;
use uuid::Uuid;

use crate::state::AppState;
use crate::stream;

pub async fn handle_frame(State(state): State<AppState>) -> Response {
    let viewer_id = Uuid::new_v4();
    info!(%viewer_id, viewers = state.frames.viewer_count() + 1, "frame viewer connected");

    let body = Body::from_stream(stream::viewer_stream(&state.frames, state.shutdown.clone(), viewer_id));
    ([(CONTENT_TYPE, stream::CONTENT_TYPE), (CACHE_CONTROL, "no-cache")], body).into_response()
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
