use super::*;
use std::time::Duration;

use axum::http::StatusCode;
use futures::StreamExt;

use crate::sim;
use crate::state::test_helpers::test_app_state;

#[tokio::test]
async fn frame_response_is_multipart_stream() {
    let (state, _tx) = test_app_state();
    let response = handle_frame(State(state.clone())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "multipart/x-mixed-replace; boundary=frame");
    assert_eq!(state.frames.viewer_count(), 1);
}

#[tokio::test]
async fn frame_body_yields_published_parts() {
    let (state, _tx) = test_app_state();
    let response = handle_frame(State(state.clone())).await;
    let mut body = response.into_body().into_data_stream();

    assert_eq!(sim::tick(&state).viewers, 1);

    let chunk = tokio::time::timeout(Duration::from_secs(1), body.next())
        .await
        .expect("part should arrive")
        .expect("stream open")
        .expect("chunk");
    assert!(chunk.starts_with(b"\r\n--frame\r\nContent-Type: image/jpeg\r\n\r\n"));
}

#[tokio::test]
async fn frame_body_ends_on_shutdown() {
    let (state, tx) = test_app_state();
    let response = handle_frame(State(state)).await;
    let mut body = response.into_body().into_data_stream();

    tx.send(true).expect("signal shutdown");
    let next = tokio::time::timeout(Duration::from_secs(1), body.next())
        .await
        .expect("stream should end promptly");
    assert!(next.is_none());
}

#[tokio::test]
async fn dropping_response_releases_viewer() {
    let (state, _tx) = test_app_state();
    let response = handle_frame(State(state.clone())).await;
    drop(response);
    assert_eq!(state.frames.viewer_count(), 0);
}
