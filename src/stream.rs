//! Frame stream — JPEG encoding and fan-out to viewers.
//!
//! DESIGN
//! ======
//! The simulation loop publishes each encoded multipart part onto a bounded
//! `broadcast` channel and moves on; it never waits for a viewer. Each
//! `GET /frame` subscriber reads at its own pace. A viewer that falls more
//! than the channel capacity behind loses the oldest parts and resumes with
//! the newest ones retained.
//!
//! Streams end when the client goes away (the body is dropped) or when the
//! shutdown signal flips.

use std::convert::Infallible;

use axum::body::Bytes;
use futures::Stream;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};
use uuid::Uuid;

/// Multipart boundary token.
pub const BOUNDARY: &str = "frame";

/// Response content type for the frame stream.
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Encode an RGB frame as baseline JPEG. `quality` is clamped to 1..=100.
///
/// # Errors
///
/// Returns [`EncodeError::Jpeg`] if the encoder rejects the image.
pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder.encode_image(frame)?;
    Ok(out)
}

/// Wrap one JPEG in its multipart envelope.
#[must_use]
pub fn multipart_part(jpeg: &[u8]) -> Bytes {
    let head = format!("\r\n--{BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
    let mut part = Vec::with_capacity(head.len() + jpeg.len() + 2);
    part.extend_from_slice(head.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

// =============================================================================
// FRAME BUS
// =============================================================================

/// Cloneable publisher/subscriber hub for encoded frame parts.
#[derive(Clone)]
pub struct FrameBus {
    tx: broadcast::Sender<Bytes>,
}

impl FrameBus {
    /// `capacity` is the number of parts a slow viewer may fall behind
    /// before the oldest are dropped (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish a part to every current viewer. Returns how many received it.
    pub fn publish(&self, part: Bytes) -> usize {
        self.tx.send(part).unwrap_or(0)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.tx.subscribe()
    }
}

// =============================================================================
// VIEWER STREAM
// =============================================================================

/// Logs the end of a viewer's stream, however it ends.
struct ViewerGuard(Uuid);

impl Drop for ViewerGuard {
    fn drop(&mut self) {
        info!(viewer_id = %self.0, "frame viewer disconnected");
    }
}

/// Body stream for one viewer: multipart parts in publish order, skipping
/// whatever was dropped while the viewer lagged.
pub fn viewer_stream(
    bus: &FrameBus,
    shutdown: watch::Receiver<bool>,
    viewer_id: Uuid,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let rx = bus.subscribe();
    let guard = ViewerGuard(viewer_id);

    futures::stream::unfold((rx, shutdown, guard), |(mut rx, mut shutdown, guard)| async move {
        loop {
            if *shutdown.borrow() {
                return None;
            }
            let received = tokio::select! {
                changed = shutdown.changed() => match changed {
                    Ok(()) => continue,
                    Err(_) => return None,
                },
                received = rx.recv() => received,
            };
            match received {
                Ok(part) => return Some((Ok(part), (rx, shutdown, guard))),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(viewer_id = %guard.0, skipped, "viewer lagging; dropped oldest frames");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;
