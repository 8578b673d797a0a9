//! Simulation loop — plan, integrate, render, publish.
//!
//! DESIGN
//! ======
//! One long-lived task ticks at a fixed period. Each tick:
//!
//! 1. snapshots the world,
//! 2. plans and integrates one step when a goal and obstacles exist, writing
//!    the result back with `apply_motion` (discarded if a reset landed in
//!    between),
//! 3. re-snapshots, renders, and publishes the encoded frame.
//!
//! The world lock is held only inside `WorldStore` calls, never across
//! planning, rendering, or encoding. Encoding is skipped while nobody is
//! watching. Missed ticks are skipped rather than bunched up, and the sleep
//! between ticks ends early when shutdown is signalled.
//!
//! Each tick body runs on the blocking pool. The async task only keeps time
//! and watches for shutdown, so request handlers never queue behind a slow
//! plan or encode.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::planning;
use crate::scene;
use crate::state::AppState;
use crate::stream;

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// True if a planned motion was written back to the world.
    pub moved: bool,
    /// Viewers the frame reached; zero when nobody is watching.
    pub viewers: usize,
}

/// Run one simulation/render tick against `state`.
pub fn tick(state: &AppState) -> TickReport {
    let snapshot = state.world.snapshot();
    let moved = match planning::step(state.planner.as_ref(), &snapshot) {
        Some(motion) => {
            let applied = state.world.apply_motion(snapshot.epoch, motion.pose, motion.velocity);
            if !applied {
                debug!(epoch = snapshot.epoch, "world reset during tick; motion discarded");
            }
            applied
        }
        None => false,
    };

    let viewers = publish_frame(state);
    TickReport { moved, viewers }
}

fn publish_frame(state: &AppState) -> usize {
    let bus = &state.frames;
    if bus.viewer_count() == 0 {
        return 0;
    }
    let frame = scene::render(&state.world.snapshot(), state.config.footprint_style);
    match stream::encode_jpeg(&frame, state.config.jpeg_quality) {
        Ok(jpeg) => bus.publish(stream::multipart_part(&jpeg)),
        Err(e) => {
            warn!(error = %e, "frame encode failed; dropping frame");
            0
        }
    }
}

/// Spawn the simulation loop. It runs until `shutdown` flips to `true` or
/// its sender is dropped.
pub fn spawn_sim_loop(state: AppState, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    let period = state.config.tick;
    info!(
        tick_ms = period.as_millis(),
        dt = state.config.planner.dt,
        footprint_style = ?state.config.footprint_style,
        "simulation loop started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    let state = state.clone();
                    if let Err(e) = tokio::task::spawn_blocking(move || tick(&state)).await {
                        warn!(error = %e, "simulation tick failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("simulation loop stopped");
    })
}

#[cfg(test)]
#[path = "sim_test.rs"]
mod tests;
