//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! handed to the simulation loop. It holds the world store, the frame bus
//! that fans encoded frames out to viewers, the server config, the motion
//! planner, and the shutdown signal that ends open frame streams.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::planning::{DwaPlanner, MotionPlanner};
use crate::stream::FrameBus;
use crate::world::WorldStore;

/// Shared application state. Clone is required by Axum; every field is
/// `Arc`-backed or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub world: WorldStore,
    pub frames: FrameBus,
    pub config: Arc<ServerConfig>,
    pub planner: Arc<dyn MotionPlanner>,
    /// Flips to `true` once the server begins shutting down.
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self::with_planner(config, Arc::new(DwaPlanner), shutdown)
    }

    #[must_use]
    pub fn with_planner(
        config: ServerConfig,
        planner: Arc<dyn MotionPlanner>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            world: WorldStore::new(config.planner),
            frames: FrameBus::new(config.frame_buffer),
            config: Arc::new(config),
            planner,
            shutdown,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
