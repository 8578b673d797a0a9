//! Interactive Dynamic Window Approach demo server.
//!
//! A simulated robot plans toward a user-chosen goal around user-drawn
//! obstacles. The world lives in [`world::WorldStore`]; [`sim`] ticks it,
//! renders each frame with [`scene`], and fans the JPEGs out to viewers via
//! [`stream`]. [`routes`] exposes the page, the MJPEG stream, and the input
//! endpoints.

pub mod config;
pub mod planning;
pub mod routes;
pub mod scene;
pub mod services;
pub mod sim;
pub mod state;
pub mod stream;
pub mod world;
