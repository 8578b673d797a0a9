//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own event parsing and world mutations so route handlers
//! can stay focused on protocol translation.

pub mod input;
