//! World state store — the single shared simulation/interaction model.
//!
//! DESIGN
//! ======
//! One `WorldState` lives behind a `Mutex` for the whole process. Every read
//! and write goes through `WorldStore`, and each method holds the lock for
//! exactly one logical operation, so multi-field updates (append to both
//! point lists, reset everything) are never observed half-applied. Critical
//! sections are short and never span an `.await`, so a blocking mutex is
//! used rather than an async one.
//!
//! The simulation tick reads a `Snapshot`, plans outside the lock, and writes
//! the result back with `apply_motion`. A reset bumps `epoch`; motion computed
//! from a snapshot taken before the reset is discarded instead of overwriting
//! the freshly reset pose.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dwa::{Config, Footprint, Point, Pose, Velocity};

/// Display pixels per world unit.
pub const DISPLAY_SCALE: f64 = 10.0;

/// Width and height of the rendered canvas in display pixels.
pub const CANVAS_SIZE: u32 = 600;

/// Pose the robot starts from, and returns to on reset.
pub const INITIAL_POSE: Pose = Pose { x: 30.0, y: 30.0, yaw: 0.0 };

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WorldError {
    #[error("coordinate is not finite: ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
    #[error("coordinate outside the canvas: ({x}, {y})")]
    OutOfBounds { x: f64, y: f64 },
}

// =============================================================================
// POINTS
// =============================================================================

/// A point in display pixels, as reported by the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

impl DisplayPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale down to world units.
    #[must_use]
    pub fn to_world(self) -> Point {
        Point::new(self.x / DISPLAY_SCALE, self.y / DISPLAY_SCALE)
    }

    /// Reject non-finite or off-canvas coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NonFinite`] or [`WorldError::OutOfBounds`].
    pub fn validate(self) -> Result<Self, WorldError> {
        check_bounds(self.x, self.y, f64::from(CANVAS_SIZE))?;
        Ok(self)
    }
}

fn check_bounds(x: f64, y: f64, limit: f64) -> Result<(), WorldError> {
    if !(x.is_finite() && y.is_finite()) {
        return Err(WorldError::NonFinite { x, y });
    }
    if !((0.0..=limit).contains(&x) && (0.0..=limit).contains(&y)) {
        return Err(WorldError::OutOfBounds { x, y });
    }
    Ok(())
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone)]
struct WorldState {
    pose: Pose,
    velocity: Velocity,
    goal: Option<Point>,
    /// World-unit obstacles, index-aligned with `draw_points`.
    obstacle_points: Vec<Point>,
    draw_points: Vec<DisplayPoint>,
    is_drawing: bool,
    /// Incremented on every reset.
    epoch: u64,
}

impl WorldState {
    fn new() -> Self {
        Self {
            pose: INITIAL_POSE,
            velocity: Velocity::zero(),
            goal: None,
            obstacle_points: Vec::new(),
            draw_points: Vec::new(),
            is_drawing: false,
            epoch: 0,
        }
    }

    fn push_point(&mut self, point: DisplayPoint) -> bool {
        if self.draw_points.contains(&point) {
            return false;
        }
        self.draw_points.push(point);
        self.obstacle_points.push(point.to_world());
        true
    }

    fn draw(&mut self, point: DisplayPoint) -> bool {
        let added = self.push_point(point);
        if added {
            self.goal = None;
        }
        added
    }
}

/// What a pointer event at a display position did to the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    /// A drawing gesture is active; `added` is false for a duplicate point.
    Drew { added: bool },
    /// No gesture is active; the goal moved here (world units).
    GoalSet(Point),
}

/// Consistent copy of everything one tick or one render needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub pose: Pose,
    pub velocity: Velocity,
    pub goal: Option<Point>,
    pub obstacle_points: Vec<Point>,
    pub draw_points: Vec<DisplayPoint>,
    pub is_drawing: bool,
    pub config: Config,
    pub epoch: u64,
}

impl Snapshot {
    /// Planning runs only with a goal and at least one obstacle.
    #[must_use]
    pub fn should_plan(&self) -> bool {
        self.goal.is_some() && !self.obstacle_points.is_empty()
    }

    #[must_use]
    pub fn footprint(&self) -> Footprint {
        self.config.base
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Cloneable handle to the shared world. All clones see the same state.
#[derive(Clone)]
pub struct WorldStore {
    inner: Arc<Mutex<WorldState>>,
    config: Config,
}

impl WorldStore {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { inner: Arc::new(Mutex::new(WorldState::new())), config }
    }

    fn lock(&self) -> MutexGuard<'_, WorldState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            pose: state.pose,
            velocity: state.velocity,
            goal: state.goal,
            obstacle_points: state.obstacle_points.clone(),
            draw_points: state.draw_points.clone(),
            is_drawing: state.is_drawing,
            config: self.config,
            epoch: state.epoch,
        }
    }

    /// Append a drawn point and its world-unit obstacle. Exact duplicates of
    /// an existing drawn point are ignored. Returns whether a point was added.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] for non-finite or off-canvas input; the state
    /// is left untouched.
    pub fn append_obstacle(&self, point: DisplayPoint) -> Result<bool, WorldError> {
        let point = point.validate()?;
        Ok(self.lock().push_point(point))
    }

    /// Drawing-gesture step: append the point and, when it is new, drop the
    /// current goal in the same critical section.
    ///
    /// # Errors
    ///
    /// Same as [`Self::append_obstacle`].
    pub fn draw_obstacle(&self, point: DisplayPoint) -> Result<bool, WorldError> {
        let point = point.validate()?;
        Ok(self.lock().draw(point))
    }

    /// Pointer event at a display position: extends the drawing while a
    /// gesture is active, otherwise sets the goal there. The drawing flag is
    /// read and acted on under one lock.
    ///
    /// # Errors
    ///
    /// Same as [`Self::append_obstacle`].
    pub fn pointer(&self, point: DisplayPoint) -> Result<PointerOutcome, WorldError> {
        let point = point.validate()?;
        let mut state = self.lock();
        if state.is_drawing {
            return Ok(PointerOutcome::Drew { added: state.draw(point) });
        }
        let goal = point.to_world();
        state.goal = Some(goal);
        Ok(PointerOutcome::GoalSet(goal))
    }

    /// Set the goal in world units.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] when the goal lies outside the canvas.
    pub fn set_goal(&self, goal: Point) -> Result<(), WorldError> {
        check_bounds(goal.x, goal.y, f64::from(CANVAS_SIZE) / DISPLAY_SCALE)?;
        self.lock().goal = Some(goal);
        Ok(())
    }

    pub fn clear_goal(&self) {
        self.lock().goal = None;
    }

    pub fn set_drawing(&self, drawing: bool) {
        self.lock().is_drawing = drawing;
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.lock().is_drawing
    }

    /// Clear the goal, all drawn points and obstacles, and put the robot back
    /// at rest on its initial pose. The drawing flag is left as it is.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.goal = None;
        state.draw_points.clear();
        state.obstacle_points.clear();
        state.velocity = Velocity::zero();
        state.pose = INITIAL_POSE;
        state.epoch = state.epoch.wrapping_add(1);
    }

    /// Write back the outcome of a tick planned from a snapshot taken at
    /// `epoch`. Returns `false` (and changes nothing) if a reset happened in
    /// between.
    pub fn apply_motion(&self, epoch: u64, pose: Pose, velocity: Velocity) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        state.pose = pose;
        state.velocity = velocity;
        true
    }
}

#[cfg(test)]
#[path = "world_test.rs"]
mod tests;
