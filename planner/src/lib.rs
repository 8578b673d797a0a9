//! Dynamic Window Approach local planner for a differential-drive robot.
//!
//! The planner samples `(linear, angular)` velocity pairs reachable within one
//! control step (the dynamic window), rolls each candidate forward over the
//! prediction horizon, and scores it on three objectives: alignment with the
//! goal, clearance from obstacle points, and forward speed. The lowest total
//! cost wins.
//!
//! All quantities are in world units (the server scales display pixels down
//! by ten before calling in). The crate is pure: no I/O, no allocation beyond
//! the sample vectors, and results are fully determined by the inputs.

use serde::{Deserialize, Serialize};

/// Error returned by [`Config::validate`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// A resolution, time step, or horizon is zero, negative, or not finite.
    #[error("{field} must be positive and finite (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    /// `min_speed` exceeds `max_speed`.
    #[error("min_speed {min} exceeds max_speed {max}")]
    InvertedSpeedLimits { min: f64, max: f64 },
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// A point in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Robot position and heading (radians, counter-clockwise from +x).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose {
    #[must_use]
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    #[must_use]
    pub fn position(self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Velocity command: linear speed and yaw rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: f64,
    pub angular: f64,
}

impl Velocity {
    #[must_use]
    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Rectangular robot body as signed offsets from the robot origin.
///
/// `front`/`back` run along the heading, `left`/`right` across it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub front: f64,
    pub left: f64,
    pub back: f64,
    pub right: f64,
}

impl Default for Footprint {
    fn default() -> Self {
        Self { front: 3.0, left: 2.5, back: -3.0, right: -2.5 }
    }
}

impl Footprint {
    /// True when a point in the robot frame lies inside (or on) the body.
    #[must_use]
    pub fn contains_local(&self, x: f64, y: f64) -> bool {
        let (x_min, x_max) = ordered(self.front, self.back);
        let (y_min, y_max) = ordered(self.left, self.right);
        (x_min..=x_max).contains(&x) && (y_min..=y_max).contains(&y)
    }

    /// Corner offsets in the robot frame, in drawing order.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.front, self.left),
            Point::new(self.front, self.right),
            Point::new(self.back, self.right),
            Point::new(self.back, self.left),
        ]
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Planner tuning. Angles are radians, times are seconds of simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_speed: f64,
    pub min_speed: f64,
    pub max_yawrate: f64,
    pub max_accel: f64,
    pub max_dyawrate: f64,
    pub velocity_resolution: f64,
    pub yawrate_resolution: f64,
    pub dt: f64,
    pub predict_time: f64,
    /// Weight of the goal-alignment objective.
    pub heading: f64,
    /// Weight of the obstacle-clearance objective.
    pub clearance: f64,
    /// Weight of the forward-speed objective.
    pub velocity: f64,
    pub base: Footprint,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_speed: 3.0,
            min_speed: -1.0,
            max_yawrate: 40.0_f64.to_radians(),
            max_accel: 15.0,
            max_dyawrate: 110.0_f64.to_radians(),
            velocity_resolution: 0.1,
            yawrate_resolution: 1.0_f64.to_radians(),
            dt: 0.1,
            predict_time: 3.0,
            heading: 0.15,
            clearance: 1.0,
            velocity: 1.0,
            base: Footprint::default(),
        }
    }
}

impl Config {
    /// Check that sampling and integration parameters can make progress.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] for a non-positive resolution,
    /// time step, or horizon, and [`ConfigError::InvertedSpeedLimits`] when
    /// `min_speed > max_speed`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("velocity_resolution", self.velocity_resolution),
            ("yawrate_resolution", self.yawrate_resolution),
            ("dt", self.dt),
            ("predict_time", self.predict_time),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.min_speed > self.max_speed {
            return Err(ConfigError::InvertedSpeedLimits { min: self.min_speed, max: self.max_speed });
        }
        Ok(())
    }
}

// =============================================================================
// DYNAMIC WINDOW
// =============================================================================

/// Velocities reachable from the current command within one `dt`.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicWindow {
    pub linear: Vec<f64>,
    pub angular: Vec<f64>,
}

impl DynamicWindow {
    #[must_use]
    pub fn new(velocity: Velocity, config: &Config) -> Self {
        let min_v = config.min_speed.max(velocity.linear - config.max_accel * config.dt);
        let max_v = config.max_speed.min(velocity.linear + config.max_accel * config.dt);
        let min_w = (-config.max_yawrate).max(velocity.angular - config.max_dyawrate * config.dt);
        let max_w = config.max_yawrate.min(velocity.angular + config.max_dyawrate * config.dt);

        Self {
            linear: samples(min_v, max_v, config.velocity_resolution),
            angular: samples(min_w, max_w, config.yawrate_resolution),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.linear.is_empty() || self.angular.is_empty()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn samples(min: f64, max: f64, resolution: f64) -> Vec<f64> {
    let span = (max - min) / resolution;
    if !(span.is_finite() && span >= 1.0) {
        return Vec::new();
    }
    let count = span as usize;
    (0..count).map(|i| min + i as f64 * resolution).collect()
}

// =============================================================================
// KINEMATICS
// =============================================================================

/// Advance `pose` by `velocity` over `dt`. Heading is updated before the
/// translation, so the step moves along the new heading.
#[must_use]
pub fn motion(pose: Pose, velocity: Velocity, dt: f64) -> Pose {
    let yaw = pose.yaw + velocity.angular * dt;
    Pose {
        x: pose.x + velocity.linear * yaw.cos() * dt,
        y: pose.y + velocity.linear * yaw.sin() * dt,
        yaw,
    }
}

// =============================================================================
// COSTS
// =============================================================================

/// Penalise slow candidates.
#[must_use]
pub fn velocity_cost(velocity: Velocity, config: &Config) -> f64 {
    config.max_speed - velocity.linear
}

/// Absolute angle between the pose heading and the bearing to `goal`,
/// wrapped to `[0, π]`.
#[must_use]
pub fn heading_cost(pose: Pose, goal: Point) -> f64 {
    let bearing = (goal.y - pose.y).atan2(goal.x - pose.x);
    let error = bearing - pose.yaw;
    error.sin().atan2(error.cos()).abs()
}

/// Inverse of the closest approach to any obstacle along the rollout.
///
/// Infinite when an obstacle enters the footprint at any rollout step.
#[must_use]
pub fn clearance_cost(pose: Pose, velocity: Velocity, obstacles: &[Point], config: &Config) -> f64 {
    let mut rollout = pose;
    let mut time = 0.0;
    let mut min_r = f64::MAX;

    while time < config.predict_time {
        rollout = motion(rollout, velocity, config.dt);
        let (sin, cos) = rollout.yaw.sin_cos();
        for obstacle in obstacles {
            let dx = obstacle.x - rollout.x;
            let dy = obstacle.y - rollout.y;
            let local_x = dx * cos + dy * sin;
            let local_y = -dx * sin + dy * cos;
            if config.base.contains_local(local_x, local_y) {
                return f64::INFINITY;
            }
            min_r = min_r.min(dx.hypot(dy));
        }
        time += config.dt;
    }

    1.0 / min_r
}

// =============================================================================
// PLANNING
// =============================================================================

/// Choose the best velocity command in the dynamic window.
///
/// Returns `None` when the window is empty or every candidate collides; the
/// caller decides how to hold in that case.
#[must_use]
pub fn plan(pose: Pose, velocity: Velocity, goal: Point, obstacles: &[Point], config: &Config) -> Option<Velocity> {
    let window = DynamicWindow::new(velocity, config);
    let mut best: Option<(f64, Velocity)> = None;

    for &linear in &window.linear {
        for &angular in &window.angular {
            let candidate = Velocity::new(linear, angular);
            let predicted = motion(pose, candidate, config.predict_time);
            let cost = config.velocity * velocity_cost(candidate, config)
                + config.heading * heading_cost(predicted, goal)
                + config.clearance * clearance_cost(pose, candidate, obstacles, config);

            if !cost.is_finite() {
                continue;
            }
            if best.is_none_or(|(best_cost, _)| cost < best_cost) {
                best = Some((cost, candidate));
            }
        }
    }

    best.map(|(_, velocity)| velocity)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
