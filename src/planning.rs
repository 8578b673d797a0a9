//! Planning adapter — call boundary to the motion planner and integrator.
//!
//! The loop only sees `MotionPlanner`; the production implementation
//! delegates to the `dwa` crate. Infeasible planning is not an error here:
//! `step` falls back to the last commanded velocity so the loop keeps
//! ticking.

use dwa::{Config, Point, Pose, Velocity};
use tracing::debug;

use crate::world::Snapshot;

/// Velocity planner plus kinematic integrator.
pub trait MotionPlanner: Send + Sync {
    /// Best velocity toward `goal`, or `None` when no trajectory is feasible.
    fn plan(&self, pose: Pose, velocity: Velocity, goal: Point, obstacles: &[Point], config: &Config)
    -> Option<Velocity>;

    /// Pose after driving `velocity` for `dt`.
    fn integrate(&self, pose: Pose, velocity: Velocity, dt: f64) -> Pose;
}

/// Dynamic Window Approach planner from the `dwa` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DwaPlanner;

impl MotionPlanner for DwaPlanner {
    fn plan(
        &self,
        pose: Pose,
        velocity: Velocity,
        goal: Point,
        obstacles: &[Point],
        config: &Config,
    ) -> Option<Velocity> {
        dwa::plan(pose, velocity, goal, obstacles, config)
    }

    fn integrate(&self, pose: Pose, velocity: Velocity, dt: f64) -> Pose {
        dwa::motion(pose, velocity, dt)
    }
}

/// Result of one planning step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub pose: Pose,
    pub velocity: Velocity,
    /// False when the planner found nothing and the previous velocity was held.
    pub feasible: bool,
}

/// Plan and integrate one step from `snapshot`.
///
/// Returns `None` when there is nothing to plan for (no goal or no
/// obstacles); the robot idles in that case.
#[must_use]
pub fn step(planner: &dyn MotionPlanner, snapshot: &Snapshot) -> Option<Motion> {
    if !snapshot.should_plan() {
        return None;
    }
    let goal = snapshot.goal?;
    let config = &snapshot.config;

    let planned = planner.plan(snapshot.pose, snapshot.velocity, goal, &snapshot.obstacle_points, config);
    let feasible = planned.is_some();
    let velocity = planned.unwrap_or(snapshot.velocity);
    if !feasible {
        debug!(linear = velocity.linear, angular = velocity.angular, "no feasible trajectory; holding velocity");
    }

    Some(Motion { pose: planner.integrate(snapshot.pose, velocity, config.dt), velocity, feasible })
}

#[cfg(test)]
#[path = "planning_test.rs"]
mod tests;
