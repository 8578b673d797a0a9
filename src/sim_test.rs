use super::*;
use std::sync::Arc;
use std::time::Duration;

use dwa::{Config, Point, Pose, Velocity};

use crate::planning::MotionPlanner;
use crate::state::test_helpers::{test_app_state, test_app_state_with_planner};
use crate::world::{DisplayPoint, INITIAL_POSE};

/// Planner that always drives forward at a fixed speed.
struct Cruise;

impl MotionPlanner for Cruise {
    fn plan(&self, _: Pose, _: Velocity, _: Point, _: &[Point], _: &Config) -> Option<Velocity> {
        Some(Velocity::new(1.0, 0.0))
    }

    fn integrate(&self, pose: Pose, velocity: Velocity, dt: f64) -> Pose {
        dwa::motion(pose, velocity, dt)
    }
}

/// Planner that takes far longer than one tick period.
struct Slow;

impl MotionPlanner for Slow {
    fn plan(&self, _: Pose, velocity: Velocity, _: Point, _: &[Point], _: &Config) -> Option<Velocity> {
        std::thread::sleep(Duration::from_millis(80));
        Some(velocity)
    }

    fn integrate(&self, pose: Pose, velocity: Velocity, dt: f64) -> Pose {
        dwa::motion(pose, velocity, dt)
    }
}

fn distance_to(state: &AppState, goal: Point) -> f64 {
    state.world.snapshot().pose.position().distance(goal)
}

// =============================================================================
// tick
// =============================================================================

#[test]
fn tick_idles_with_goal_but_no_obstacles() {
    let (state, _tx) = test_app_state();
    state.world.set_goal(Point::new(50.0, 30.0)).expect("goal");

    for _ in 0..10 {
        assert!(!tick(&state).moved);
    }
    let snap = state.world.snapshot();
    assert_eq!(snap.pose, INITIAL_POSE);
    assert_eq!(snap.velocity, Velocity::zero());
}

#[test]
fn tick_idles_with_obstacles_but_no_goal() {
    let (state, _tx) = test_app_state();
    state.world.append_obstacle(DisplayPoint::new(50.0, 50.0)).expect("append");

    assert!(!tick(&state).moved);
    assert_eq!(state.world.snapshot().pose, INITIAL_POSE);
}

#[test]
fn tick_writes_planned_motion_back() {
    let (state, _tx) = test_app_state_with_planner(Arc::new(Cruise));
    state.world.append_obstacle(DisplayPoint::new(50.0, 50.0)).expect("append");
    state.world.set_goal(Point::new(50.0, 30.0)).expect("goal");

    assert!(tick(&state).moved);
    let snap = state.world.snapshot();
    assert_eq!(snap.velocity, Velocity::new(1.0, 0.0));
    assert!((snap.pose.x - (INITIAL_POSE.x + 0.1)).abs() < 1e-9);
    assert!((snap.pose.y - INITIAL_POSE.y).abs() < f64::EPSILON);
}

#[test]
fn unobstructed_approach_closes_distance_every_tick() {
    let (state, _tx) = test_app_state();
    let goal = Point::new(58.0, 30.0);
    // Far behind the robot; only enables planning.
    state.world.append_obstacle(DisplayPoint::new(50.0, 50.0)).expect("append");
    state.world.set_goal(goal).expect("goal");

    let start = distance_to(&state, goal);
    let mut previous = start;
    for n in 0..40 {
        assert!(tick(&state).moved);
        let now = distance_to(&state, goal);
        assert!(now < previous, "tick {n}: distance {now} did not drop below {previous}");
        previous = now;
    }
    for _ in 40..60 {
        tick(&state);
    }
    assert!(distance_to(&state, goal) < start / 2.0);
}

#[test]
fn short_approach_reaches_goal_within_bounded_ticks() {
    let (state, _tx) = test_app_state();
    let goal = Point::new(32.0, 30.0);
    state.world.append_obstacle(DisplayPoint::new(50.0, 50.0)).expect("append");
    state.world.set_goal(goal).expect("goal");

    let mut previous = distance_to(&state, goal);
    let mut reached = None;
    for n in 0..10 {
        assert!(tick(&state).moved);
        let now = distance_to(&state, goal);
        assert!(now < previous, "tick {n}: distance {now} did not drop below {previous}");
        if now < 1.0 {
            reached = Some(n);
            break;
        }
        previous = now;
    }
    assert!(reached.is_some(), "robot still {previous} from the goal after 10 ticks");
}

#[test]
fn tick_skips_frame_without_viewers() {
    let (state, _tx) = test_app_state();
    assert_eq!(tick(&state).viewers, 0);
}

#[tokio::test]
async fn tick_publishes_multipart_jpeg_to_viewers() {
    let (state, _tx) = test_app_state();
    let mut rx = state.frames.subscribe();

    assert_eq!(tick(&state).viewers, 1);

    let part = rx.recv().await.expect("frame part");
    let head = b"\r\n--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    assert!(part.starts_with(head));
    assert_eq!(&part[head.len()..head.len() + 2], &[0xFF, 0xD8]);
    assert!(part.ends_with(b"\xFF\xD9\r\n"));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_racing_ticks_keep_lists_aligned() {
    let (state, _tx) = test_app_state();
    state.world.set_goal(Point::new(55.0, 55.0)).expect("goal");

    let mut handles = Vec::new();
    for task in 0..16_u32 {
        let world = state.world.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..25_u32 {
                let point = DisplayPoint::new(f64::from(task * 30 + 5), f64::from(i * 20 + 5));
                world.append_obstacle(point).expect("append");
                tokio::task::yield_now().await;
            }
        }));
    }

    let ticker = {
        let state = state.clone();
        tokio::task::spawn_blocking(move || {
            for _ in 0..20 {
                tick(&state);
                let snap = state.world.snapshot();
                assert_eq!(snap.obstacle_points.len(), snap.draw_points.len());
            }
        })
    };

    for handle in handles {
        handle.await.expect("appender");
    }
    ticker.await.expect("ticker");

    let snap = state.world.snapshot();
    assert_eq!(snap.obstacle_points.len(), 16 * 25);
    assert_eq!(snap.draw_points.len(), 16 * 25);
}

#[test]
fn reset_between_ticks_returns_robot_home() {
    let (state, _tx) = test_app_state_with_planner(Arc::new(Cruise));
    state.world.append_obstacle(DisplayPoint::new(50.0, 50.0)).expect("append");
    state.world.set_goal(Point::new(50.0, 30.0)).expect("goal");

    tick(&state);
    state.world.reset();
    assert!(!tick(&state).moved);

    let snap = state.world.snapshot();
    assert_eq!(snap.pose, INITIAL_POSE);
    assert_eq!(snap.velocity, Velocity::zero());
}

// =============================================================================
// spawn_sim_loop
// =============================================================================

#[tokio::test]
async fn sim_loop_stops_on_shutdown() {
    let (state, tx) = test_app_state_with_planner(Arc::new(Cruise));
    state.world.append_obstacle(DisplayPoint::new(50.0, 50.0)).expect("append");
    state.world.set_goal(Point::new(50.0, 30.0)).expect("goal");

    let handle = spawn_sim_loop(state.clone(), state.shutdown.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(state.world.snapshot().pose.x > INITIAL_POSE.x);

    tx.send(true).expect("signal shutdown");
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop should stop promptly")
        .expect("loop task");
}

#[tokio::test]
async fn sim_loop_stops_when_sender_dropped() {
    let (state, tx) = test_app_state();
    let handle = spawn_sim_loop(state.clone(), state.shutdown.clone());
    drop(tx);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop should stop promptly")
        .expect("loop task");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn slow_ticks_do_not_stall_other_tasks() {
    let (state, tx) = test_app_state_with_planner(Arc::new(Slow));
    state.world.append_obstacle(DisplayPoint::new(50.0, 50.0)).expect("append");
    state.world.set_goal(Point::new(50.0, 30.0)).expect("goal");

    let handle = spawn_sim_loop(state.clone(), state.shutdown.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;

    let mut worst = Duration::ZERO;
    for _ in 0..20 {
        let started = std::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(1)).await;
        worst = worst.max(started.elapsed());
    }
    assert!(worst < Duration::from_millis(40), "worst wake-up latency {worst:?} while ticking");

    tx.send(true).expect("signal shutdown");
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("loop should stop after the in-flight tick")
        .expect("loop task");
}
