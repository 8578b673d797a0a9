//! Scene renderer: world snapshot in, RGB frame out.
//!
//! Layers are drawn in a fixed order onto a fresh canvas: drawn obstacle
//! points, the goal marker, then the robot body. Rendering never fails and
//! never touches shared state.
//!
//! The robot body has two constructions. `Approximate` is the default
//! look: the footprint offsets are translated by the
//! robot position and only their differences survive, giving a box of the
//! footprint's overall size centred on the robot origin and rotated by the
//! heading (corner math in single precision, truncated to pixels).
//! `Oriented` rotates each footprint corner about the robot origin, which
//! honours asymmetric offsets.

use std::str::FromStr;

use dwa::{Footprint, Pose};
use image::{Rgb, RgbImage};

use crate::world::{CANVAS_SIZE, DISPLAY_SCALE, Snapshot};

pub const BACKGROUND: Rgb<u8> = Rgb([1, 1, 1]);
pub const OBSTACLE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const GOAL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const ROBOT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Radius of obstacle and goal markers, in pixels.
pub const MARKER_RADIUS: i32 = 4;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown footprint style: {0} (expected `approximate` or `oriented`)")]
pub struct UnknownFootprintStyle(pub String);

/// How the robot body polygon is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FootprintStyle {
    #[default]
    Approximate,
    Oriented,
}

impl FromStr for FootprintStyle {
    type Err = UnknownFootprintStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approximate" => Ok(Self::Approximate),
            "oriented" => Ok(Self::Oriented),
            _ => Err(UnknownFootprintStyle(s.to_string())),
        }
    }
}

impl FootprintStyle {
    /// Body polygon in display pixels.
    #[must_use]
    pub fn corners(self, pose: Pose, footprint: Footprint) -> [(i32, i32); 4] {
        match self {
            Self::Approximate => approximate_corners(pose, footprint),
            Self::Oriented => oriented_corners(pose, footprint),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn approximate_corners(pose: Pose, footprint: Footprint) -> [(i32, i32); 4] {
    let cx = pose.x * DISPLAY_SCALE;
    let cy = pose.y * DISPLAY_SCALE;

    let front = footprint.front * DISPLAY_SCALE + cx;
    let left = footprint.left * DISPLAY_SCALE + cy;
    let back = footprint.back * DISPLAY_SCALE + cx;
    let right = footprint.right * DISPLAY_SCALE + cy;
    let width = (back - front) as f32;
    let height = (right - left) as f32;

    // The box angle is held in single-precision degrees.
    let angle = f64::from(pose.yaw.to_degrees() as f32) * std::f64::consts::PI / 180.0;
    let b = angle.cos() as f32 * 0.5;
    let a = angle.sin() as f32 * 0.5;
    let (cx, cy) = (cx as f32, cy as f32);

    let p0 = (cx - a * height - b * width, cy + b * height - a * width);
    let p1 = (cx + a * height - b * width, cy - b * height - a * width);
    let p2 = (2.0 * cx - p0.0, 2.0 * cy - p0.1);
    let p3 = (2.0 * cx - p1.0, 2.0 * cy - p1.1);

    [p0, p1, p2, p3].map(|(x, y)| (x as i32, y as i32))
}

#[allow(clippy::cast_possible_truncation)]
fn oriented_corners(pose: Pose, footprint: Footprint) -> [(i32, i32); 4] {
    let (sin, cos) = pose.yaw.sin_cos();
    footprint.corners().map(|c| {
        let x = (pose.x + c.x * cos - c.y * sin) * DISPLAY_SCALE;
        let y = (pose.y + c.x * sin + c.y * cos) * DISPLAY_SCALE;
        (x as i32, y as i32)
    })
}

/// Draw the scene for one snapshot.
#[must_use]
pub fn render(snapshot: &Snapshot, style: FootprintStyle) -> RgbImage {
    let mut frame = RgbImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, BACKGROUND);

    for point in &snapshot.draw_points {
        fill_circle(&mut frame, to_pixel(point.x), to_pixel(point.y), MARKER_RADIUS, OBSTACLE_COLOR);
    }

    if let Some(goal) = snapshot.goal {
        fill_circle(
            &mut frame,
            to_pixel(goal.x * DISPLAY_SCALE),
            to_pixel(goal.y * DISPLAY_SCALE),
            MARKER_RADIUS,
            GOAL_COLOR,
        );
    }

    let body = style.corners(snapshot.pose, snapshot.footprint());
    fill_convex_polygon(&mut frame, &body, ROBOT_COLOR);

    frame
}

#[allow(clippy::cast_possible_truncation)]
fn to_pixel(v: f64) -> i32 {
    v as i32
}

fn put(frame: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
        if x < frame.width() && y < frame.height() {
            frame.put_pixel(x, y, color);
        }
    }
}

fn fill_circle(frame: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                put(frame, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Fill a convex polygon, boundary included, in either winding order.
fn fill_convex_polygon(frame: &mut RgbImage, corners: &[(i32, i32)], color: Rgb<u8>) {
    let Some(&(first_x, first_y)) = corners.first() else {
        return;
    };
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first_x, first_x, first_y, first_y);
    for &(x, y) in corners {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let limit = i32::try_from(CANVAS_SIZE).unwrap_or(i32::MAX) - 1;
    let (min_x, max_x) = (min_x.max(0), max_x.min(limit));
    let (min_y, max_y) = (min_y.max(0), max_y.min(limit));

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if inside_convex(corners, x, y) {
                put(frame, x, y, color);
            }
        }
    }
}

fn inside_convex(corners: &[(i32, i32)], x: i32, y: i32) -> bool {
    let mut positive = false;
    let mut negative = false;
    for (i, &(ax, ay)) in corners.iter().enumerate() {
        let (bx, by) = corners[(i + 1) % corners.len()];
        let cross = i64::from(bx - ax) * i64::from(y - ay) - i64::from(by - ay) * i64::from(x - ax);
        positive |= cross > 0;
        negative |= cross < 0;
        if positive && negative {
            return false;
        }
    }
    true
}

#[cfg(test)]
#[path = "scene_test.rs"]
mod tests;
