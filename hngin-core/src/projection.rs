/// Camera-space transform and perspective projection onto the raster
use nalgebra::{Matrix3, Point3, Vector3};

use crate::camera::Camera;

/// An integer pixel position with the origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Raster surface dimensions, used to move between Cartesian coordinates
/// (origin at the center, y up) and raster coordinates (origin top-left,
/// y down).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn half(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn cartesian_to_raster(&self, x: i32, y: i32) -> ScreenPoint {
        let (hw, hh) = self.half();
        ScreenPoint::new(x.saturating_add(hw), hh.saturating_sub(y))
    }

    pub fn raster_to_cartesian(&self, point: ScreenPoint) -> (i32, i32) {
        let (hw, hh) = self.half();
        (point.x.saturating_sub(hw), hh.saturating_sub(point.y))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

/// Per-frame projection state.
///
/// Captures the camera position and its cached rotation once, then maps
/// any number of world points onto the raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    origin: Point3<f64>,
    rotation: Matrix3<f64>,
    focal_length: f64,
    viewport: Viewport,
}

impl Projector {
    /// `camera` must have had its angle cache refreshed this frame.
    pub fn new(camera: &Camera, focal_length: f64, viewport: Viewport) -> Self {
        debug_assert!(
            camera.is_cache_current(),
            "camera angle cache is stale; call recompute_angle_cache first"
        );
        Self {
            origin: camera.position,
            rotation: camera.angle_cache().rotation(),
            focal_length,
            viewport,
        }
    }

    /// Camera position this projector was built from
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Translate and rotate `point` into camera space
    pub fn to_camera_space(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.rotation * (point - self.origin)
    }

    /// Project a world point onto the raster, or `None` if it is not in
    /// front of the camera.
    ///
    /// The perspective divide floors toward negative infinity.
    pub fn project(&self, point: &Point3<f64>) -> Option<ScreenPoint> {
        let rotated = self.to_camera_space(point);
        if rotated.z <= 0.0 {
            return None;
        }

        let x = floor_div(rotated.x * self.focal_length, rotated.z);
        let y = floor_div(rotated.y * self.focal_length, rotated.z);

        // `as` saturates, so points far off-screen stay representable
        Some(self.viewport.cartesian_to_raster(x as i32, y as i32))
    }

    /// Project every point, failing if any of them is not visible
    pub fn project_all<const N: usize>(&self, points: [&Point3<f64>; N]) -> Option<[ScreenPoint; N]> {
        let mut projected = [ScreenPoint::new(0, 0); N];
        for (slot, point) in projected.iter_mut().zip(points) {
            *slot = self.project(point)?;
        }
        Some(projected)
    }
}

/// Floored float division computed from the remainder, so a quotient that
/// only rounds up to an integer still floors below it.
fn floor_div(a: f64, b: f64) -> f64 {
    let rem = a % b;
    let mut div = (a - rem) / b;
    if rem != 0.0 && ((b < 0.0) != (rem < 0.0)) {
        div -= 1.0;
    }
    if div == 0.0 {
        return 0.0_f64.copysign(a / b);
    }
    let floored = div.floor();
    if div - floored > 0.5 {
        floored + 1.0
    } else {
        floored
    }
}
