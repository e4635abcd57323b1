/// Movable, rotatable camera with a per-frame trigonometry cache
use nalgebra::{Matrix3, Point3};

/// Sine and cosine of one angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trig {
    pub sin: f64,
    pub cos: f64,
}

impl Trig {
    pub fn of(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { sin, cos }
    }
}

impl Default for Trig {
    fn default() -> Self {
        Self::of(0.0)
    }
}

/// The six ratios {sin, cos} × {θx, θy, θz}, keyed by axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngleCache {
    pub x: Trig,
    pub y: Trig,
    pub z: Trig,
}

impl AngleCache {
    pub fn new(theta_x: f64, theta_y: f64, theta_z: f64) -> Self {
        Self {
            x: Trig::of(theta_x),
            y: Trig::of(theta_y),
            z: Trig::of(theta_z),
        }
    }

    /// World-to-camera rotation `Rz(θz) · Ry(θx) · Rx(θy)`.
    ///
    /// θx is yaw and turns about the vertical axis, θy pitches about X and
    /// θz rolls about the view axis.
    #[rustfmt::skip]
    pub fn rotation(&self) -> Matrix3<f64> {
        let (sa, ca) = (self.y.sin, self.y.cos);
        let (sb, cb) = (self.x.sin, self.x.cos);
        let (sc, cc) = (self.z.sin, self.z.cos);

        Matrix3::new(
            cb * cc, sa * sb * cc - sc * ca, sb * ca * cc + sa * sc,
            sc * cb, sa * sb * sc + ca * cc, sb * sc * ca - sa * cc,
            -sb,     sa * cb,                ca * cb,
        )
    }
}

/// Camera pose.
///
/// Pitch is stored as a single `vertical_angle` and split between θy and
/// θz according to the current yaw, so "up" stays relative to the facing
/// direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f64>,
    /// θx
    pub yaw: f64,
    pub vertical_angle: f64,
    cache: AngleCache,
    cached_pose: (f64, f64),
}

impl Camera {
    pub fn new(position: Point3<f64>) -> Self {
        Self::with_angles(position, 0.0, 0.0)
    }

    pub fn with_angles(position: Point3<f64>, yaw: f64, vertical_angle: f64) -> Self {
        let mut camera = Self {
            position,
            yaw,
            vertical_angle,
            cache: AngleCache::default(),
            cached_pose: (f64::NAN, f64::NAN),
        };
        camera.recompute_angle_cache();
        camera
    }

    pub fn theta_x(&self) -> f64 {
        self.yaw
    }

    pub fn theta_y(&self) -> f64 {
        self.vertical_angle * self.yaw.cos()
    }

    pub fn theta_z(&self) -> f64 {
        self.vertical_angle * self.yaw.sin()
    }

    /// Refresh the cached trig ratios. Call once per frame after the pose
    /// changes and before projecting anything.
    pub fn recompute_angle_cache(&mut self) {
        self.cache = AngleCache::new(self.theta_x(), self.theta_y(), self.theta_z());
        self.cached_pose = (self.yaw, self.vertical_angle);
    }

    pub fn angle_cache(&self) -> &AngleCache {
        &self.cache
    }

    /// Whether the cache reflects the current angles
    pub fn is_cache_current(&self) -> bool {
        self.cached_pose == (self.yaw, self.vertical_angle)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 8.0, -50.0))
    }
}
