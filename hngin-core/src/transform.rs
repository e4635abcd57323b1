/// Rigid and scaling motions applied to mesh vertices
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// Coordinate axis used for rotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

/// A vertex motion, applied by [`apply`].
///
/// Motions are plain data so they can be stored in scene files and compared
/// in tests. `Sequence` applies its steps left to right.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Motion {
    #[default]
    Identity,
    Translate { offset: Vector3<f64> },
    Scale { factor: f64 },
    ScaleAbout { pivot: Point3<f64>, factor: f64 },
    Rotate { axis: Axis, angle: f64 },
    Sequence { steps: Vec<Motion> },
}

impl Motion {
    pub fn translate(x: f64, y: f64, z: f64) -> Self {
        Motion::Translate {
            offset: Vector3::new(x, y, z),
        }
    }

    pub fn scale(factor: f64) -> Self {
        Motion::Scale { factor }
    }

    pub fn rotate(axis: Axis, angle: f64) -> Self {
        Motion::Rotate { axis, angle }
    }

    /// `self` followed by `next`
    pub fn then(self, next: Motion) -> Self {
        match (self, next) {
            (Motion::Identity, next) => next,
            (this, Motion::Identity) => this,
            (Motion::Sequence { mut steps }, next) => {
                steps.push(next);
                Motion::Sequence { steps }
            }
            (this, next) => Motion::Sequence {
                steps: vec![this, next],
            },
        }
    }
}

/// Compute the new position of `vertex` under `motion`
pub fn apply(motion: &Motion, vertex: &Point3<f64>) -> Point3<f64> {
    match motion {
        Motion::Identity => *vertex,
        Motion::Translate { offset } => vertex + offset,
        Motion::Scale { factor } => Point3::from(vertex.coords * *factor),
        Motion::ScaleAbout { pivot, factor } => pivot + (vertex - pivot) * *factor,
        Motion::Rotate { axis, angle } => Rotation3::from_axis_angle(&axis.unit(), *angle) * vertex,
        Motion::Sequence { steps } => steps.iter().fold(*vertex, |v, step| apply(step, &v)),
    }
}
