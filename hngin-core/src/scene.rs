/// Scene models, their animations, and the TOML scene description
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::color::Rgb;
use crate::geometry::{FaceColoring, Mesh, MeshStyle};
use crate::obj::{load_obj, ObjError};
use crate::settings::InvalidSettingError;
use crate::transform::{Axis, Motion};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("model {model:?}: {source}")]
    Load {
        model: String,
        #[source]
        source: ObjError,
    },
    #[error("model {model:?}: {source}")]
    Color {
        model: String,
        #[source]
        source: InvalidSettingError,
    },
    #[error("failed to read scene file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Time-varying motion applied on top of a model's placement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Animation {
    #[default]
    Static,
    /// Turn about `axis` through the world origin at the model rotation speed
    Spin { axis: Axis },
    /// Breathe about `pivot`, scaled by |cos(2t / pulse frequency)|
    Pulse { pivot: Point3<f64> },
}

/// Per-frame animation inputs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationClock {
    pub delta_ms: f64,
    pub time_ms: f64,
    /// Radians per millisecond for `Spin`
    pub spin_rate: f64,
    /// Milliseconds scale for `Pulse`
    pub pulse_frequency: f64,
}

/// A named mesh placed in the scene.
///
/// The loaded `base` mesh is never modified; `mesh` is re-derived from it
/// whenever the placement or animation moves.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    base: Mesh,
    mesh: Mesh,
    placement: Motion,
    animation: Animation,
    spin_angle: f64,
    dirty: bool,
}

impl Model {
    pub fn new(name: impl Into<String>, base: Mesh, placement: Motion, animation: Animation) -> Self {
        let mut model = Self {
            name: name.into(),
            mesh: base.clone(),
            base,
            placement,
            animation,
            spin_angle: 0.0,
            dirty: true,
        };
        model.rederive();
        model
    }

    /// The mesh as currently placed and animated
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn base(&self) -> &Mesh {
        &self.base
    }

    pub fn set_placement(&mut self, placement: Motion) {
        if self.placement != placement {
            self.placement = placement;
            self.dirty = true;
        }
    }

    /// Swap in a freshly loaded base mesh, keeping placement and animation
    pub fn replace_base(&mut self, base: Mesh) {
        self.mesh = base.clone();
        self.base = base;
        self.dirty = true;
        self.rederive();
    }

    /// Step the animation and refresh the derived mesh if anything moved
    pub fn advance(&mut self, clock: &AnimationClock) {
        match self.animation {
            Animation::Static => {}
            Animation::Spin { .. } => {
                let step = clock.spin_rate * clock.delta_ms;
                if step != 0.0 {
                    self.spin_angle += step;
                    self.dirty = true;
                }
            }
            Animation::Pulse { .. } => self.dirty = true,
        }

        if self.dirty {
            let motion = self.placement.clone().then(self.animation_motion(clock.time_ms, clock.pulse_frequency));
            self.mesh.rederive_from(&self.base, &motion);
            self.dirty = false;
        }
    }

    fn rederive(&mut self) {
        let motion = self.placement.clone().then(self.animation_motion(0.0, 1.0));
        self.mesh.rederive_from(&self.base, &motion);
        self.dirty = false;
    }

    fn animation_motion(&self, time_ms: f64, pulse_frequency: f64) -> Motion {
        match &self.animation {
            Animation::Static => Motion::Identity,
            Animation::Spin { axis } => Motion::rotate(*axis, self.spin_angle),
            Animation::Pulse { pivot } => Motion::ScaleAbout {
                pivot: *pivot,
                factor: (2.0 * time_ms / pulse_frequency).cos().abs(),
            },
        }
    }
}

/// An ordered collection of models
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub models: Vec<Model>,
}

impl Scene {
    pub fn new(models: Vec<Model>) -> Self {
        Self { models }
    }

    pub fn push(&mut self, model: Model) -> usize {
        self.models.push(model);
        self.models.len() - 1
    }

    pub fn advance(&mut self, clock: &AnimationClock) {
        for model in &mut self.models {
            model.advance(clock);
        }
    }

    pub fn face_count(&self) -> usize {
        self.models.iter().map(|m| m.mesh().faces.len()).sum()
    }
}

/// One model entry of a scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub name: String,
    /// OBJ file; a 2-unit cube is used when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub color: String,
    #[serde(default)]
    pub style: MeshStyle,
    #[serde(default)]
    pub coloring: FaceColoring,
    #[serde(default)]
    pub placement: Motion,
    #[serde(default)]
    pub animation: Animation,
    /// Bound to the `modelPath` / `modelScale` settings
    #[serde(default)]
    pub live: bool,
}

impl ModelConfig {
    pub fn color(&self) -> Result<Rgb, SceneError> {
        Rgb::from_hex(&self.color).map_err(|source| SceneError::Color {
            model: self.name.clone(),
            source,
        })
    }

    /// Load the mesh for this entry from `path`, or the built-in cube
    pub fn load_mesh(&self, path: Option<&Path>) -> Result<Mesh, SceneError> {
        let color = self.color()?;
        match path {
            Some(path) => {
                let raw = load_obj(path).map_err(|source| SceneError::Load {
                    model: self.name.clone(),
                    source,
                })?;
                Ok(Mesh::from_raw(raw, self.style, self.coloring, color))
            }
            None => {
                let mut mesh = Mesh::cube(2.0, color);
                mesh.recolor(self.coloring);
                Ok(mesh)
            }
        }
    }
}

/// Scene description file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Point3<f64>,
    pub yaw: f64,
    pub vertical_angle: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 8.0, -50.0),
            yaw: 0.0,
            vertical_angle: 0.0,
        }
    }
}

impl SceneConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, SceneError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Cube, pyramid, pulsing icosahedron and a spinning user model
    pub fn demo(models_dir: impl AsRef<Path>) -> Self {
        let dir = models_dir.as_ref();
        let entry = |name: &str, color: Rgb, placement: Motion, animation: Animation| ModelConfig {
            name: name.to_string(),
            path: Some(dir.join(format!("{name}.obj"))),
            color: color.to_string(),
            style: MeshStyle::Solid,
            coloring: FaceColoring::Uniform,
            placement,
            animation,
            live: false,
        };

        let icosahedron_center = Point3::new(-13.0, 5.0, 8.0);
        Self {
            camera: CameraConfig::default(),
            models: vec![
                entry("cube", Rgb::BLUE, Motion::translate(9.0, 8.0, 6.0), Animation::Static),
                entry(
                    "pyramid",
                    Rgb::YELLOW,
                    Motion::scale(6.0).then(Motion::translate(-10.0, 8.0, 6.0)),
                    Animation::Static,
                ),
                entry(
                    "icosahedron",
                    Rgb::RED,
                    Motion::scale(3.0).then(Motion::Translate {
                        offset: icosahedron_center.coords,
                    }),
                    Animation::Pulse {
                        pivot: icosahedron_center,
                    },
                ),
                ModelConfig {
                    coloring: FaceColoring::Random { seed: 0x6e67 },
                    live: true,
                    ..entry("model", Rgb::GREEN, Motion::Identity, Animation::Spin { axis: Axis::Y })
                },
            ],
        }
    }
}
