/// Per-frame orchestration: settings, input, animation, render, present
use std::path::{Path, PathBuf};

use crate::camera::Camera;
use crate::geometry::Mesh;
use crate::input::{steer, InputState};
use crate::projection::{Projector, Viewport};
use crate::raster::FrameBuffer;
use crate::render::{RenderOptions, RenderStats};
use crate::scene::{AnimationClock, Model, ModelConfig, Scene, SceneConfig, SceneError};
use crate::settings::{RawSettings, Settings, SettingsTracker};
use crate::transform::Motion;

/// The scene model bound to the `modelPath` and `modelScale` settings
#[derive(Debug, Clone)]
struct LiveSlot {
    index: usize,
    config: ModelConfig,
    loaded_from: Option<PathBuf>,
}

impl LiveSlot {
    fn placement(&self, scale: f64) -> Motion {
        Motion::scale(scale).then(self.config.placement.clone())
    }

    /// First mesh for the slot: `modelPath`, then the entry's own path, then
    /// the built-in cube. Only a bad entry color is an error.
    fn initial_mesh(&mut self, model_path: &Path) -> Result<Mesh, SceneError> {
        match self.config.load_mesh(Some(model_path)) {
            Ok(mesh) => {
                self.loaded_from = Some(model_path.to_path_buf());
                return Ok(mesh);
            }
            Err(err) => log::warn!("live model {:?}: {err}", self.config.name),
        }
        if let Some(path) = &self.config.path {
            match self.config.load_mesh(Some(path)) {
                Ok(mesh) => return Ok(mesh),
                Err(err) => log::warn!("live model {:?}: {err}", self.config.name),
            }
        }
        self.config.load_mesh(None)
    }

    /// Load `path` into `model`. On failure the current mesh stays.
    fn reload(&mut self, model: &mut Model, path: &Path) -> bool {
        match self.config.load_mesh(Some(path)) {
            Ok(mesh) => {
                model.replace_base(mesh);
                self.loaded_from = Some(path.to_path_buf());
                true
            }
            Err(err) => {
                log::warn!("keeping current {:?} model: {err}", self.config.name);
                false
            }
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub render: RenderStats,
    pub rejected_settings: usize,
    pub model_reloaded: bool,
}

/// Drives one scene and camera frame by frame
pub struct FrameDriver {
    camera: Camera,
    scene: Scene,
    tracker: SettingsTracker,
    live: Option<LiveSlot>,
    viewport: Viewport,
    clock_ms: f64,
}

impl FrameDriver {
    pub fn new(camera: Camera, scene: Scene, viewport: Viewport) -> Self {
        Self {
            camera,
            scene,
            tracker: SettingsTracker::default(),
            live: None,
            viewport,
            clock_ms: 0.0,
        }
    }

    /// Build the scene a config describes. The first `live` entry is loaded
    /// from `modelPath` instead of its own path, falling back to its own
    /// path (or the built-in cube) if that fails.
    pub fn from_config(config: &SceneConfig, raw: &RawSettings, viewport: Viewport) -> Result<Self, SceneError> {
        let mut tracker = SettingsTracker::default();
        tracker.update(raw);
        let settings = tracker.current();

        let camera = Camera::with_angles(config.camera.position, config.camera.yaw, config.camera.vertical_angle);
        let mut scene = Scene::default();
        let mut live = None;

        for entry in &config.models {
            if entry.live && live.is_none() {
                let mut slot = LiveSlot {
                    index: scene.models.len(),
                    config: entry.clone(),
                    loaded_from: None,
                };
                let mesh = slot.initial_mesh(&settings.model_path)?;
                scene.push(Model::new(
                    entry.name.clone(),
                    mesh,
                    slot.placement(settings.model_scale),
                    entry.animation.clone(),
                ));
                live = Some(slot);
            } else {
                let mesh = entry.load_mesh(entry.path.as_deref())?;
                scene.push(Model::new(entry.name.clone(), mesh, entry.placement.clone(), entry.animation.clone()));
            }
        }

        log::info!(
            "scene ready: {} models, {} faces",
            scene.models.len(),
            scene.face_count()
        );

        Ok(Self {
            camera,
            scene,
            tracker,
            live,
            viewport,
            clock_ms: 0.0,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn settings(&self) -> &Settings {
        self.tracker.current()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Path the live model was last loaded from, if any load succeeded
    pub fn live_model_path(&self) -> Option<&Path> {
        self.live.as_ref().and_then(|slot| slot.loaded_from.as_deref())
    }

    /// Run one frame.
    ///
    /// Settings are applied first, then the camera moves and models are
    /// reloaded or re-derived, the angle cache is refreshed, and the scene
    /// is drawn and presented.
    pub fn tick<F: FrameBuffer>(
        &mut self,
        raw: &RawSettings,
        input: &InputState,
        delta_ms: f64,
        target: &mut F,
    ) -> Result<FrameStats, F::Error> {
        let update = self.tracker.update(raw);
        let settings = self.tracker.current();
        let mut stats = FrameStats {
            rejected_settings: update.rejected.len(),
            ..FrameStats::default()
        };

        if update.changed.background_color {
            log::info!("background color now {}", settings.background_color);
        }

        steer(
            &mut self.camera,
            input,
            settings.camera_speed,
            settings.camera_rotation_speed,
            delta_ms,
        );

        if let Some(slot) = &mut self.live {
            let model = &mut self.scene.models[slot.index];
            if update.changed.model_path {
                stats.model_reloaded = slot.reload(model, &settings.model_path);
            }
            if update.changed.model_scale {
                model.set_placement(slot.placement(settings.model_scale));
            }
        }

        self.clock_ms += delta_ms;
        self.scene.advance(&AnimationClock {
            delta_ms,
            time_ms: self.clock_ms,
            spin_rate: settings.model_rotation_speed,
            pulse_frequency: settings.pulse_frequency,
        });

        self.camera.recompute_angle_cache();
        let projector = Projector::new(&self.camera, settings.focal_length, self.viewport);
        let options = RenderOptions::from_settings(settings);

        target.clear(settings.background_color);
        stats.render = self.scene.render(&projector, &options, target);
        target.present()?;

        log::debug!("frame: {:?}", stats);
        Ok(stats)
    }
}
