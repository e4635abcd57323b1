/// Live render settings: raw snapshots, validation, and last-good tracking
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::color::Rgb;

/// A live value that could not be used; the previous value stays in effect
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidSettingError {
    #[error("invalid color {value:?}, expected #rrggbb")]
    Color { value: String },
    #[error("{name} must be a finite number >= {min}, got {value}")]
    Number {
        name: &'static str,
        value: f64,
        min: f64,
    },
    #[error("model path is empty")]
    EmptyPath,
}

#[derive(Debug, Error)]
pub enum SettingsFileError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings exactly as the settings collaborator reports them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSettings {
    #[serde(rename = "maxFPS")]
    pub max_fps: u32,
    pub focal_length: f64,
    pub vertex_size: u32,
    pub camera_speed: f64,
    pub camera_rotation_speed: f64,
    pub model_scale: f64,
    pub model_rotation_speed: f64,
    pub hollow_faces: bool,
    pub direct_illumination: bool,
    pub light_intensity: f64,
    pub background_color: String,
    pub model_path: String,
    pub depth_sort: bool,
    pub pulse_frequency: f64,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            max_fps: 30,
            focal_length: 1000.0,
            vertex_size: 1,
            camera_speed: 0.05,
            camera_rotation_speed: 0.0003,
            model_scale: 0.75,
            model_rotation_speed: 0.0003,
            hollow_faces: false,
            direct_illumination: false,
            light_intensity: 10_000.0,
            background_color: "#000000".to_string(),
            model_path: "models/icosahedron.obj".to_string(),
            depth_sort: true,
            pulse_frequency: 4000.0,
        }
    }
}

impl RawSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsFileError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsFileError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// A validated settings snapshot, passed into each frame
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub max_fps: u32,
    pub focal_length: f64,
    pub vertex_size: u32,
    pub camera_speed: f64,
    pub camera_rotation_speed: f64,
    pub model_scale: f64,
    pub model_rotation_speed: f64,
    pub hollow_faces: bool,
    pub direct_illumination: bool,
    pub light_intensity: f64,
    pub background_color: Rgb,
    pub model_path: PathBuf,
    pub depth_sort: bool,
    pub pulse_frequency: f64,
}

impl Default for Settings {
    fn default() -> Self {
        let raw = RawSettings::default();
        Self {
            max_fps: raw.max_fps,
            focal_length: raw.focal_length,
            vertex_size: raw.vertex_size,
            camera_speed: raw.camera_speed,
            camera_rotation_speed: raw.camera_rotation_speed,
            model_scale: raw.model_scale,
            model_rotation_speed: raw.model_rotation_speed,
            hollow_faces: raw.hollow_faces,
            direct_illumination: raw.direct_illumination,
            light_intensity: raw.light_intensity,
            background_color: Rgb::BLACK,
            model_path: PathBuf::from(raw.model_path),
            depth_sort: raw.depth_sort,
            pulse_frequency: raw.pulse_frequency,
        }
    }
}

pub fn parse_number(name: &'static str, value: f64, min: f64) -> Result<f64, InvalidSettingError> {
    if value.is_finite() && value >= min {
        Ok(value)
    } else {
        Err(InvalidSettingError::Number { name, value, min })
    }
}

/// Like [`parse_number`] but zero is also rejected
pub fn parse_positive(name: &'static str, value: f64) -> Result<f64, InvalidSettingError> {
    match parse_number(name, value, 0.0)? {
        v if v > 0.0 => Ok(v),
        _ => Err(InvalidSettingError::Number { name, value, min: f64::MIN_POSITIVE }),
    }
}

pub fn parse_color(text: &str) -> Result<Rgb, InvalidSettingError> {
    Rgb::from_hex(text)
}

pub fn parse_model_path(text: &str) -> Result<PathBuf, InvalidSettingError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(InvalidSettingError::EmptyPath)
    } else {
        Ok(PathBuf::from(trimmed))
    }
}

/// Which dependent values changed in an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changed {
    pub model_path: bool,
    pub model_scale: bool,
    pub background_color: bool,
}

/// Result of applying one raw snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub changed: Changed,
    /// Values rejected in this update; each bad raw value is reported once
    pub rejected: Vec<InvalidSettingError>,
}

/// Applies raw snapshots, keeping the last good value of every field
#[derive(Debug, Clone)]
pub struct SettingsTracker {
    current: Settings,
    last_seen: Option<RawSettings>,
}

impl SettingsTracker {
    pub fn new(initial: Settings) -> Self {
        Self {
            current: initial,
            last_seen: None,
        }
    }

    pub fn current(&self) -> &Settings {
        &self.current
    }

    pub fn update(&mut self, raw: &RawSettings) -> SettingsUpdate {
        let mut update = SettingsUpdate::default();
        let seen = self.last_seen.take();

        // Plain fields cannot be malformed
        let current = &mut self.current;
        current.max_fps = raw.max_fps;
        current.vertex_size = raw.vertex_size;
        current.hollow_faces = raw.hollow_faces;
        current.direct_illumination = raw.direct_illumination;
        current.depth_sort = raw.depth_sort;

        macro_rules! number {
            ($field:ident, $parse:expr) => {
                if seen.as_ref().map_or(true, |s| s.$field.to_bits() != raw.$field.to_bits()) {
                    match $parse {
                        Ok(value) => {
                            if current.$field != value {
                                current.$field = value;
                                true
                            } else {
                                false
                            }
                        }
                        Err(err) => {
                            update.rejected.push(err);
                            false
                        }
                    }
                } else {
                    false
                }
            };
        }

        number!(focal_length, parse_number("focalLength", raw.focal_length, 0.0));
        update.changed.model_scale = number!(model_scale, parse_number("modelScale", raw.model_scale, 0.0));
        number!(camera_speed, parse_number("cameraSpeed", raw.camera_speed, 0.0));
        number!(
            camera_rotation_speed,
            parse_number("cameraRotationSpeed", raw.camera_rotation_speed, 0.0)
        );
        number!(
            model_rotation_speed,
            parse_number("modelRotationSpeed", raw.model_rotation_speed, 0.0)
        );
        number!(light_intensity, parse_number("lightIntensity", raw.light_intensity, 0.0));
        number!(pulse_frequency, parse_positive("pulseFrequency", raw.pulse_frequency));

        if seen.as_ref().map_or(true, |s| s.background_color != raw.background_color) {
            match parse_color(&raw.background_color) {
                Ok(color) => {
                    update.changed.background_color = current.background_color != color;
                    current.background_color = color;
                }
                Err(err) => update.rejected.push(err),
            }
        }

        if seen.as_ref().map_or(true, |s| s.model_path != raw.model_path) {
            match parse_model_path(&raw.model_path) {
                Ok(path) => {
                    update.changed.model_path = current.model_path != path;
                    current.model_path = path;
                }
                Err(err) => update.rejected.push(err),
            }
        }

        for err in &update.rejected {
            log::warn!("keeping previous setting: {err}");
        }

        self.last_seen = Some(raw.clone());
        update
    }
}

impl Default for SettingsTracker {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

/// Source of live settings, polled once per frame
pub trait SettingsProvider {
    fn poll(&mut self) -> RawSettings;
}

/// A provider that always reports the same snapshot
#[derive(Debug, Clone, Default)]
pub struct FixedSettings(pub RawSettings);

impl SettingsProvider for FixedSettings {
    fn poll(&mut self) -> RawSettings {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let mut tracker = SettingsTracker::default();
        let update = tracker.update(&RawSettings::default());
        assert!(update.rejected.is_empty());
        assert_eq!(update.changed, Changed::default());
        assert_eq!(tracker.current(), &Settings::default());
    }

    #[test]
    fn test_parse_from_toml_with_defaults() {
        let raw = RawSettings::from_toml_str(
            r##"
            maxFPS = 60
            focalLength = 250.0
            backgroundColor = "#102030"
            hollowFaces = true
            "##,
        )
        .unwrap();
        assert_eq!(raw.max_fps, 60);
        assert_eq!(raw.focal_length, 250.0);
        assert!(raw.hollow_faces);
        assert_eq!(raw.model_path, RawSettings::default().model_path);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(matches!(
            RawSettings::from_toml_str("focalLength = \"wide\""),
            Err(SettingsFileError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_color_keeps_previous() {
        let mut tracker = SettingsTracker::default();
        let mut raw = RawSettings {
            background_color: "#336699".to_string(),
            ..RawSettings::default()
        };
        let update = tracker.update(&raw);
        assert!(update.changed.background_color);
        assert_eq!(tracker.current().background_color, Rgb::new(0x33, 0x66, 0x99));

        raw.background_color = "#3366".to_string();
        let update = tracker.update(&raw);
        assert_eq!(update.rejected.len(), 1);
        assert!(!update.changed.background_color);
        assert_eq!(tracker.current().background_color, Rgb::new(0x33, 0x66, 0x99));

        // the same bad value is not reported again
        assert!(tracker.update(&raw).rejected.is_empty());
    }

    #[test]
    fn test_invalid_numbers_keep_previous() {
        let mut tracker = SettingsTracker::default();
        let raw = RawSettings {
            focal_length: f64::NAN,
            model_scale: -1.0,
            pulse_frequency: 0.0,
            ..RawSettings::default()
        };
        let update = tracker.update(&raw);
        assert_eq!(update.rejected.len(), 3);
        assert_eq!(tracker.current().focal_length, 1000.0);
        assert_eq!(tracker.current().model_scale, 0.75);
        assert_eq!(tracker.current().pulse_frequency, 4000.0);
    }

    #[test]
    fn test_change_detection_compares_to_last_seen() {
        let mut tracker = SettingsTracker::default();
        let mut raw = RawSettings::default();
        tracker.update(&raw);

        raw.model_path = "models/cube.obj".to_string();
        raw.model_scale = 2.0;
        let update = tracker.update(&raw);
        assert!(update.changed.model_path);
        assert!(update.changed.model_scale);
        assert_eq!(tracker.current().model_path, PathBuf::from("models/cube.obj"));

        let update = tracker.update(&raw);
        assert_eq!(update.changed, Changed::default());
    }

    #[test]
    fn test_empty_path_rejected() {
        let mut tracker = SettingsTracker::default();
        let raw = RawSettings {
            model_path: "   ".to_string(),
            ..RawSettings::default()
        };
        let update = tracker.update(&raw);
        assert_eq!(update.rejected, vec![InvalidSettingError::EmptyPath]);
        assert_eq!(tracker.current().model_path, Settings::default().model_path);
    }

    #[test]
    fn test_fixed_provider() {
        let mut provider = FixedSettings(RawSettings {
            vertex_size: 4,
            ..RawSettings::default()
        });
        assert_eq!(provider.poll().vertex_size, 4);
    }
}
