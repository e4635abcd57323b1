/// Settings read from a TOML file and re-read whenever it changes on disk
use hngin_core::{RawSettings, SettingsProvider};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

/// File-backed settings source.
///
/// A `notify` watcher on the file's directory feeds a channel; `poll` drains
/// it and parses the file again only after a create or modify event for it.
/// A file that fails to read or parse leaves the previous snapshot in place.
pub struct SettingsFile {
    path: Option<PathBuf>,
    watcher: Option<RecommendedWatcher>,
    events: Option<Receiver<notify::Result<Event>>>,
    snapshot: RawSettings,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (watcher, events) = match watch(&path) {
            Ok((watcher, events)) => (Some(watcher), Some(events)),
            Err(err) => {
                log::warn!("not watching {}: {err}", path.display());
                (None, None)
            }
        };

        let mut file = Self {
            path: Some(path),
            watcher,
            events,
            snapshot: RawSettings::default(),
        };
        file.reload();
        file
    }

    /// Built-in defaults only
    pub fn defaults() -> Self {
        Self {
            path: None,
            watcher: None,
            events: None,
            snapshot: RawSettings::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    fn reload(&mut self) {
        let Some(path) = &self.path else {
            return;
        };
        match RawSettings::from_file(path) {
            Ok(raw) => {
                log::info!("loaded settings from {}", path.display());
                self.snapshot = raw;
            }
            Err(err) => log::warn!("ignoring settings file {}: {err}", path.display()),
        }
    }

    fn targets(&self, event: &Event) -> bool {
        let Some(name) = self.path.as_deref().and_then(Path::file_name) else {
            return false;
        };
        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            && event.paths.iter().any(|p| p.file_name() == Some(name))
    }

    /// Re-read the file once if any of `events` touched it
    fn apply_events(&mut self, events: impl IntoIterator<Item = Event>) -> bool {
        let touched = events.into_iter().fold(false, |hit, event| hit | self.targets(&event));
        if touched {
            self.reload();
        }
        touched
    }
}

impl SettingsProvider for SettingsFile {
    fn poll(&mut self) -> RawSettings {
        let pending: Vec<Event> = match &self.events {
            Some(events) => events
                .try_iter()
                .filter_map(|res| res.map_err(|err| log::warn!("settings watcher: {err}")).ok())
                .collect(),
            None => Vec::new(),
        };
        self.apply_events(pending);
        self.snapshot.clone()
    }
}

/// Watch the directory holding `path`, so editors that replace the file on
/// save are still seen
fn watch(path: &Path) -> notify::Result<(RecommendedWatcher, Receiver<notify::Result<Event>>)> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind};
    use std::fs;

    fn temp_settings(name: &str, text: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("hngin-settings-{}-{name}.toml", std::process::id()));
        fs::write(&path, text).unwrap();
        path
    }

    /// A settings file that only sees the events a test feeds it
    fn detached(path: &Path) -> SettingsFile {
        let mut settings = SettingsFile::new(path);
        settings.watcher = None;
        settings.events = None;
        settings
    }

    fn modified(path: &Path) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path.to_path_buf())
    }

    #[test]
    fn test_defaults_without_file() {
        let mut settings = SettingsFile::defaults();
        assert_eq!(settings.poll(), RawSettings::default());
        assert!(settings.path().is_none());
        assert!(!settings.is_watching());
    }

    #[test]
    fn test_reads_file_on_creation() {
        let path = temp_settings("read", "focalLength = 200\nmaxFPS = 60\n");
        let mut settings = SettingsFile::new(&path);
        let raw = settings.poll();
        assert_eq!(raw.focal_length, 200.0);
        assert_eq!(raw.max_fps, 60);
        assert_eq!(raw.model_scale, RawSettings::default().model_scale);
    }

    #[test]
    fn test_back_to_back_saves_are_both_loaded() {
        let path = temp_settings("saves", "focalLength = 100\n");
        let mut settings = detached(&path);
        assert_eq!(settings.poll().focal_length, 100.0);

        fs::write(&path, "focalLength = 200\n").unwrap();
        assert!(settings.apply_events([modified(&path)]));
        assert_eq!(settings.poll().focal_length, 200.0);

        fs::write(&path, "focalLength = 300\n").unwrap();
        assert!(settings.apply_events([modified(&path)]));
        assert_eq!(settings.poll().focal_length, 300.0);
    }

    #[test]
    fn test_only_create_and_modify_of_the_file_reload() {
        let path = temp_settings("events", "focalLength = 100\n");
        let mut settings = detached(&path);

        fs::write(&path, "focalLength = 999\n").unwrap();
        let other = path.with_file_name("unrelated.toml");
        let access = Event::new(EventKind::Access(AccessKind::Any)).add_path(path.clone());
        assert!(!settings.apply_events([modified(&other), access]));
        assert_eq!(settings.poll().focal_length, 100.0);

        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(path.clone());
        assert!(settings.apply_events([created]));
        assert_eq!(settings.poll().focal_length, 999.0);
    }

    #[test]
    fn test_broken_file_keeps_previous_snapshot() {
        let path = temp_settings("broken", "focalLength = 321\n");
        let mut settings = detached(&path);
        assert_eq!(settings.poll().focal_length, 321.0);

        fs::write(&path, "focalLength = [").unwrap();
        settings.apply_events([modified(&path)]);
        assert_eq!(settings.poll().focal_length, 321.0);
    }

    #[test]
    fn test_bundled_settings_file_is_valid() {
        let raw = RawSettings::from_toml_str(include_str!("../../hngin.toml")).unwrap();
        let mut tracker = hngin_core::SettingsTracker::default();
        assert!(tracker.update(&raw).rejected.is_empty());
        assert_eq!(tracker.current().focal_length, 120.0);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let mut settings = SettingsFile::new("/no/such/hngin.toml");
        assert!(!settings.is_watching());
        assert_eq!(settings.poll(), RawSettings::default());
    }
}
