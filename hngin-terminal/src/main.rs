/// hngin terminal renderer
///
/// Usage: hngin-terminal [settings.toml] [scene.toml]
///
/// Without a scene file the demo scene is loaded from `models/`. A file
/// watcher re-reads the settings file whenever it changes; the log goes to
/// `hngin-terminal.log` (filter with RUST_LOG).
/// Controls:
///   - Arrow keys: move
///   - A/D: yaw, W/S: pitch
///   - Space / Shift (or C): up / down
///   - Q/ESC: Quit
use anyhow::{Context, Result};
use env_logger::{Env, Target};
use hngin_core::{FrameDriver, SceneConfig, SettingsProvider, Viewport};
use hngin_terminal::{SettingsFile, TerminalApp};
use std::fs::File;
use std::path::Path;

const LOG_FILE: &str = "hngin-terminal.log";
const DEFAULT_SETTINGS: &str = "hngin.toml";

fn main() -> Result<()> {
    let log = File::create(LOG_FILE).with_context(|| format!("creating {LOG_FILE}"))?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(log)))
        .init();

    let mut args = std::env::args().skip(1);
    let mut settings = match args.next() {
        Some(path) => SettingsFile::new(path),
        None if Path::new(DEFAULT_SETTINGS).exists() => SettingsFile::new(DEFAULT_SETTINGS),
        None => SettingsFile::defaults(),
    };
    match settings.path() {
        Some(path) if !settings.is_watching() => {
            log::warn!("{} is read once; later edits are not picked up", path.display())
        }
        Some(path) => log::info!("watching {} for settings changes", path.display()),
        None => log::info!("using built-in settings"),
    }
    let scene = match args.next() {
        Some(path) => SceneConfig::from_file(&path).with_context(|| format!("loading scene {path}"))?,
        None => SceneConfig::demo("models"),
    };

    let driver = FrameDriver::from_config(&scene, &settings.poll(), Viewport::default())
        .context("building scene")?;

    let mut app = TerminalApp::new(driver, settings)?;
    app.run()?;

    println!("hngin: log written to {LOG_FILE}");
    Ok(())
}
