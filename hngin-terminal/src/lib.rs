/// Terminal front end for the hngin renderer
use crossterm::{
    cursor,
    event::{self, Event, KeyboardEnhancementFlags, PushKeyboardEnhancementFlags, PopKeyboardEnhancementFlags},
    execute,
    terminal::{self},
};
use hngin_core::{FrameDriver, SettingsProvider};
use std::io::{self, stdout, Stdout};
use std::time::{Duration, Instant};

pub mod canvas;
pub mod config;
pub mod keys;

pub use canvas::TerminalCanvas;
pub use config::SettingsFile;
pub use keys::{KeyAction, KeyTracker};

/// Frame budget for a `maxFPS` value; zero means uncapped
pub fn frame_budget(max_fps: u32) -> Option<Duration> {
    (max_fps > 0).then(|| Duration::from_secs_f64(1.0 / max_fps as f64))
}

/// Main application struct for terminal rendering
pub struct TerminalApp<P: SettingsProvider> {
    driver: FrameDriver,
    settings: P,
    canvas: TerminalCanvas<Stdout>,
    keys: KeyTracker,
    running: bool,
    last_tick: Instant,
    last_report: Instant,
    frame_count: u32,
    fps: f32,
}

impl<P: SettingsProvider> TerminalApp<P> {
    pub fn new(mut driver: FrameDriver, settings: P) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let canvas = TerminalCanvas::new(stdout(), columns, rows);
        driver.set_viewport(canvas.viewport());
        let now = Instant::now();

        Ok(Self {
            driver,
            settings,
            canvas,
            keys: KeyTracker::new(false),
            running: true,
            last_tick: now,
            last_report: now,
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        // Release events are only reported under the keyboard enhancement protocol
        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                )
            )?;
        }
        self.keys = KeyTracker::new(enhanced);
        log::info!("terminal input reports key releases: {enhanced}");

        let result = self.main_loop();

        // Cleanup
        if enhanced {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let frame_start = Instant::now();

            let raw = self.settings.poll();
            let delta_ms = frame_start.duration_since(self.last_tick).as_secs_f64() * 1000.0;
            self.last_tick = frame_start;

            self.canvas.set_overlay(self.hud());
            let input = self.keys.state(frame_start);
            let stats = self.driver.tick(&raw, &input, delta_ms, &mut self.canvas)?;
            if stats.rejected_settings > 0 {
                log::warn!("{} settings rejected this frame", stats.rejected_settings);
            }

            self.handle_input()?;

            // Frame timing
            self.frame_count += 1;
            if let Some(budget) = frame_budget(self.driver.settings().max_fps) {
                let elapsed = frame_start.elapsed();
                if elapsed < budget {
                    std::thread::sleep(budget - elapsed);
                }
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_report).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_report).as_secs_f32();
                self.frame_count = 0;
                self.last_report = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => {
                    if self.keys.handle(key, Instant::now()) == KeyAction::Quit {
                        self.running = false;
                    }
                }
                Event::Resize(columns, rows) => {
                    self.canvas.resize(columns, rows);
                    self.driver.set_viewport(self.canvas.viewport());
                    log::debug!("resized to {columns}x{rows}");
                }
                Event::FocusLost => self.keys.release_all(),
                _ => {}
            }
        }
        Ok(())
    }

    fn hud(&self) -> Vec<String> {
        let camera = self.driver.camera();
        let p = camera.position;
        vec![
            format!(
                "hngin | FPS: {:.1} | pos ({:.1}, {:.1}, {:.1}) | θx {:.2} θy {:.2} θz {:.2}",
                self.fps,
                p.x,
                p.y,
                p.z,
                camera.theta_x(),
                camera.theta_y(),
                camera.theta_z()
            ),
            "arrows move | a/d yaw | w/s pitch | space up | shift/c down | q quit".to_string(),
        ]
    }
}
