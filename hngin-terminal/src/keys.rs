/// Terminal key events to held-key state
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, ModifierKeyCode};
use hngin_core::{InputState, Key};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a key counts as held after its last press or repeat, for
/// terminals that never report releases
const HOLD_WINDOW: Duration = Duration::from_millis(500);

/// What a key event asked the application to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Steer,
    Quit,
    Ignored,
}

pub fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Left => Key::StrafeLeft,
        KeyCode::Right => Key::StrafeRight,
        KeyCode::Up => Key::Forward,
        KeyCode::Down => Key::Back,
        KeyCode::Char(' ') => Key::Ascend,
        KeyCode::Modifier(ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift) => Key::Descend,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'a' => Key::YawLeft,
            'd' => Key::YawRight,
            'w' => Key::PitchUp,
            's' => Key::PitchDown,
            'c' => Key::Descend,
            _ => return None,
        },
        _ => return None,
    };
    Some(key)
}

/// Tracks which steering keys are held.
///
/// With release reporting every key stays held until its release event.
/// Without it, presses and auto-repeats keep a key alive for `HOLD_WINDOW`.
pub struct KeyTracker {
    reports_release: bool,
    held: HashMap<Key, Instant>,
}

impl KeyTracker {
    pub fn new(reports_release: bool) -> Self {
        Self {
            reports_release,
            held: HashMap::new(),
        }
    }

    pub fn handle(&mut self, event: KeyEvent, now: Instant) -> KeyAction {
        if matches!(event.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q')) {
            return if event.kind == KeyEventKind::Release {
                KeyAction::Ignored
            } else {
                KeyAction::Quit
            };
        }

        let Some(key) = map_key(event.code) else {
            return KeyAction::Ignored;
        };
        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.held.insert(key, now);
            }
            KeyEventKind::Release => {
                self.held.remove(&key);
            }
        }
        KeyAction::Steer
    }

    /// Drop everything, e.g. when the terminal loses focus
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn state(&mut self, now: Instant) -> InputState {
        if !self.reports_release {
            self.held
                .retain(|_, pressed| now.saturating_duration_since(*pressed) < HOLD_WINDOW);
        }
        self.held.keys().copied().collect()
    }
}
