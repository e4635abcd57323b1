/// Held-key state and camera steering
use std::collections::HashSet;

use crate::camera::Camera;

/// The keys the camera responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    StrafeLeft,
    StrafeRight,
    Forward,
    Back,
    YawLeft,
    YawRight,
    PitchUp,
    PitchDown,
    /// Modifier: rise straight up
    Ascend,
    /// Modifier: sink straight down
    Descend,
}

/// Keys held during the current frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    held: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_idle(&self) -> bool {
        self.held.is_empty()
    }
}

impl FromIterator<Key> for InputState {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            held: iter.into_iter().collect(),
        }
    }
}

/// Move and turn `camera` for `delta_ms` milliseconds of held keys.
///
/// `speed` is in world units per millisecond and `turn_rate` in radians per
/// millisecond. Strafing and walking are relative to the current yaw.
/// The angle cache is left stale.
pub fn steer(camera: &mut Camera, input: &InputState, speed: f64, turn_rate: f64, delta_ms: f64) {
    if input.is_idle() {
        return;
    }

    let step = speed * delta_ms;
    let turn = turn_rate * delta_ms;
    let (sin_yaw, cos_yaw) = camera.yaw.sin_cos();
    let climb = camera.vertical_angle.sin();
    let position = &mut camera.position;

    if input.is_held(Key::StrafeLeft) {
        position.x -= cos_yaw * step;
        position.z -= sin_yaw * step;
    }
    if input.is_held(Key::StrafeRight) {
        position.x += cos_yaw * step;
        position.z += sin_yaw * step;
    }
    if input.is_held(Key::Forward) {
        position.x -= sin_yaw * step;
        position.y += climb * step;
        position.z += cos_yaw * step;
    }
    if input.is_held(Key::Back) {
        position.x += sin_yaw * step;
        position.y -= climb * step;
        position.z -= cos_yaw * step;
    }
    if input.is_held(Key::Ascend) {
        position.y += step;
    }
    if input.is_held(Key::Descend) {
        position.y -= step;
    }

    if input.is_held(Key::YawLeft) {
        camera.yaw += turn;
    }
    if input.is_held(Key::YawRight) {
        camera.yaw -= turn;
    }
    if input.is_held(Key::PitchUp) {
        camera.vertical_angle += turn;
    }
    if input.is_held(Key::PitchDown) {
        camera.vertical_angle -= turn;
    }
}
