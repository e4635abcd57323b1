/// RGB colors and the face illumination model
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::InvalidSettingError;

/// An 8-bit-per-channel RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb` (case-insensitive).
    pub fn from_hex(text: &str) -> Result<Self, InvalidSettingError> {
        let invalid = || InvalidSettingError::Color {
            value: text.to_string(),
        };

        let digits = text.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Multiply every channel by `factor`, saturating at 255.
    pub fn scaled(self, factor: f64) -> Self {
        let scale = |c: u8| (c as f64 * factor).clamp(0.0, 255.0) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Inverse-square face tint.
///
/// Each channel is scaled by `intensity / distance²` and clamped to 255.
/// A zero distance (camera sitting on the face center) or any non-finite
/// factor yields `Rgb::WHITE` instead.
pub fn illuminate(color: Rgb, intensity: f64, distance: f64) -> Rgb {
    let squared = distance * distance;
    if squared == 0.0 {
        return Rgb::WHITE;
    }

    let factor = intensity / squared;
    if !factor.is_finite() {
        return Rgb::WHITE;
    }

    color.scaled(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::from_hex("#ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(Rgb::from_hex("00FF00").unwrap(), Rgb::GREEN);
        assert_eq!(Rgb::from_hex(" #000000 ").unwrap(), Rgb::BLACK);
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        for text in ["", "#fff", "#gg0000", "#12345678", "#ééé"] {
            assert!(Rgb::from_hex(text).is_err(), "{text:?} should be rejected");
        }
    }

    #[test]
    fn test_display_round_trips() {
        let color = Rgb::new(18, 52, 86);
        assert_eq!(color.to_string(), "#123456");
        assert_eq!(Rgb::from_hex(&color.to_string()).unwrap(), color);
    }

    #[test]
    fn test_illumination_falloff() {
        let color = Rgb::new(200, 100, 50);
        // intensity 100 at distance 10 leaves the color untouched
        assert_eq!(illuminate(color, 100.0, 10.0), color);
        // twice as far is a quarter as bright
        assert_eq!(illuminate(color, 100.0, 20.0), Rgb::new(50, 25, 12));
        // close up saturates
        assert_eq!(illuminate(color, 100.0, 1.0), Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_illumination_at_zero_distance_is_full_bright() {
        assert_eq!(illuminate(Rgb::BLUE, 500.0, 0.0), Rgb::WHITE);
        assert_eq!(illuminate(Rgb::BLUE, f64::INFINITY, 3.0), Rgb::WHITE);
    }
}
