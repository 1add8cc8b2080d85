//! RGB color value used by fixtures, schemes and interpreters.
//!
//! Components are stored as sRGB floats in `0.0..=1.0`. HSL
//! conversions go through [`palette`], which keeps hue math out of this
//! module.

use palette::{FromColor, Hsl, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CoreError, Result};

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
}

impl Color {
    /// Create a color from RGB components, clamped into `0.0..=1.0`.
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Create a color from 8-bit components.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Pure black.
    pub const fn black() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
        }
    }

    /// Pure white.
    pub const fn white() -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
        }
    }

    /// Look up a CSS color keyword such as `"purple"` or `"cyan"`.
    pub fn named(name: &str) -> Result<Self> {
        palette::named::from_str(&name.to_ascii_lowercase())
            .map(|c| Self::from_rgb8(c.red, c.green, c.blue))
            .ok_or_else(|| CoreError::UnknownColor(name.to_string()))
    }

    /// Create a color from hue (`0.0..1.0`, wraps), saturation and lightness.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hsl: Hsl = Hsl::new(
            hue.rem_euclid(1.0) * 360.0,
            saturation.clamp(0.0, 1.0),
            lightness.clamp(0.0, 1.0),
        );
        let rgb: Srgb = Srgb::from_color(hsl);
        Self::rgb(rgb.red, rgb.green, rgb.blue)
    }

    fn hsl(&self) -> Hsl {
        Hsl::from_color(Srgb::new(self.r, self.g, self.b))
    }

    /// Hue in `0.0..1.0`.
    pub fn hue(&self) -> f32 {
        self.hsl().hue.into_positive_degrees() / 360.0
    }

    /// HSL saturation in `0.0..=1.0`.
    pub fn saturation(&self) -> f32 {
        self.hsl().saturation
    }

    /// HSL lightness in `0.0..=1.0`.
    pub fn lightness(&self) -> f32 {
        self.hsl().lightness
    }

    /// Replace the hue while keeping saturation and lightness.
    pub fn set_hue(&mut self, hue: f32) {
        let hsl = self.hsl();
        *self = Self::from_hsl(hue, hsl.saturation, hsl.lightness);
    }

    /// Return a copy with the hue replaced.
    pub fn with_hue(mut self, hue: f32) -> Self {
        self.set_hue(hue);
        self
    }

    /// Scale every component by `factor`.
    pub fn dim(&self, factor: f32) -> Self {
        Self::rgb(self.r * factor, self.g * factor, self.b * factor)
    }

    /// Component-wise linear interpolation toward `other`.
    pub fn lerp(&self, other: &Color, t: f32) -> Self {
        Self::rgb(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Euclidean distance in RGB space, used to pick color wheel slots.
    pub fn distance(&self, other: &Color) -> f32 {
        ((self.r - other.r).powi(2) + (self.g - other.g).powi(2) + (self.b - other.b).powi(2))
            .sqrt()
    }

    /// Split into RGBW bytes.
    ///
    /// Nearly unsaturated colors drive only the white emitter so whites come
    /// out clean instead of as an RGB mix.
    pub fn to_rgbw(&self) -> (f32, f32, f32, f32) {
        let hsl = self.hsl();
        if hsl.saturation < 0.1 {
            (0.0, 0.0, 0.0, hsl.lightness * 255.0)
        } else {
            (self.r * 255.0, self.g * 255.0, self.b * 255.0, 0.0)
        }
    }

    /// RGB components scaled to DMX range.
    pub fn to_dmx(&self) -> (f32, f32, f32) {
        (self.r * 255.0, self.g * 255.0, self.b * 255.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_named_colors() {
        let red = Color::named("red").unwrap();
        assert_eq!(red, Color::rgb(1.0, 0.0, 0.0));

        let purple = Color::named("Purple").unwrap();
        assert!(approx(purple.r, 128.0 / 255.0));
        assert!(approx(purple.g, 0.0));

        assert!(Color::named("not-a-color").is_err());
    }

    #[test]
    fn test_hue_roundtrip() {
        let mut c = Color::named("red").unwrap();
        assert!(approx(c.hue(), 0.0));

        c.set_hue(1.0 / 3.0);
        assert!(approx(c.g, 1.0));
        assert!(approx(c.r, 0.0));
        assert!(approx(c.hue(), 1.0 / 3.0));
    }

    #[test]
    fn test_lerp_and_distance() {
        let a = Color::black();
        let b = Color::white();
        let mid = a.lerp(&b, 0.5);
        assert!(approx(mid.r, 0.5));
        assert!(approx(a.distance(&b), 3f32.sqrt()));
    }

    #[test]
    fn test_to_rgbw_white_uses_white_channel() {
        let (r, g, b, w) = Color::white().to_rgbw();
        assert_eq!((r, g, b), (0.0, 0.0, 0.0));
        assert!(approx(w, 255.0));

        let (r, _, _, w) = Color::named("red").unwrap().to_rgbw();
        assert!(approx(r, 255.0));
        assert_eq!(w, 0.0);
    }

    #[test]
    fn test_display_hex() {
        assert_eq!(Color::named("red").unwrap().to_string(), "#ff0000");
    }
}
