//! Foreground/background color triples shared by color interpreters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::color::Color;
use crate::lerp::Lerp;

/// Three coordinated colors: foreground, background and a background
/// contrast color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    /// Foreground
    pub fg: Color,
    /// Background
    pub bg: Color,
    /// Background contrast
    pub bg_contrast: Color,
}

impl ColorScheme {
    /// Create a scheme.
    pub fn new(fg: Color, bg: Color, bg_contrast: Color) -> Self {
        Self {
            fg,
            bg,
            bg_contrast,
        }
    }

    /// The three channels as `[fg, bg, bg_contrast]`.
    pub fn to_list(&self) -> [Color; 3] {
        [self.fg, self.bg, self.bg_contrast]
    }

    /// Rebuild a scheme from `[fg, bg, bg_contrast]`.
    pub fn from_list(colors: [Color; 3]) -> Self {
        let [fg, bg, bg_contrast] = colors;
        Self::new(fg, bg, bg_contrast)
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::new(Color::white(), Color::rgb(0.0, 0.0, 1.0), Color::rgb(0.5, 0.0, 0.5))
    }
}

impl Lerp for ColorScheme {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::new(
            self.fg.lerp(&other.fg, t),
            self.bg.lerp(&other.bg, t),
            self.bg_contrast.lerp(&other.bg_contrast, t),
        )
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.fg, self.bg, self.bg_contrast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lerp::LerpAnimator;

    #[test]
    fn test_list_roundtrip_replaces_one_channel() {
        let scheme = ColorScheme::default();
        let mut list = scheme.to_list();
        list[1] = Color::named("red").unwrap();
        let nudged = ColorScheme::from_list(list);
        assert_eq!(nudged.fg, scheme.fg);
        assert_eq!(nudged.bg, Color::named("red").unwrap());
        assert_eq!(nudged.bg_contrast, scheme.bg_contrast);
    }

    #[test]
    fn test_scheme_animates_per_component() {
        let black = ColorScheme::new(Color::black(), Color::black(), Color::black());
        let white = ColorScheme::new(Color::white(), Color::white(), Color::white());
        let mut anim = LerpAnimator::new(black, 4.0);
        anim.push(white, 0.0);

        let mid = anim.render(2.0);
        assert!((mid.fg.r - 0.5).abs() < 1e-6);
        assert!((mid.bg_contrast.b - 0.5).abs() < 1e-6);
        assert_eq!(anim.render(4.0), white);
    }
}
