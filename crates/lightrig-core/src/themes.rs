//! Color themes: named palettes of color schemes plus rainbow gating.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::color::Color;
use crate::color_scheme::ColorScheme;
use crate::{CoreError, Result};

/// Built-in theme identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ThemeName {
    /// Saturated club colors
    #[default]
    Rave,
    /// Random hue-driven schemes
    Pride,
    /// Red/purple monochrome
    Berlin,
    /// Greens and blues
    Tropical,
    /// Orange and purple
    Halloween,
}

impl ThemeName {
    /// All themes in menu order.
    pub const ALL: [ThemeName; 5] = [
        ThemeName::Rave,
        ThemeName::Pride,
        ThemeName::Berlin,
        ThemeName::Tropical,
        ThemeName::Halloween,
    ];

    /// Resolve a theme by its display name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| CoreError::UnknownTheme(name.to_string()))
    }

    /// Display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Rave => "Rave",
            ThemeName::Pride => "Pride",
            ThemeName::Berlin => "Berlin",
            ThemeName::Tropical => "Tropical",
            ThemeName::Halloween => "Halloween",
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved theme.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Which theme this is
    pub name: ThemeName,
    /// Whether rainbow interpreters may be selected
    pub allow_rainbows: bool,
    /// Candidate schemes
    pub color_schemes: Vec<ColorScheme>,
}

impl Theme {
    /// Build a theme. Random themes draw their schemes from `rng`.
    pub fn new<R: Rng + ?Sized>(name: ThemeName, rng: &mut R) -> Self {
        match name {
            ThemeName::Rave => Self {
                name,
                allow_rainbows: true,
                color_schemes: schemes(&[
                    ("green", "blue", "blue"),
                    ("white", "blue", "purple"),
                    ("white", "red", "red"),
                    ("white", "red", "purple"),
                    ("red", "blue", "blue"),
                    ("magenta", "blue", "purple"),
                    ("blue", "purple", "purple"),
                ]),
            },
            ThemeName::Pride => Self {
                name,
                allow_rainbows: true,
                color_schemes: (0..10)
                    .map(|_| {
                        let key = Color::rgb(1.0, 0.0, 0.0).with_hue(rng.random::<f32>());
                        generate_random_scheme(
                            key,
                            &[ColorRelationship::Analogous, ColorRelationship::Thick],
                            rng,
                        )
                    })
                    .collect(),
            },
            ThemeName::Berlin => Self {
                name,
                allow_rainbows: false,
                color_schemes: (0..10)
                    .map(|_| {
                        let key = if rng.random_bool(0.5) {
                            Color::rgb(1.0, 0.0, 0.0)
                        } else {
                            Color::from_rgb8(128, 0, 128)
                        };
                        generate_random_scheme(
                            key,
                            &[ColorRelationship::Mono, ColorRelationship::Bright],
                            rng,
                        )
                    })
                    .collect(),
            },
            ThemeName::Tropical => Self {
                name,
                allow_rainbows: true,
                color_schemes: schemes(&[
                    ("green", "blue", "blue"),
                    ("white", "blue", "purple"),
                    ("white", "green", "purple"),
                    ("white", "green", "yellow"),
                    ("magenta", "blue", "purple"),
                    ("blue", "purple", "purple"),
                ]),
            },
            ThemeName::Halloween => Self {
                name,
                allow_rainbows: false,
                color_schemes: schemes(&[
                    ("orange", "purple", "purple"),
                    ("orange", "red", "purple"),
                    ("purple", "orange", "orange"),
                    ("red", "purple", "orange"),
                    ("lime", "purple", "purple"),
                ]),
            },
        }
    }

    /// Every distinct color used by this theme's schemes.
    pub fn palette(&self) -> Vec<Color> {
        let mut colors: Vec<Color> = Vec::new();
        for scheme in &self.color_schemes {
            for color in scheme.to_list() {
                if !colors.contains(&color) {
                    colors.push(color);
                }
            }
        }
        colors
    }

    /// Pick one of the theme's schemes.
    pub fn random_scheme<R: Rng + ?Sized>(&self, rng: &mut R) -> ColorScheme {
        self.color_schemes.choose(rng).copied().unwrap_or_default()
    }
}

fn schemes(names: &[(&str, &str, &str)]) -> Vec<ColorScheme> {
    names
        .iter()
        .filter_map(|(fg, bg, contrast)| {
            Some(ColorScheme::new(
                Color::named(fg).ok()?,
                Color::named(bg).ok()?,
                Color::named(contrast).ok()?,
            ))
        })
        .collect()
}

/// How the three scheme colors relate to a key color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRelationship {
    /// Neighbouring hues
    Analogous,
    /// White foreground over the complementary hue
    Contrasting,
    /// Key color with a complementary contrast
    Thick,
    /// White foreground over the key color
    Mono,
    /// Key foreground over white
    Bright,
}

/// Derive a scheme from `key` using one of `methods`.
pub fn generate_random_scheme<R: Rng + ?Sized>(
    key: Color,
    methods: &[ColorRelationship],
    rng: &mut R,
) -> ColorScheme {
    let mut fg = key;
    let mut bg = key;
    let mut bg_contrast = key;
    let hue = key.hue();

    match methods.choose(rng).copied().unwrap_or(ColorRelationship::Thick) {
        ColorRelationship::Contrasting => {
            bg.set_hue((hue + 0.5) % 1.0);
            fg = Color::white();
        }
        ColorRelationship::Thick => bg_contrast.set_hue((hue + 0.5) % 1.0),
        ColorRelationship::Analogous => {
            bg.set_hue((hue + 0.15) % 1.0);
            bg_contrast.set_hue((hue + 0.3) % 1.0);
        }
        ColorRelationship::Mono => fg = Color::white(),
        ColorRelationship::Bright => {
            bg = Color::white();
            bg_contrast = Color::white();
        }
    }

    ColorScheme::new(fg, bg, bg_contrast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_theme_lookup() {
        assert_eq!(ThemeName::from_name("berlin").unwrap(), ThemeName::Berlin);
        assert!(ThemeName::from_name("Disco").is_err());
    }

    #[test]
    fn test_rainbow_gating() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Theme::new(ThemeName::Rave, &mut rng).allow_rainbows);
        assert!(!Theme::new(ThemeName::Berlin, &mut rng).allow_rainbows);
        assert!(!Theme::new(ThemeName::Halloween, &mut rng).allow_rainbows);
    }

    #[test]
    fn test_every_theme_has_schemes_and_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        for name in ThemeName::ALL {
            let theme = Theme::new(name, &mut rng);
            assert!(!theme.color_schemes.is_empty(), "{} has no schemes", name);
            assert!(theme.palette().len() >= 2, "{} palette too small", name);
        }
    }

    #[test]
    fn test_thick_scheme_uses_complement() {
        let mut rng = StdRng::seed_from_u64(3);
        let key = Color::rgb(1.0, 0.0, 0.0);
        let scheme = generate_random_scheme(key, &[ColorRelationship::Thick], &mut rng);
        assert_eq!(scheme.fg, key);
        assert!((scheme.bg_contrast.hue() - 0.5).abs() < 1e-3);
    }
}
