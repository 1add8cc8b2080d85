//! Color and gobo wheel slots for wheel-based fixtures.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// One slot on a color wheel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorWheelEntry {
    /// Color the slot produces
    pub color: Color,
    /// DMX value selecting the slot
    pub dmx_value: u8,
}

impl ColorWheelEntry {
    /// Create a slot. Unknown color names fall back to white.
    pub fn named(name: &str, dmx_value: u8) -> Self {
        Self {
            color: Color::named(name).unwrap_or(Color::white()),
            dmx_value,
        }
    }
}

/// One slot on a gobo wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoboWheelEntry {
    /// Gobo name, e.g. `open` or `starburst`
    pub name: String,
    /// DMX value selecting the slot
    pub dmx_value: u8,
}

impl GoboWheelEntry {
    /// Create a slot.
    pub fn new(name: &str, dmx_value: u8) -> Self {
        Self {
            name: name.to_string(),
            dmx_value,
        }
    }
}

/// Closest color wheel slot to `color`.
pub fn closest_color<'a>(wheel: &'a [ColorWheelEntry], color: &Color) -> Option<&'a ColorWheelEntry> {
    wheel.iter().min_by(|a, b| {
        a.color
            .distance(color)
            .partial_cmp(&b.color.distance(color))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}
