//! Color interpreters.

use crate::color::Color;
use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::Frame;
use crate::interpreters::Interpreter;

/// Which scheme slot a [`SchemeColor`] paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeRole {
    /// Foreground on every fixture
    Fg,
    /// Background on every fixture
    Bg,
    /// Background and contrast on alternating fixtures
    AlternateBg,
}

/// Paints the group from the current color scheme.
pub struct SchemeColor {
    group: Vec<FixtureId>,
    role: SchemeRole,
}

impl SchemeColor {
    /// Paint `group` from `role`.
    pub fn new(group: &[FixtureId], role: SchemeRole) -> Self {
        Self {
            group: group.to_vec(),
            role,
        }
    }
}

impl Interpreter for SchemeColor {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, _frame: &Frame, scheme: &ColorScheme) {
        for (idx, id) in self.group.iter().enumerate() {
            let color = match self.role {
                SchemeRole::Fg => scheme.fg,
                SchemeRole::Bg => scheme.bg,
                SchemeRole::AlternateBg if idx % 2 == 0 => scheme.bg,
                SchemeRole::AlternateBg => scheme.bg_contrast,
            };
            rig.set_color(*id, color);
        }
    }

    fn name(&self) -> String {
        match self.role {
            SchemeRole::Fg => "ColorFg",
            SchemeRole::Bg => "ColorBg",
            SchemeRole::AlternateBg => "ColorAlternateBg",
        }
        .to_string()
    }
}

/// One color regardless of the scheme.
pub struct ColorFixed {
    group: Vec<FixtureId>,
    color: Color,
}

impl ColorFixed {
    /// Paint `group` with `color`.
    pub fn new(group: &[FixtureId], color: Color) -> Self {
        Self {
            group: group.to_vec(),
            color,
        }
    }
}

impl Interpreter for ColorFixed {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        for id in &self.group {
            rig.set_color(*id, self.color);
        }
    }

    fn name(&self) -> String {
        format!("ColorFixed({})", self.color)
    }
}

/// Hue rotating over time, phase-shifted across the group.
pub struct ColorRainbow {
    group: Vec<FixtureId>,
    speed: f32,
    phase_spread: f32,
}

impl ColorRainbow {
    /// Hue turns per second.
    pub const DEFAULT_SPEED: f32 = 0.08;
    /// Hue offset spread over the whole group.
    pub const DEFAULT_PHASE_SPREAD: f32 = 0.2;

    /// Rainbow over `group`.
    pub fn new(group: &[FixtureId], speed: f32, phase_spread: f32) -> Self {
        Self {
            group: group.to_vec(),
            speed,
            phase_spread,
        }
    }

    /// Hue for fixture `idx` at `time`, `0..1`.
    pub fn hue_at(&self, time: f64, idx: usize) -> f32 {
        let spread = self.phase_spread / self.group.len().max(1) as f32 * idx as f32;
        let phase = time as f32 * self.speed + spread;
        phase - phase.floor()
    }
}

impl Interpreter for ColorRainbow {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        for (idx, id) in self.group.iter().enumerate() {
            let color = Color::from_hsl(self.hue_at(frame.time, idx), 1.0, 0.5);
            rig.set_color(*id, color);
        }
    }

    fn name(&self) -> String {
        "ColorRainbow".to_string()
    }
}
