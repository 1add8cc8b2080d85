//! Strobe and rotation interpreters.

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::Frame;
use crate::interpreters::Interpreter;

/// Strobe level used for full-on strobing.
pub const STROBE_HIGH: f32 = 220.0;

/// Strobes at full brightness for as long as it is active.
pub struct StrobeHighSustained {
    group: Vec<FixtureId>,
}

impl StrobeHighSustained {
    /// Hype rating.
    pub const HYPE: f32 = 90.0;

    /// Strobe `group`.
    pub fn new(group: &[FixtureId]) -> Self {
        Self {
            group: group.to_vec(),
        }
    }
}

impl Interpreter for StrobeHighSustained {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        for id in &self.group {
            rig.set_strobe(*id, STROBE_HIGH);
            rig.set_dimmer(*id, 255.0);
        }
    }

    fn exit(&mut self, rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        for id in &self.group {
            rig.force_strobe(*id, 0.0);
            rig.force_dimmer(*id, 0.0);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "StrobeHighSustained".to_string()
    }
}

/// Constant rotation speed.
pub struct Spin {
    group: Vec<FixtureId>,
    speed: f32,
}

impl Spin {
    /// Default rotation speed.
    pub const DEFAULT_SPEED: f32 = 50.0;

    /// Spin `group` at `speed`.
    pub fn new(group: &[FixtureId], speed: f32) -> Self {
        Self {
            group: group.to_vec(),
            speed,
        }
    }
}

impl Interpreter for Spin {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        for id in &self.group {
            rig.set_speed(*id, self.speed);
        }
    }

    fn name(&self) -> String {
        "Spin".to_string()
    }
}
