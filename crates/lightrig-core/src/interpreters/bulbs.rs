//! Interpreters for fixtures with individually addressable bulbs.

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::Frame;
use crate::interpreters::Interpreter;

/// Every bulb of every fixture at full.
pub struct AllBulbs255 {
    group: Vec<FixtureId>,
}

impl AllBulbs255 {
    /// Light the bulbs of `group`.
    pub fn new(group: &[FixtureId]) -> Self {
        Self {
            group: group.to_vec(),
        }
    }
}

impl Interpreter for AllBulbs255 {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        for bulb in rig.bulbs_of(&self.group) {
            rig.set_dimmer(bulb, 255.0);
        }
    }

    fn name(&self) -> String {
        "AllBulbs255".to_string()
    }
}
