//! Position-aware interpreters.

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::{Frame, FrameSignal};
use crate::interpreters::dimmer::NOMINAL_FPS;
use crate::interpreters::Interpreter;

/// A band of light that travels from the highest fixture to the lowest each
/// time the treble crosses the trigger level.
///
/// Fixtures without a position stay dark.
pub struct SpatialDownwardsPulse {
    group: Vec<FixtureId>,
    trigger_level: f32,
    edge_hardness: f32,
    pulse_width: f32,
    speed: f32,
    sweep: Option<Sweep>,
}

#[derive(Debug, Clone, Copy)]
struct Sweep {
    position: f32,
    top: f32,
    bottom: f32,
}

impl Sweep {
    fn range(&self) -> f32 {
        self.top - self.bottom
    }
}

impl SpatialDownwardsPulse {
    /// Hype rating.
    pub const HYPE: f32 = 60.0;
    /// Extra travel above and below the fixtures, as a fraction of their span.
    const MARGIN: f32 = 0.3;

    /// Pulse over `group` with default shape.
    pub fn new(group: &[FixtureId]) -> Self {
        Self {
            group: group.to_vec(),
            trigger_level: 0.3,
            edge_hardness: 2.0,
            pulse_width: 0.3,
            speed: 1.0,
            sweep: None,
        }
    }

    /// Whether a pulse is travelling.
    pub fn is_active(&self) -> bool {
        self.sweep.is_some()
    }

    fn start(&self, rig: &Rig) -> Option<Sweep> {
        let heights: Vec<f32> = self
            .group
            .iter()
            .filter_map(|id| rig.get(*id).base.position.map(|p| p.y))
            .collect();
        let max = heights.iter().copied().reduce(f32::max)?;
        let min = heights.iter().copied().reduce(f32::min)?;
        let span = max - min;
        let top = max + span * Self::MARGIN;
        Some(Sweep {
            position: top,
            top,
            bottom: min - span * Self::MARGIN,
        })
    }

    fn darken(&self, rig: &mut Rig) {
        for id in &self.group {
            rig.set_dimmer(*id, 0.0);
        }
    }
}

impl Interpreter for SpatialDownwardsPulse {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        if self.sweep.is_none() && frame[FrameSignal::FreqHigh] > self.trigger_level {
            self.sweep = self.start(rig);
        }

        let Some(mut sweep) = self.sweep else {
            self.darken(rig);
            return;
        };

        sweep.position -= self.speed * (sweep.range() / NOMINAL_FPS);
        if sweep.position < sweep.bottom {
            self.sweep = None;
            self.darken(rig);
            return;
        }
        self.sweep = Some(sweep);

        for id in &self.group {
            let level = match rig.get(*id).base.position {
                Some(p) => {
                    let distance = (p.y - sweep.position).abs() / (sweep.range() + 1e-6);
                    let normalized = distance / self.pulse_width;
                    (1.0 - normalized.powf(self.edge_hardness)).max(0.0)
                }
                None => 0.0,
            };
            rig.set_dimmer(*id, level * 255.0);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "SpatialDownwardsPulse".to_string()
    }
}
