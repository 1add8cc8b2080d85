//! Pan/tilt movement patterns. Positions are `0..=255` around a center of 128.

use std::f32::consts::{FRAC_PI_3, PI};

use rand::rngs::StdRng;
use rand::Rng;

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::{Frame, FrameSignal};
use crate::interpreters::latched::Latch;
use crate::interpreters::Interpreter;

const CENTER: f32 = 128.0;
const SWING: f32 = 127.0;

/// Which curve a [`Move`] traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePattern {
    /// Pan cos, tilt sin
    Circles,
    /// Centered pan, tilt sin
    Nod,
    /// Lissajous 1:2
    FigureEight,
}

/// Periodic movement, phase-shifted per fixture.
pub struct Move {
    group: Vec<FixtureId>,
    pattern: MovePattern,
    multiplier: f32,
    phase: f32,
}

impl Move {
    /// Circles with a random phase of 0 or π between neighbours.
    pub fn circles(group: &[FixtureId], multiplier: f32, rng: &mut StdRng) -> Self {
        Self::new(group, MovePattern::Circles, multiplier, random_phase(rng))
    }

    /// Nod with a π/3 phase between neighbours.
    pub fn nod(group: &[FixtureId], multiplier: f32) -> Self {
        Self::new(group, MovePattern::Nod, multiplier, FRAC_PI_3)
    }

    /// Figure eight with a random phase of 0 or π between neighbours.
    pub fn figure_eight(group: &[FixtureId], multiplier: f32, rng: &mut StdRng) -> Self {
        Self::new(group, MovePattern::FigureEight, multiplier, random_phase(rng))
    }

    /// Explicit pattern and phase.
    pub fn new(group: &[FixtureId], pattern: MovePattern, multiplier: f32, phase: f32) -> Self {
        Self {
            group: group.to_vec(),
            pattern,
            multiplier,
            phase,
        }
    }

    /// `(pan, tilt)` for fixture `idx` at `time`.
    pub fn position(&self, time: f64, idx: usize) -> (f32, f32) {
        let t = time as f32 * self.multiplier + self.phase * idx as f32;
        match self.pattern {
            MovePattern::Circles => (t.cos() * SWING + CENTER, t.sin() * SWING + CENTER),
            MovePattern::Nod => (CENTER, t.sin() * SWING + CENTER),
            MovePattern::FigureEight => (t.sin() * SWING + CENTER, (2.0 * t).sin() * SWING + CENTER),
        }
    }
}

fn random_phase(rng: &mut StdRng) -> f32 {
    if rng.random_bool(0.5) {
        0.0
    } else {
        PI
    }
}

impl Interpreter for Move {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        for (idx, id) in self.group.iter().enumerate() {
            let (pan, tilt) = self.position(frame.time, idx);
            rig.set_pan(*id, pan);
            rig.set_tilt(*id, tilt);
        }
    }

    fn name(&self) -> String {
        match self.pattern {
            MovePattern::Circles => "MoveCircles",
            MovePattern::Nod => "MoveNod",
            MovePattern::FigureEight => "MoveFigureEight",
        }
        .to_string()
    }
}

/// Fixtures sweep symmetrically outward from the middle of the group.
pub struct MoveFan {
    group: Vec<FixtureId>,
    multiplier: f32,
    spread: f32,
}

impl MoveFan {
    /// Fan `group` out by `spread` of the full swing.
    pub fn new(group: &[FixtureId], multiplier: f32, spread: f32) -> Self {
        Self {
            group: group.to_vec(),
            multiplier,
            spread,
        }
    }
}

impl Interpreter for MoveFan {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        let middle = (self.group.len().saturating_sub(1)) as f32 / 2.0;
        let swing = (frame.time as f32 * self.multiplier).sin();
        for (idx, id) in self.group.iter().enumerate() {
            let rel = (idx as f32 - middle) / (middle + 1e-5);
            rig.set_pan(*id, swing * rel * self.spread * SWING + CENTER);
            rig.set_tilt(*id, CENTER);
        }
    }

    fn name(&self) -> String {
        "MoveFan".to_string()
    }
}

/// Jumps to a fresh random pan every time the treble latches.
pub struct PanLatched {
    group: Vec<FixtureId>,
    latch: Latch,
    pan: f32,
    rng: StdRng,
}

impl PanLatched {
    /// Latch pan on `group`.
    pub fn new(group: &[FixtureId], rng: StdRng) -> Self {
        Self {
            group: group.to_vec(),
            latch: Latch::new(0.6, 0.4, 0.5),
            pan: CENTER,
            rng,
        }
    }
}

impl Interpreter for PanLatched {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        if self.latch.update(frame[FrameSignal::FreqHigh], frame.time) {
            self.pan = self.rng.random_range(0.0..=255.0);
        }
        for id in &self.group {
            rig.set_pan(*id, self.pan);
        }
    }

    fn name(&self) -> String {
        "PanLatched".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureDef;
    use rand::SeedableRng;

    fn movers(n: u16) -> (Rig, Vec<FixtureId>) {
        let mut rig = Rig::new();
        let ids = (0..n)
            .map(|i| rig.add(FixtureDef::chauvet_spot_160(1 + i * 11)).unwrap())
            .collect();
        (rig, ids)
    }

    #[test]
    fn test_circles_stay_in_range() {
        let (mut rig, ids) = movers(2);
        let mut rng = StdRng::seed_from_u64(5);
        let mut interp = Move::circles(&ids, 1.0, &mut rng);
        for i in 0..100 {
            interp.step(&mut rig, &Frame::at(i as f64 * 0.1), &ColorScheme::default());
            for id in &ids {
                assert!((1.0..=255.0).contains(&rig.get_pan(*id)));
                assert!((1.0..=255.0).contains(&rig.get_tilt(*id)));
            }
        }
    }

    #[test]
    fn test_nod_keeps_pan_centered() {
        let (mut rig, ids) = movers(1);
        let mut interp = Move::nod(&ids, 1.0);
        interp.step(&mut rig, &Frame::at(1.0), &ColorScheme::default());
        assert_eq!(rig.get_pan(ids[0]), CENTER);
    }

    #[test]
    fn test_fan_is_symmetric() {
        let (mut rig, ids) = movers(3);
        let mut interp = MoveFan::new(&ids, 1.0, 1.0);
        interp.step(&mut rig, &Frame::at(1.0), &ColorScheme::default());
        let left = rig.get_pan(ids[0]) - CENTER;
        let right = rig.get_pan(ids[2]) - CENTER;
        assert!((left + right).abs() < 1e-3);
        assert!((rig.get_pan(ids[1]) - CENTER).abs() < 1e-3);
    }

    #[test]
    fn test_pan_latched_moves_on_edge_only() {
        let (mut rig, ids) = movers(1);
        let mut interp = PanLatched::new(&ids, StdRng::seed_from_u64(2));
        let scheme = ColorScheme::default();
        interp.step(&mut rig, &Frame::at(0.0), &scheme);
        assert_eq!(rig.get_pan(ids[0]), CENTER);

        interp.step(&mut rig, &Frame::at(1.0).with(FrameSignal::FreqHigh, 0.9), &scheme);
        let moved = rig.get_pan(ids[0]);
        interp.step(&mut rig, &Frame::at(1.1).with(FrameSignal::FreqHigh, 0.9), &scheme);
        assert_eq!(rig.get_pan(ids[0]), moved);
    }
}
