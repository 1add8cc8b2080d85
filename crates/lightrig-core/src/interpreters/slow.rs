//! Slow envelope followers.

use std::f32::consts::PI;

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::{Frame, FrameSignal};
use crate::interpreters::Interpreter;
use crate::lerp::lerp;

/// Tuning for [`SlowDecay`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayParams {
    /// Signal to follow
    pub signal: FrameSignal,
    /// Fraction of the held level lost per step
    pub decay_rate: f32,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            signal: FrameSignal::FreqAll,
            decay_rate: 0.1,
        }
    }
}

/// Jumps up with the signal and falls back slowly.
pub struct SlowDecay {
    group: Vec<FixtureId>,
    params: DecayParams,
    memory: f32,
}

impl SlowDecay {
    /// Hype rating.
    pub const HYPE: f32 = 20.0;

    /// Follow `params.signal` on `group`.
    pub fn new(group: &[FixtureId], params: DecayParams) -> Self {
        Self {
            group: group.to_vec(),
            params,
            memory: 0.0,
        }
    }

    /// Held level, `0..=1`.
    pub fn memory(&self) -> f32 {
        self.memory
    }
}

impl Interpreter for SlowDecay {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        self.memory = lerp(self.memory, 0.0, self.params.decay_rate).max(frame[self.params.signal]);
        for id in &self.group {
            rig.set_dimmer(*id, self.memory * 255.0);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "SlowDecay".to_string()
    }
}

/// Eases toward overall energy; once the bass swell is high the fixtures
/// swing in a phase-shifted wave instead.
pub struct SlowRespond {
    group: Vec<FixtureId>,
    memory: f32,
}

impl SlowRespond {
    /// Hype rating.
    pub const HYPE: f32 = 10.0;
    const EASE: f32 = 0.24;
    const SWELL_ABOVE: f32 = 0.5;
    const WAVE_FLOOR: f32 = 50.0;

    /// Follow energy on `group`.
    pub fn new(group: &[FixtureId]) -> Self {
        Self {
            group: group.to_vec(),
            memory: 0.0,
        }
    }
}

impl Interpreter for SlowRespond {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        self.memory = lerp(self.memory, frame[FrameSignal::FreqAll], Self::EASE);
        let n = self.group.len().max(1) as f32;
        let swelling = frame[FrameSignal::SustainedLow] > Self::SWELL_ABOVE;

        for (idx, id) in self.group.iter().enumerate() {
            let level = if swelling {
                let wave = (frame.time as f32 * 5.0 + PI * idx as f32 / n).sin().max(0.0);
                Self::WAVE_FLOOR + (255.0 - Self::WAVE_FLOOR) * wave
            } else {
                self.memory * 255.0
            };
            rig.set_dimmer(*id, level);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "SlowRespond".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureDef;

    #[test]
    fn test_slow_decay_holds_peak_then_decays() {
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        let mut interp = SlowDecay::new(
            &[par],
            DecayParams {
                decay_rate: 0.4,
                ..DecayParams::default()
            },
        );
        let scheme = ColorScheme::default();

        interp.step(&mut rig, &Frame::at(0.0).with(FrameSignal::FreqAll, 0.8), &scheme);
        assert!((interp.memory() - 0.8).abs() < 1e-6);

        rig.begin(par);
        interp.step(&mut rig, &Frame::at(0.1), &scheme);
        assert!((interp.memory() - 0.48).abs() < 1e-3);
        assert!((rig.get_dimmer(par) - 0.48 * 255.0).abs() < 0.5);
    }

    #[test]
    fn test_slow_respond_eases_toward_energy() {
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        let mut interp = SlowRespond::new(&[par]);
        let frame = Frame::at(0.0).with(FrameSignal::FreqAll, 1.0);
        interp.step(&mut rig, &frame, &ColorScheme::default());
        let first = rig.get_dimmer(par);
        assert!(first > 0.0 && first < 255.0);
    }
}
