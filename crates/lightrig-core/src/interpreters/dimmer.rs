//! Dimmer interpreters: fixed levels, chases and signal-triggered pulses.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::{Frame, FrameSignal};
use crate::interpreters::Interpreter;
use crate::lerp::lerp;

/// Frame rate assumed by interpreters that advance per step.
pub const NOMINAL_FPS: f32 = 30.0;

/// Does nothing.
pub struct Noop {
    group: Vec<FixtureId>,
}

impl Noop {
    /// Idle over `group`.
    pub fn new(group: &[FixtureId]) -> Self {
        Self {
            group: group.to_vec(),
        }
    }
}

impl Interpreter for Noop {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, _rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {}

    fn name(&self) -> String {
        "Noop".to_string()
    }
}

/// Holds every fixture at one dimmer level. Level 0 also clears strobe.
pub struct ConstDimmer {
    group: Vec<FixtureId>,
    level: f32,
}

impl ConstDimmer {
    /// Hold `group` at `level`, `0..=255`.
    pub fn new(group: &[FixtureId], level: f32) -> Self {
        Self {
            group: group.to_vec(),
            level,
        }
    }
}

impl Interpreter for ConstDimmer {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        for id in &self.group {
            rig.set_dimmer(*id, self.level);
            if self.level == 0.0 {
                rig.set_strobe(*id, 0.0);
            }
        }
    }

    fn name(&self) -> String {
        format!("Dimmer{}", self.level as u32)
    }
}

/// Ramps from dark to full over `fade_time` seconds of steps.
pub struct DimmerFadeIn {
    group: Vec<FixtureId>,
    fade_time: f32,
    memory: f32,
}

impl DimmerFadeIn {
    /// Fade `group` in over `fade_time` seconds.
    pub fn new(group: &[FixtureId], fade_time: f32) -> Self {
        Self {
            group: group.to_vec(),
            fade_time: fade_time.max(f32::EPSILON),
            memory: 0.0,
        }
    }
}

impl Interpreter for DimmerFadeIn {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        self.memory = (self.memory + 1.0 / (self.fade_time * NOMINAL_FPS)).min(1.0);
        for id in &self.group {
            rig.set_dimmer(*id, self.memory * 255.0);
        }
    }

    fn name(&self) -> String {
        "DimmerFadeIn".to_string()
    }
}

/// Lights one fixture at a time, advancing every `wait_time` seconds.
pub struct SequenceDimmers {
    group: Vec<FixtureId>,
    dimmer: f32,
    wait_time: f64,
}

impl SequenceDimmers {
    /// Hype rating.
    pub const HYPE: f32 = 30.0;

    /// Chase `group` at `dimmer`, moving on every `wait_time` seconds.
    pub fn new(group: &[FixtureId], dimmer: f32, wait_time: f64) -> Self {
        Self {
            group: group.to_vec(),
            dimmer,
            wait_time: wait_time.max(f64::EPSILON),
        }
    }

    /// Index of the lit fixture at `time`.
    pub fn active_index(&self, time: f64) -> usize {
        let n = self.group.len().max(1) as i64;
        ((time / self.wait_time).round() as i64).rem_euclid(n) as usize
    }
}

impl Interpreter for SequenceDimmers {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        let active = self.active_index(frame.time);
        for (i, id) in self.group.iter().enumerate() {
            rig.set_dimmer(*id, if i == active { self.dimmer } else { 0.0 });
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "SequenceDimmers".to_string()
    }
}

/// A smooth wave rolling through the group, one cycle per
/// `wait_time * group size` seconds.
pub struct SequenceFadeDimmers {
    group: Vec<FixtureId>,
    wait_time: f64,
}

impl SequenceFadeDimmers {
    /// Hype rating.
    pub const HYPE: f32 = 20.0;

    /// Roll a wave through `group`.
    pub fn new(group: &[FixtureId], wait_time: f64) -> Self {
        Self {
            group: group.to_vec(),
            wait_time: wait_time.max(f64::EPSILON),
        }
    }
}

impl Interpreter for SequenceFadeDimmers {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        let n = self.group.len().max(1) as f64;
        let cycle = frame.time / (self.wait_time * n);
        for (i, id) in self.group.iter().enumerate() {
            let phase = (cycle - i as f64 / n) as f32;
            let level = (phase * TAU).cos() * 0.5 + 0.5;
            rig.set_dimmer(*id, level * 255.0);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "SequenceFadeDimmers".to_string()
    }
}

/// On each beat, one random fixture flashes at the signal level.
pub struct DimmersBeatChase {
    group: Vec<FixtureId>,
    signal: FrameSignal,
    on: bool,
    selected: usize,
    rng: StdRng,
}

impl DimmersBeatChase {
    /// Hype rating.
    pub const HYPE: f32 = 75.0;
    /// Signal level that counts as a beat.
    pub const THRESHOLD: f32 = 0.4;

    /// Chase over `group`, following either treble or bass.
    pub fn new(group: &[FixtureId], mut rng: StdRng) -> Self {
        let signal = *[FrameSignal::FreqHigh, FrameSignal::FreqLow]
            .choose(&mut rng)
            .unwrap_or(&FrameSignal::FreqHigh);
        Self::with_signal(group, signal, rng)
    }

    /// Chase over `group` following `signal`.
    pub fn with_signal(group: &[FixtureId], signal: FrameSignal, rng: StdRng) -> Self {
        Self {
            group: group.to_vec(),
            signal,
            on: false,
            selected: 0,
            rng,
        }
    }
}

impl Interpreter for DimmersBeatChase {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        let value = frame[self.signal];
        if value > Self::THRESHOLD {
            if !self.on && !self.group.is_empty() {
                self.on = true;
                self.selected = self.rng.random_range(0..self.group.len());
            }
            for (i, id) in self.group.iter().enumerate() {
                let level = if i == self.selected { value * 255.0 } else { 0.0 };
                rig.set_dimmer(*id, level);
            }
        } else {
            self.on = false;
            for id in &self.group {
                rig.set_dimmer(*id, 0.0);
            }
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "DimmersBeatChase".to_string()
    }
}

/// Tuning for [`GentlePulse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseParams {
    /// Signal to follow
    pub signal: FrameSignal,
    /// Level that starts a pulse
    pub trigger_level: f32,
    /// Fraction of the pulse lost per step
    pub decay_rate: f32,
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            signal: FrameSignal::FreqAll,
            trigger_level: 0.3,
            decay_rate: 0.1,
        }
    }
}

/// Each rising edge of the signal lights one random fixture at the signal
/// level; every fixture then decays toward dark.
pub struct GentlePulse {
    group: Vec<FixtureId>,
    params: PulseParams,
    on: bool,
    memory: Vec<f32>,
    rng: StdRng,
}

impl GentlePulse {
    /// Hype rating.
    pub const HYPE: f32 = 10.0;

    /// Pulse `group` with `params`.
    pub fn new(group: &[FixtureId], params: PulseParams, rng: StdRng) -> Self {
        Self {
            group: group.to_vec(),
            params,
            on: false,
            memory: vec![0.0; group.len()],
            rng,
        }
    }

    /// Current pulse level per fixture, `0..=1`.
    pub fn memory(&self) -> &[f32] {
        &self.memory
    }
}

impl Interpreter for GentlePulse {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        for m in &mut self.memory {
            *m = lerp(*m, 0.0, self.params.decay_rate);
        }

        let value = frame[self.params.signal];
        if value > self.params.trigger_level {
            if !self.on && !self.memory.is_empty() {
                self.on = true;
                let idx = self.rng.random_range(0..self.memory.len());
                self.memory[idx] = value;
            }
        } else {
            self.on = false;
        }

        for (id, m) in self.group.iter().zip(&self.memory) {
            rig.set_dimmer(*id, m * 255.0);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "GentlePulse".to_string()
    }
}

/// Random sparkles that fade out.
pub struct Twinkle {
    group: Vec<FixtureId>,
    memory: Vec<f32>,
    rng: StdRng,
}

impl Twinkle {
    /// Hype rating.
    pub const HYPE: f32 = 5.0;
    /// A fixture sparkles when a uniform draw exceeds this.
    pub const CHANCE_ABOVE: f32 = 0.99;
    /// Per-step decay factor.
    pub const DECAY: f32 = 0.9;

    /// Twinkle over `group`.
    pub fn new(group: &[FixtureId], rng: StdRng) -> Self {
        Self {
            group: group.to_vec(),
            memory: vec![0.0; group.len()],
            rng,
        }
    }
}

impl Interpreter for Twinkle {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, _frame: &Frame, _scheme: &ColorScheme) {
        for (id, m) in self.group.iter().zip(self.memory.iter_mut()) {
            if self.rng.random::<f32>() > Self::CHANCE_ABOVE {
                *m = 1.0;
            } else {
                *m *= Self::DECAY;
            }
            rig.set_dimmer(*id, *m * 255.0);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "Twinkle".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureDef;
    use rand::SeedableRng;

    fn pars(n: u16) -> (Rig, Vec<FixtureId>) {
        let mut rig = Rig::new();
        let ids = (0..n)
            .map(|i| rig.add(FixtureDef::led_par(1 + i * 7)).unwrap())
            .collect();
        (rig, ids)
    }

    fn step(rig: &mut Rig, ids: &[FixtureId], interp: &mut dyn Interpreter, frame: &Frame) {
        for id in ids {
            rig.begin(*id);
        }
        interp.step(rig, frame, &ColorScheme::default());
    }

    #[test]
    fn test_dimmer0_clears_strobe_only_if_nothing_louder() {
        let (mut rig, ids) = pars(1);
        rig.begin(ids[0]);
        rig.set_strobe(ids[0], 100.0);
        ConstDimmer::new(&ids, 0.0).step(&mut rig, &Frame::at(0.0), &ColorScheme::default());
        assert_eq!(rig.get_strobe(ids[0]), 100.0);
        assert_eq!(rig.get_dimmer(ids[0]), 0.0);
    }

    #[test]
    fn test_fade_in_rises_and_caps() {
        let (mut rig, ids) = pars(1);
        let mut interp = DimmerFadeIn::new(&ids, 0.1);
        step(&mut rig, &ids, &mut interp, &Frame::at(0.0));
        let first = rig.get_dimmer(ids[0]);
        assert!(first > 0.0);
        for _ in 0..100 {
            step(&mut rig, &ids, &mut interp, &Frame::at(0.0));
        }
        assert_eq!(rig.get_dimmer(ids[0]), 255.0);
    }

    #[test]
    fn test_sequence_dimmers_advance() {
        let (mut rig, ids) = pars(3);
        let mut interp = SequenceDimmers::new(&ids, 150.0, 2.0);
        step(&mut rig, &ids, &mut interp, &Frame::at(0.0));
        assert_eq!(rig.get_dimmer(ids[0]), 150.0);
        assert_eq!(rig.get_dimmer(ids[1]), 0.0);

        step(&mut rig, &ids, &mut interp, &Frame::at(2.0));
        assert_eq!(rig.get_dimmer(ids[0]), 0.0);
        assert_eq!(rig.get_dimmer(ids[1]), 150.0);
    }

    #[test]
    fn test_beat_chase_lights_one_fixture() {
        let (mut rig, ids) = pars(3);
        let rng = StdRng::seed_from_u64(3);
        let mut interp = DimmersBeatChase::with_signal(&ids, FrameSignal::FreqHigh, rng);

        let beat = Frame::at(0.0).with(FrameSignal::FreqHigh, 0.5);
        step(&mut rig, &ids, &mut interp, &beat);
        let lit: Vec<f32> = ids.iter().map(|id| rig.get_dimmer(*id)).collect();
        assert_eq!(lit.iter().filter(|v| **v == 127.5).count(), 1);
        assert_eq!(lit.iter().filter(|v| **v == 0.0).count(), 2);

        let quiet = Frame::at(0.1).with(FrameSignal::FreqHigh, 0.1);
        step(&mut rig, &ids, &mut interp, &quiet);
        assert!(ids.iter().all(|id| rig.get_dimmer(*id) == 0.0));
    }

    #[test]
    fn test_gentle_pulse_triggers_then_decays() {
        let (mut rig, ids) = pars(1);
        let mut interp = GentlePulse::new(&ids, PulseParams::default(), StdRng::seed_from_u64(1));

        step(&mut rig, &ids, &mut interp, &Frame::at(0.0).with(FrameSignal::FreqAll, 0.8));
        let first = rig.get_dimmer(ids[0]);
        assert!((first - 0.8 * 255.0).abs() < 1e-3);

        step(&mut rig, &ids, &mut interp, &Frame::at(0.1).with(FrameSignal::FreqAll, 0.1));
        assert!(rig.get_dimmer(ids[0]) < first);
    }

    #[test]
    fn test_faster_decay_drops_further() {
        let (mut rig, ids) = pars(1);
        let stab = PulseParams {
            decay_rate: 0.3,
            ..PulseParams::default()
        };
        let mut gentle = GentlePulse::new(&ids, PulseParams::default(), StdRng::seed_from_u64(1));
        let mut fast = GentlePulse::new(&ids, stab, StdRng::seed_from_u64(1));

        let high = Frame::at(0.0).with(FrameSignal::FreqAll, 0.8);
        let low = Frame::at(0.1).with(FrameSignal::FreqAll, 0.1);
        for frame in [&high, &low] {
            step(&mut rig, &ids, &mut gentle, frame);
            step(&mut rig, &ids, &mut fast, frame);
        }
        assert!(fast.memory()[0] < gentle.memory()[0]);
    }

    #[test]
    fn test_twinkle_stays_in_range() {
        let (mut rig, ids) = pars(4);
        let mut interp = Twinkle::new(&ids, StdRng::seed_from_u64(9));
        for i in 0..500 {
            step(&mut rig, &ids, &mut interp, &Frame::at(i as f64 / 30.0));
            for id in &ids {
                let v = rig.get_dimmer(*id);
                assert!((0.0..=255.0).contains(&v));
            }
        }
    }
}
