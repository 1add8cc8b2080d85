//! Latched interpreters: switch on above a threshold and stay on for at least
//! `latch_time` seconds.

use rand::rngs::StdRng;
use rand::Rng;

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::{Frame, FrameSignal};
use crate::interpreters::Interpreter;
use crate::lerp::lerp;

/// Hysteresis switch with a minimum on time.
#[derive(Debug, Clone, PartialEq)]
pub struct Latch {
    /// Turns on above this
    pub on_above: f32,
    /// Turns off below this, once the latch has expired
    pub off_below: f32,
    /// Minimum on time in seconds
    pub latch_time: f64,
    switch: bool,
    latch_until: f64,
}

impl Latch {
    /// A switch that starts off.
    pub fn new(on_above: f32, off_below: f32, latch_time: f64) -> Self {
        Self {
            on_above,
            off_below,
            latch_time,
            switch: false,
            latch_until: 0.0,
        }
    }

    /// Feed one sample. Returns `true` on the off → on edge.
    pub fn update(&mut self, value: f32, time: f64) -> bool {
        let was_on = self.switch;
        if value > self.on_above {
            self.switch = true;
            self.latch_until = time + self.latch_time;
        } else if value < self.off_below && time >= self.latch_until {
            self.switch = false;
        }
        self.switch && !was_on
    }

    /// Whether the switch is on.
    pub fn is_on(&self) -> bool {
        self.switch
    }

    /// Time the current latch expires.
    pub fn latch_until(&self) -> f64 {
        self.latch_until
    }
}

/// Tuning shared by the latched dimmers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatchParams {
    /// Signal to follow
    pub signal: FrameSignal,
    /// Turns on above this
    pub on_above: f32,
    /// Turns off below this
    pub off_below: f32,
    /// Minimum on time in seconds
    pub latch_time: f64,
    /// Fraction of the gap to full closed per step while on
    pub fade_in_rate: f32,
    /// Fraction of the gap to dark closed per step while off
    pub fade_out_rate: f32,
}

impl Default for LatchParams {
    fn default() -> Self {
        Self {
            signal: FrameSignal::SustainedLow,
            on_above: 0.6,
            off_below: 0.4,
            latch_time: 0.5,
            fade_in_rate: 0.1,
            fade_out_rate: 0.1,
        }
    }
}

impl LatchParams {
    fn latch(&self) -> Latch {
        Latch::new(self.on_above, self.off_below, self.latch_time)
    }
}

/// Full on or full off.
pub struct DimmerBinaryLatched {
    group: Vec<FixtureId>,
    signal: FrameSignal,
    latch: Latch,
}

impl DimmerBinaryLatched {
    /// Hype rating.
    pub const HYPE: f32 = 40.0;

    /// Latch `group` on `params.signal`. Fade rates are ignored.
    pub fn new(group: &[FixtureId], params: LatchParams) -> Self {
        Self {
            group: group.to_vec(),
            signal: params.signal,
            latch: params.latch(),
        }
    }

    /// Current switch state.
    pub fn latch(&self) -> &Latch {
        &self.latch
    }
}

impl Interpreter for DimmerBinaryLatched {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        self.latch.update(frame[self.signal], frame.time);
        let level = if self.latch.is_on() { 255.0 } else { 0.0 };
        for id in &self.group {
            rig.set_dimmer(*id, level);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "DimmerBinaryLatched".to_string()
    }
}

/// Fades toward full while latched and back to dark afterwards.
pub struct DimmerFadeLatched {
    group: Vec<FixtureId>,
    params: LatchParams,
    latch: Latch,
    memory: f32,
}

impl DimmerFadeLatched {
    /// Hype rating.
    pub const HYPE: f32 = 40.0;

    /// Latch `group` with fades.
    pub fn new(group: &[FixtureId], params: LatchParams) -> Self {
        Self {
            group: group.to_vec(),
            latch: params.latch(),
            params,
            memory: 0.0,
        }
    }

    /// Current level, `0..=255`.
    pub fn memory(&self) -> f32 {
        self.memory
    }

    /// Latch duration in seconds.
    pub fn latch_time(&self) -> f64 {
        self.params.latch_time
    }
}

fn fade(memory: f32, on: bool, params: &LatchParams) -> f32 {
    if on {
        lerp(memory, 255.0, params.fade_in_rate)
    } else {
        lerp(memory, 0.0, params.fade_out_rate)
    }
}

impl Interpreter for DimmerFadeLatched {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        self.latch.update(frame[self.params.signal], frame.time);
        self.memory = fade(self.memory, self.latch.is_on(), &self.params);
        for id in &self.group {
            rig.set_dimmer(*id, self.memory);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "DimmerFadeLatched".to_string()
    }
}

/// Like [`DimmerFadeLatched`], but each latch lights a single random
/// fixture while the rest stay dark.
pub struct DimmerFadeLatchedRandom {
    group: Vec<FixtureId>,
    params: LatchParams,
    latch: Latch,
    memory: f32,
    selected: Option<usize>,
    rng: StdRng,
}

impl DimmerFadeLatchedRandom {
    /// Hype rating.
    pub const HYPE: f32 = 50.0;

    /// Latch one random member of `group` at a time.
    pub fn new(group: &[FixtureId], params: LatchParams, rng: StdRng) -> Self {
        Self {
            group: group.to_vec(),
            latch: params.latch(),
            params,
            memory: 0.0,
            selected: None,
            rng,
        }
    }

    /// Fixture lit by the current latch.
    pub fn selected(&self) -> Option<FixtureId> {
        self.selected.map(|i| self.group[i])
    }
}

impl Interpreter for DimmerFadeLatchedRandom {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, _scheme: &ColorScheme) {
        if self.latch.update(frame[self.params.signal], frame.time) && !self.group.is_empty() {
            self.selected = Some(self.rng.random_range(0..self.group.len()));
        }
        self.memory = fade(self.memory, self.latch.is_on(), &self.params);
        for (i, id) in self.group.iter().enumerate() {
            let level = if Some(i) == self.selected { self.memory } else { 0.0 };
            rig.set_dimmer(*id, level);
        }
    }

    fn get_hype(&self) -> f32 {
        Self::HYPE
    }

    fn name(&self) -> String {
        "DimmerFadeLatchedRandom".to_string()
    }
}
