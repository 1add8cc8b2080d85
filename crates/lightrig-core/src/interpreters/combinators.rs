//! Interpreters that wrap or combine other interpreters.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::Rng;

use crate::color_scheme::ColorScheme;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::{Frame, FrameSignal};
use crate::interpreters::dimmer::Twinkle;
use crate::interpreters::strobe::STROBE_HIGH;
use crate::interpreters::{fork_rng, Interpreter, MAX_HYPE};

/// Runs every child against the same group, in order.
///
/// Dimmer and strobe conflicts resolve by the rig's max rule, so order only
/// matters for color, pan and tilt, where the last child wins.
pub struct Combo {
    group: Vec<FixtureId>,
    children: Vec<Box<dyn Interpreter>>,
}

impl Combo {
    /// Combine `children` over `group`.
    pub fn new(group: &[FixtureId], children: Vec<Box<dyn Interpreter>>) -> Self {
        Self {
            group: group.to_vec(),
            children,
        }
    }

    /// Wrapped interpreters, in step order.
    pub fn children(&self) -> &[Box<dyn Interpreter>] {
        &self.children
    }
}

impl Interpreter for Combo {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        for child in &mut self.children {
            child.step(rig, frame, scheme);
        }
    }

    fn exit(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        for child in &mut self.children {
            child.exit(rig, frame, scheme);
        }
    }

    fn get_hype(&self) -> f32 {
        self.children.iter().map(|c| c.get_hype()).fold(0.0, f32::max)
    }

    fn name(&self) -> String {
        let names: Vec<String> = self.children.iter().map(|c| c.name()).collect();
        names.join(" + ")
    }
}

/// Subscription odds for each reaction of a [`SignalSwitch`].
pub const SIGNAL_PROBABILITIES: [(FrameSignal, f64); 5] = [
    (FrameSignal::Strobe, 0.4),
    (FrameSignal::BigPulse, 0.7),
    (FrameSignal::SmallPulse, 0.3),
    (FrameSignal::Twinkle, 0.6),
    (FrameSignal::Dampen, 0.9),
];

const BIG_PULSE_DECAY: f32 = 0.9;
const SMALL_PULSE_DECAY: f32 = 0.8;
const PULSE_LEVEL: f32 = 225.0;
const SIGNAL_ON: f32 = 0.5;

/// Layers reactions to the manual signals on top of a base interpreter.
///
/// Which signals it reacts to is drawn once at construction from
/// [`SIGNAL_PROBABILITIES`].
pub struct SignalSwitch {
    group: Vec<FixtureId>,
    inner: Box<dyn Interpreter>,
    responds_to: BTreeMap<FrameSignal, bool>,
    big_pulse: f32,
    small_pulse: f32,
    twinkle_targets: Vec<FixtureId>,
    twinkle: Option<Twinkle>,
    rng: StdRng,
}

impl SignalSwitch {
    /// Wrap `inner`. Twinkles go to the group's bulbs when it has any.
    pub fn new(group: &[FixtureId], rig: &Rig, inner: Box<dyn Interpreter>, rng: &mut StdRng) -> Self {
        let responds_to = SIGNAL_PROBABILITIES
            .iter()
            .map(|(signal, p)| (*signal, rng.random_bool(*p)))
            .collect();
        let bulbs = rig.bulbs_of(group);
        let twinkle_targets = if bulbs.is_empty() { group.to_vec() } else { bulbs };
        Self {
            group: group.to_vec(),
            inner,
            responds_to,
            big_pulse: 0.0,
            small_pulse: 0.0,
            twinkle_targets,
            twinkle: None,
            rng: fork_rng(rng),
        }
    }

    /// Whether this switch reacts to `signal`.
    pub fn is_enabled(&self, signal: FrameSignal) -> bool {
        self.responds_to.get(&signal).copied().unwrap_or(false)
    }

    /// Override the subscription for `signal`. Signals without a reaction
    /// are ignored.
    pub fn set_enabled(&mut self, signal: FrameSignal, enabled: bool) {
        if let Some(slot) = self.responds_to.get_mut(&signal) {
            *slot = enabled;
        }
    }

    fn reacts(&self, frame: &Frame, signal: FrameSignal) -> bool {
        self.is_enabled(signal) && frame[signal] > SIGNAL_ON
    }
}

impl Interpreter for SignalSwitch {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        self.inner.step(rig, frame, scheme);

        if self.reacts(frame, FrameSignal::Strobe) {
            for id in &self.group {
                rig.set_strobe(*id, STROBE_HIGH);
                rig.set_dimmer(*id, PULSE_LEVEL);
            }
        }

        if self.is_enabled(FrameSignal::BigPulse) {
            self.big_pulse = if frame[FrameSignal::BigPulse] > SIGNAL_ON {
                PULSE_LEVEL
            } else {
                self.big_pulse * BIG_PULSE_DECAY
            };
        }
        if self.is_enabled(FrameSignal::SmallPulse) {
            self.small_pulse = if frame[FrameSignal::SmallPulse] > SIGNAL_ON {
                PULSE_LEVEL
            } else {
                self.small_pulse * SMALL_PULSE_DECAY
            };
        }

        if self.reacts(frame, FrameSignal::Dampen) {
            for id in &self.group {
                rig.force_dimmer(*id, 0.0);
            }
            return;
        }

        let pulse = self.big_pulse.max(self.small_pulse);
        for id in &self.group {
            rig.set_dimmer(*id, pulse);
        }

        if self.is_enabled(FrameSignal::Twinkle) {
            if frame[FrameSignal::Twinkle] > SIGNAL_ON {
                if self.twinkle.is_none() {
                    self.twinkle = Some(Twinkle::new(&self.twinkle_targets, fork_rng(&mut self.rng)));
                }
            } else if let Some(mut twinkle) = self.twinkle.take() {
                twinkle.exit(rig, frame, scheme);
            }
            if let Some(twinkle) = &mut self.twinkle {
                twinkle.step(rig, frame, scheme);
            }
        }
    }

    fn exit(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        self.inner.exit(rig, frame, scheme);
        for id in &self.group {
            rig.force_strobe(*id, 0.0);
        }
        if let Some(mut twinkle) = self.twinkle.take() {
            twinkle.exit(rig, frame, scheme);
        }
    }

    fn get_hype(&self) -> f32 {
        self.inner.get_hype()
    }

    fn name(&self) -> String {
        self.inner.name()
    }
}

/// Two-state machine that swaps to a hyped variant while the `hype` signal
/// is above 0.5.
///
/// The interpreter being deactivated gets exactly one `exit` per transition,
/// before the other one steps.
pub struct HypeSwitch {
    group: Vec<FixtureId>,
    std: Box<dyn Interpreter>,
    hyped: Box<dyn Interpreter>,
    hype_active: bool,
}

impl HypeSwitch {
    /// Extra hype reported on top of the standard interpreter.
    pub const HYPE_BOOST: f32 = 30.0;
    const THRESHOLD: f32 = 0.5;

    /// Start in the standard state.
    pub fn new(group: &[FixtureId], std: Box<dyn Interpreter>, hyped: Box<dyn Interpreter>) -> Self {
        Self {
            group: group.to_vec(),
            std,
            hyped,
            hype_active: false,
        }
    }

    /// Whether the hyped variant is running.
    pub fn is_hype_active(&self) -> bool {
        self.hype_active
    }

    fn active(&mut self) -> &mut Box<dyn Interpreter> {
        if self.hype_active {
            &mut self.hyped
        } else {
            &mut self.std
        }
    }
}

impl Interpreter for HypeSwitch {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        let want_hype = frame[FrameSignal::Hype] > Self::THRESHOLD;
        if want_hype != self.hype_active {
            self.active().exit(rig, frame, scheme);
            self.hype_active = want_hype;
        }
        self.active().step(rig, frame, scheme);
    }

    fn exit(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        self.active().exit(rig, frame, scheme);
    }

    fn get_hype(&self) -> f32 {
        (self.std.get_hype() + Self::HYPE_BOOST).min(MAX_HYPE)
    }

    fn name(&self) -> String {
        format!("HypeSwitch({} | {})", self.std.name(), self.hyped.name())
    }
}

/// Renames an interpreter and optionally overrides its hype rating.
pub struct Named {
    name: String,
    hype: Option<f32>,
    inner: Box<dyn Interpreter>,
}

impl Named {
    /// Wrap `inner` as `name`.
    pub fn new(name: &str, hype: Option<f32>, inner: Box<dyn Interpreter>) -> Self {
        Self {
            name: name.to_string(),
            hype,
            inner,
        }
    }
}

impl Interpreter for Named {
    fn group(&self) -> &[FixtureId] {
        self.inner.group()
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        self.inner.step(rig, frame, scheme);
    }

    fn exit(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        self.inner.exit(rig, frame, scheme);
    }

    fn get_hype(&self) -> f32 {
        self.hype.unwrap_or_else(|| self.inner.get_hype())
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Runs an interpreter built over the bulbs of the group's fixtures.
pub struct ForBulbs {
    group: Vec<FixtureId>,
    inner: Box<dyn Interpreter>,
}

impl ForBulbs {
    /// `inner` must already target the bulbs of `group`.
    pub fn new(group: &[FixtureId], inner: Box<dyn Interpreter>) -> Self {
        Self {
            group: group.to_vec(),
            inner,
        }
    }
}

impl Interpreter for ForBulbs {
    fn group(&self) -> &[FixtureId] {
        &self.group
    }

    fn step(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        self.inner.step(rig, frame, scheme);
    }

    fn exit(&mut self, rig: &mut Rig, frame: &Frame, scheme: &ColorScheme) {
        self.inner.exit(rig, frame, scheme);
    }

    fn get_hype(&self) -> f32 {
        self.inner.get_hype()
    }

    fn name(&self) -> String {
        format!("ForBulbs({})", self.inner.name())
    }
}
