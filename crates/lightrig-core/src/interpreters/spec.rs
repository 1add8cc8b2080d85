//! Declarative interpreter factories.
//!
//! Policy tables list [`InterpreterSpec`] values rather than live
//! interpreters so that eligibility can be checked and the random choice made
//! at the moment a fixture group actually needs an interpreter.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::color::Color;
use crate::fixtures::{FixtureId, Rig};
use crate::frame::FrameSignal;
use crate::interpreters::bulbs::AllBulbs255;
use crate::interpreters::color::{ColorFixed, ColorRainbow, SchemeColor, SchemeRole};
use crate::interpreters::combinators::{Combo, ForBulbs, HypeSwitch, Named, SignalSwitch};
use crate::interpreters::dimmer::{
    ConstDimmer, DimmerFadeIn, DimmersBeatChase, GentlePulse, Noop, PulseParams, SequenceDimmers,
    SequenceFadeDimmers, Twinkle,
};
use crate::interpreters::latched::{
    DimmerBinaryLatched, DimmerFadeLatched, DimmerFadeLatchedRandom, LatchParams,
};
use crate::interpreters::movement::{Move, MoveFan, PanLatched};
use crate::interpreters::movers::{MoverGobo, OPEN_GOBO};
use crate::interpreters::slow::{DecayParams, SlowDecay, SlowRespond};
use crate::interpreters::spatial::SpatialDownwardsPulse;
use crate::interpreters::strobe::{Spin, StrobeHighSustained};
use crate::interpreters::{acceptable_test, fork_rng, Interpreter, InterpreterArgs};
use crate::{CoreError, Result};

/// Every concrete interpreter, with its constructor parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpreterKind {
    /// Writes nothing
    Noop,
    /// Scheme foreground color
    ColorFg,
    /// Scheme background color
    ColorBg,
    /// Scheme contrast color
    ColorAlternateBg,
    /// Hue cycle across the group
    ColorRainbow,
    /// One fixed color
    ColorFixed(Color),
    /// Dark, strobe off
    Dimmer0,
    /// Constant low level
    Dimmer30,
    /// Constant full level
    Dimmer255,
    /// Linear fade up
    DimmerFadeIn {
        /// Seconds from dark to full
        fade_time: f32,
    },
    /// One fixture at a time, stepping on a timer
    SequenceDimmers {
        /// Level of the lit fixture
        dimmer: f32,
        /// Seconds per fixture
        wait_time: f64,
    },
    /// Cosine wave rolling across the group
    SequenceFadeDimmers {
        /// Seconds per fixture
        wait_time: f64,
    },
    /// Beat-driven single-fixture chase
    DimmersBeatChase,
    /// Random single-fixture pulses
    GentlePulse(PulseParams),
    /// Random sparkle
    Twinkle,
    /// Jump up, fall slowly
    SlowDecay(DecayParams),
    /// Eased bass follow with a swell wave
    SlowRespond,
    /// Hard on/off with minimum on time
    DimmerBinaryLatched(LatchParams),
    /// Faded on/off with minimum on time
    DimmerFadeLatched(LatchParams),
    /// Faded on/off on one random fixture
    DimmerFadeLatchedRandom(LatchParams),
    /// Circular pan/tilt
    MoveCircles {
        /// Speed multiplier
        multiplier: f32,
    },
    /// Tilt nod
    MoveNod,
    /// Figure-eight pan/tilt
    MoveFigureEight,
    /// Pan fan spread across the group
    MoveFan {
        /// Speed multiplier
        multiplier: f32,
        /// Pan offset between neighbours
        spread: f32,
    },
    /// Random pan held while the treble is up
    PanLatched,
    /// Hold a named gobo
    MoverGobo(String),
    /// Open gobo
    MoverNoGobo,
    /// Full strobe
    StrobeHighSustained,
    /// Constant rotation
    Spin {
        /// Rotation speed
        speed: f32,
    },
    /// Every bulb at full
    AllBulbs255,
    /// Band sweeping downwards through space
    SpatialDownwardsPulse,
}

impl InterpreterKind {
    /// Default `DimmerFadeIn`.
    pub const FADE_IN: InterpreterKind = InterpreterKind::DimmerFadeIn { fade_time: 5.0 };

    /// Energy rating of interpreters built from this kind.
    pub fn hype(&self) -> f32 {
        use InterpreterKind as K;
        match self {
            K::SequenceDimmers { .. } => SequenceDimmers::HYPE,
            K::SequenceFadeDimmers { .. } => SequenceFadeDimmers::HYPE,
            K::DimmersBeatChase => DimmersBeatChase::HYPE,
            K::GentlePulse(_) => GentlePulse::HYPE,
            K::Twinkle => Twinkle::HYPE,
            K::SlowDecay(_) => SlowDecay::HYPE,
            K::SlowRespond => SlowRespond::HYPE,
            K::DimmerBinaryLatched(_) => DimmerBinaryLatched::HYPE,
            K::DimmerFadeLatched(_) => DimmerFadeLatched::HYPE,
            K::DimmerFadeLatchedRandom(_) => DimmerFadeLatchedRandom::HYPE,
            K::StrobeHighSustained => StrobeHighSustained::HYPE,
            K::SpatialDownwardsPulse => SpatialDownwardsPulse::HYPE,
            _ => 0.0,
        }
    }

    /// Whether this kind cycles through every hue.
    pub fn has_rainbow(&self) -> bool {
        matches!(self, InterpreterKind::ColorRainbow)
    }

    fn build(&self, group: &[FixtureId], rig: &Rig, rng: &mut StdRng) -> Result<Box<dyn Interpreter>> {
        use InterpreterKind as K;
        let interp: Box<dyn Interpreter> = match self {
            K::Noop => Box::new(Noop::new(group)),
            K::ColorFg => Box::new(SchemeColor::new(group, SchemeRole::Fg)),
            K::ColorBg => Box::new(SchemeColor::new(group, SchemeRole::Bg)),
            K::ColorAlternateBg => Box::new(SchemeColor::new(group, SchemeRole::AlternateBg)),
            K::ColorRainbow => Box::new(ColorRainbow::new(
                group,
                ColorRainbow::DEFAULT_SPEED,
                ColorRainbow::DEFAULT_PHASE_SPREAD,
            )),
            K::ColorFixed(color) => Box::new(ColorFixed::new(group, *color)),
            K::Dimmer0 => Box::new(ConstDimmer::new(group, 0.0)),
            K::Dimmer30 => Box::new(ConstDimmer::new(group, 30.0)),
            K::Dimmer255 => Box::new(ConstDimmer::new(group, 255.0)),
            K::DimmerFadeIn { fade_time } => Box::new(DimmerFadeIn::new(group, *fade_time)),
            K::SequenceDimmers { dimmer, wait_time } => {
                Box::new(SequenceDimmers::new(group, *dimmer, *wait_time))
            }
            K::SequenceFadeDimmers { wait_time } => {
                Box::new(SequenceFadeDimmers::new(group, *wait_time))
            }
            K::DimmersBeatChase => Box::new(DimmersBeatChase::new(group, fork_rng(rng))),
            K::GentlePulse(params) => Box::new(GentlePulse::new(group, *params, fork_rng(rng))),
            K::Twinkle => Box::new(Twinkle::new(group, fork_rng(rng))),
            K::SlowDecay(params) => Box::new(SlowDecay::new(group, *params)),
            K::SlowRespond => Box::new(SlowRespond::new(group)),
            K::DimmerBinaryLatched(params) => Box::new(DimmerBinaryLatched::new(group, *params)),
            K::DimmerFadeLatched(params) => Box::new(DimmerFadeLatched::new(group, *params)),
            K::DimmerFadeLatchedRandom(params) => Box::new(DimmerFadeLatchedRandom::new(
                group,
                *params,
                fork_rng(rng),
            )),
            K::MoveCircles { multiplier } => Box::new(Move::circles(group, *multiplier, rng)),
            K::MoveNod => Box::new(Move::nod(group, 1.0)),
            K::MoveFigureEight => Box::new(Move::figure_eight(group, 1.0, rng)),
            K::MoveFan { multiplier, spread } => Box::new(MoveFan::new(group, *multiplier, *spread)),
            K::PanLatched => Box::new(PanLatched::new(group, fork_rng(rng))),
            K::MoverGobo(gobo) => Box::new(MoverGobo::new(group, rig, gobo)?),
            K::MoverNoGobo => Box::new(MoverGobo::new(group, rig, OPEN_GOBO)?),
            K::StrobeHighSustained => Box::new(StrobeHighSustained::new(group)),
            K::Spin { speed } => Box::new(Spin::new(group, *speed)),
            K::AllBulbs255 => Box::new(AllBulbs255::new(group)),
            K::SpatialDownwardsPulse => Box::new(SpatialDownwardsPulse::new(group)),
        };
        Ok(interp)
    }
}

/// A deferred interpreter: what to build, not the built thing.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpreterSpec {
    /// One concrete interpreter
    Single(InterpreterKind),
    /// Every child, stepped in order
    Combo(Vec<InterpreterSpec>),
    /// One acceptable option, chosen uniformly at build time
    Random(Vec<InterpreterSpec>),
    /// One acceptable option, chosen by weight at build time
    WeightedRandom(Vec<(u32, InterpreterSpec)>),
    /// Inner spec plus manual signal reactions
    SignalSwitch(Box<InterpreterSpec>),
    /// Standard spec, swapped for `hype` while the hype signal is high
    HypeSwitch {
        /// Runs by default
        std: Box<InterpreterSpec>,
        /// Runs while hyped
        hype: Box<InterpreterSpec>,
    },
    /// Renamed inner spec with optional rating overrides
    WithArgs {
        /// Name shown in logs
        name: String,
        /// Wrapped spec
        inner: Box<InterpreterSpec>,
        /// Replaces the inner hype rating
        hype: Option<f32>,
        /// Replaces the inner rainbow flag
        rainbow: Option<bool>,
    },
    /// Inner spec built over the bulbs of the group
    ForBulbs(Box<InterpreterSpec>),
}

/// One concrete interpreter.
pub fn single(kind: InterpreterKind) -> InterpreterSpec {
    InterpreterSpec::Single(kind)
}

/// Run every spec together.
pub fn combo(children: Vec<InterpreterSpec>) -> InterpreterSpec {
    InterpreterSpec::Combo(children)
}

/// Pick one spec at build time.
pub fn randomize(options: Vec<InterpreterSpec>) -> InterpreterSpec {
    InterpreterSpec::Random(options)
}

/// Pick one spec at build time, by weight.
pub fn weighted_randomize(options: Vec<(u32, InterpreterSpec)>) -> InterpreterSpec {
    InterpreterSpec::WeightedRandom(options)
}

/// Layer manual signal reactions over `inner`.
pub fn signal_switch(inner: InterpreterSpec) -> InterpreterSpec {
    InterpreterSpec::SignalSwitch(Box::new(inner))
}

/// Swap `std` for `hype` while the hype signal is high.
pub fn hype_switch(std: InterpreterSpec, hype: InterpreterSpec) -> InterpreterSpec {
    InterpreterSpec::HypeSwitch {
        std: Box::new(std),
        hype: Box::new(hype),
    }
}

/// Rename `inner` and optionally override its rating.
pub fn with_args(
    name: &str,
    inner: InterpreterSpec,
    hype: Option<f32>,
    rainbow: Option<bool>,
) -> InterpreterSpec {
    InterpreterSpec::WithArgs {
        name: name.to_string(),
        inner: Box::new(inner),
        hype,
        rainbow,
    }
}

/// Build `inner` over the bulbs of the group.
pub fn for_bulbs(inner: InterpreterSpec) -> InterpreterSpec {
    InterpreterSpec::ForBulbs(Box::new(inner))
}

// Named presets

/// Short, sharp pulses.
pub fn stab_pulse() -> InterpreterSpec {
    let params = PulseParams {
        decay_rate: 0.3,
        ..PulseParams::default()
    };
    with_args("StabPulse", single(InterpreterKind::GentlePulse(params)), Some(50.0), None)
}

/// Pulses that start on quieter passages.
pub fn gentle_pulse_trigger(trigger_level: f32) -> InterpreterSpec {
    let params = PulseParams {
        trigger_level,
        ..PulseParams::default()
    };
    with_args(
        &format!("GentlePulseTrigger{trigger_level}"),
        single(InterpreterKind::GentlePulse(params)),
        None,
        None,
    )
}

/// Holds peaks for a long time.
pub fn very_slow_decay() -> InterpreterSpec {
    let params = DecayParams {
        decay_rate: 0.01,
        ..DecayParams::default()
    };
    with_args("VerySlowDecay", single(InterpreterKind::SlowDecay(params)), Some(5.0), None)
}

/// Follows the bass envelope.
pub fn slow_sustained() -> InterpreterSpec {
    let params = DecayParams {
        signal: FrameSignal::SustainedLow,
        decay_rate: 0.5,
    };
    with_args("SlowSustained", single(InterpreterKind::SlowDecay(params)), Some(5.0), None)
}

/// Fade latch with a four second minimum.
pub fn dimmer_fade_latched_4s() -> InterpreterSpec {
    let params = LatchParams {
        latch_time: 4.0,
        ..LatchParams::default()
    };
    with_args(
        "DimmerFadeLatched4s",
        single(InterpreterKind::DimmerFadeLatched(params)),
        Some(10.0),
        None,
    )
}

/// Fade latch for lasers, never a rainbow.
pub fn laser_latch() -> InterpreterSpec {
    with_args(
        "LaserLatch",
        single(InterpreterKind::DimmerFadeLatched(LatchParams::default())),
        Some(60.0),
        Some(false),
    )
}

/// Random-fixture fade latch that turns on above `on_above`.
pub fn fade_latch_at(on_above: f32) -> InterpreterSpec {
    let params = LatchParams {
        on_above,
        ..LatchParams::default()
    };
    with_args(
        &format!("FadeLatchAt{on_above}"),
        single(InterpreterKind::DimmerFadeLatchedRandom(params)),
        None,
        None,
    )
}

impl InterpreterSpec {
    /// Whether this spec may be chosen under `args`.
    ///
    /// Combos need every child to pass. Random choices need at least one
    /// option to pass. Wrappers defer to what they wrap.
    pub fn acceptable(&self, args: &InterpreterArgs) -> bool {
        match self {
            InterpreterSpec::Single(kind) => acceptable_test(args, kind.hype(), kind.has_rainbow()),
            InterpreterSpec::Combo(children) => children.iter().all(|c| c.acceptable(args)),
            InterpreterSpec::Random(options) => options.iter().any(|o| o.acceptable(args)),
            InterpreterSpec::WeightedRandom(options) => {
                options.iter().any(|(w, o)| *w > 0 && o.acceptable(args))
            }
            InterpreterSpec::SignalSwitch(inner) | InterpreterSpec::ForBulbs(inner) => {
                inner.acceptable(args)
            }
            InterpreterSpec::HypeSwitch { std, .. } => std.acceptable(args),
            InterpreterSpec::WithArgs {
                inner,
                hype,
                rainbow,
                ..
            } => match hype {
                Some(h) => acceptable_test(args, *h, rainbow.unwrap_or(false)),
                None => {
                    inner.acceptable(args) && (!rainbow.unwrap_or(false) || args.allow_rainbows)
                }
            },
        }
    }

    /// Instantiate for `group`.
    ///
    /// Fails with [`CoreError::EmptyGroup`] for an empty group and propagates
    /// constructor errors such as an unknown gobo.
    pub fn build(
        &self,
        group: &[FixtureId],
        rig: &Rig,
        args: &InterpreterArgs,
        rng: &mut StdRng,
    ) -> Result<Box<dyn Interpreter>> {
        if group.is_empty() {
            return Err(CoreError::EmptyGroup("interpreter target".to_string()));
        }
        match self {
            InterpreterSpec::Single(kind) => kind.build(group, rig, rng),
            InterpreterSpec::Combo(children) => {
                let built = children
                    .iter()
                    .map(|c| c.build(group, rig, args, rng))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(Combo::new(group, built)))
            }
            InterpreterSpec::Random(options) => {
                let eligible: Vec<&InterpreterSpec> =
                    options.iter().filter(|o| o.acceptable(args)).collect();
                match eligible.choose(rng) {
                    Some(choice) => choice.build(group, rig, args, rng),
                    None => Ok(fallback(group, args)),
                }
            }
            InterpreterSpec::WeightedRandom(options) => {
                let eligible: Vec<&(u32, InterpreterSpec)> =
                    options.iter().filter(|(_, o)| o.acceptable(args)).collect();
                match WeightedIndex::new(eligible.iter().map(|(w, _)| *w)) {
                    Ok(dist) => {
                        let (_, choice) = eligible[dist.sample(rng)];
                        choice.build(group, rig, args, rng)
                    }
                    Err(_) => Ok(fallback(group, args)),
                }
            }
            InterpreterSpec::SignalSwitch(inner) => {
                let built = inner.build(group, rig, args, rng)?;
                Ok(Box::new(SignalSwitch::new(group, rig, built, rng)))
            }
            InterpreterSpec::HypeSwitch { std, hype } => {
                let std = std.build(group, rig, args, rng)?;
                let hype = hype.build(group, rig, args, rng)?;
                Ok(Box::new(HypeSwitch::new(group, std, hype)))
            }
            InterpreterSpec::WithArgs {
                name, inner, hype, ..
            } => {
                let built = inner.build(group, rig, args, rng)?;
                Ok(Box::new(Named::new(name, *hype, built)))
            }
            InterpreterSpec::ForBulbs(inner) => {
                let bulbs = rig.bulbs_of(group);
                let targets = if bulbs.is_empty() { group } else { &bulbs };
                let built = inner.build(targets, rig, args, rng)?;
                Ok(Box::new(ForBulbs::new(group, built)))
            }
        }
    }
}

fn fallback(group: &[FixtureId], args: &InterpreterArgs) -> Box<dyn Interpreter> {
    debug!(
        "No acceptable option for hype {:.0} in [{:.0}, {:.0}], using Dimmer0",
        args.hype, args.min_hype, args.max_hype
    );
    Box::new(ConstDimmer::new(group, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_scheme::ColorScheme;
    use crate::fixtures::FixtureDef;
    use crate::frame::Frame;
    use rand::SeedableRng;

    fn par_rig() -> (Rig, FixtureId) {
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        (rig, par)
    }

    #[test]
    fn test_single_acceptable_uses_rating() {
        let low = InterpreterArgs::new(10.0, true, 0.0, 20.0);
        assert!(single(InterpreterKind::Twinkle).acceptable(&low));
        assert!(!single(InterpreterKind::StrobeHighSustained).acceptable(&low));
        assert!(single(InterpreterKind::ColorFg).acceptable(&low));
    }

    #[test]
    fn test_combo_needs_every_child() {
        let args = InterpreterArgs::new(10.0, true, 0.0, 20.0);
        let spec = combo(vec![
            single(InterpreterKind::Twinkle),
            single(InterpreterKind::StrobeHighSustained),
        ]);
        assert!(!spec.acceptable(&args));
    }

    #[test]
    fn test_rainbow_needs_permission() {
        let args = InterpreterArgs::wide(50.0, false);
        assert!(!single(InterpreterKind::ColorRainbow).acceptable(&args));
        assert!(!with_args("Rainbowish", single(InterpreterKind::ColorFg), None, Some(true))
            .acceptable(&args));
    }

    #[test]
    fn test_with_args_overrides_rating() {
        let args = InterpreterArgs::new(60.0, true, 50.0, 70.0);
        assert!(laser_latch().acceptable(&args));
        assert!(!single(InterpreterKind::DimmerFadeLatched(LatchParams::default())).acceptable(&args));
    }

    #[test]
    fn test_random_skips_unacceptable() {
        let (rig, par) = par_rig();
        let args = InterpreterArgs::new(90.0, true, 80.0, 100.0);
        let spec = randomize(vec![
            single(InterpreterKind::Twinkle),
            single(InterpreterKind::StrobeHighSustained),
        ]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let interp = spec.build(&[par], &rig, &args, &mut rng).unwrap();
            assert_eq!(interp.name(), "StrobeHighSustained");
        }
    }

    #[test]
    fn test_random_falls_back_to_dark() {
        let (mut rig, par) = par_rig();
        let args = InterpreterArgs::new(90.0, true, 80.0, 100.0);
        let spec = randomize(vec![single(InterpreterKind::Twinkle)]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut interp = spec.build(&[par], &rig, &args, &mut rng).unwrap();
        assert_eq!(interp.name(), "Dimmer0");
        interp.step(&mut rig, &Frame::at(0.0), &ColorScheme::default());
        assert_eq!(rig.get_dimmer(par), 0.0);
    }

    #[test]
    fn test_weighted_zero_weight_never_chosen() {
        let (rig, par) = par_rig();
        let args = InterpreterArgs::wide(50.0, true);
        let spec = weighted_randomize(vec![
            (0, single(InterpreterKind::Dimmer30)),
            (5, single(InterpreterKind::Dimmer255)),
        ]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(spec.build(&[par], &rig, &args, &mut rng).unwrap().name(), "Dimmer255");
        }
    }

    #[test]
    fn test_names() {
        let (rig, par) = par_rig();
        let args = InterpreterArgs::wide(50.0, true);
        let mut rng = StdRng::seed_from_u64(0);

        let hs = hype_switch(single(InterpreterKind::Dimmer30), single(InterpreterKind::StrobeHighSustained));
        assert_eq!(
            hs.build(&[par], &rig, &args, &mut rng).unwrap().name(),
            "HypeSwitch(Dimmer30 | StrobeHighSustained)"
        );
        assert_eq!(stab_pulse().build(&[par], &rig, &args, &mut rng).unwrap().name(), "StabPulse");
        assert_eq!(
            for_bulbs(single(InterpreterKind::Dimmer255))
                .build(&[par], &rig, &args, &mut rng)
                .unwrap()
                .name(),
            "ForBulbs(Dimmer255)"
        );
    }

    #[test]
    fn test_empty_group_rejected() {
        let (rig, _) = par_rig();
        let mut rng = StdRng::seed_from_u64(0);
        let result = single(InterpreterKind::Dimmer255).build(
            &[],
            &rig,
            &InterpreterArgs::wide(0.0, true),
            &mut rng,
        );
        assert!(matches!(result, Err(CoreError::EmptyGroup(_))));
    }

    #[test]
    fn test_for_bulbs_targets_bulbs() {
        let mut rig = Rig::new();
        let strip = rig.add(FixtureDef::motionstrip38(1, 0.0, 256.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut interp = for_bulbs(single(InterpreterKind::Dimmer255))
            .build(&[strip], &rig, &InterpreterArgs::wide(0.0, true), &mut rng)
            .unwrap();
        interp.step(&mut rig, &Frame::at(0.0), &ColorScheme::default());
        assert_eq!(rig.get_dimmer(strip), 0.0);
        assert!(rig.bulbs_of(&[strip]).iter().all(|b| rig.get_dimmer(*b) == 255.0));
    }
}
