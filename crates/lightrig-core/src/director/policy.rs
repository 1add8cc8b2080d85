//! Policy tables: which interpreters each kind of fixture gets in each
//! mode, phrase and scene.
//!
//! Entries are matched in definition order against the kind of the first
//! fixture in a group, so more specific classes must come before
//! [`FixtureClass::Any`].

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use tracing::debug;

use crate::color::Color;
use crate::director::mode::{Mode, Phrase};
use crate::fixtures::{FixtureClass, FixtureId, FixtureKind, FixtureTag, Rig};
use crate::interpreters::dimmer::PulseParams;
use crate::interpreters::latched::LatchParams;
use crate::interpreters::slow::DecayParams;
use crate::interpreters::spec::{
    dimmer_fade_latched_4s, fade_latch_at, gentle_pulse_trigger, laser_latch, slow_sustained,
    very_slow_decay,
};
use crate::interpreters::{
    combo, for_bulbs, randomize, signal_switch, single, weighted_randomize, with_args,
    Interpreter, InterpreterArgs, InterpreterKind as K, InterpreterSpec,
};
use crate::{CoreError, Result};

/// Options for one fixture class. One option is chosen at random.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyEntry {
    /// Which fixtures this entry applies to
    pub class: FixtureClass,
    /// Candidate specs
    pub options: Vec<InterpreterSpec>,
}

impl PolicyEntry {
    /// Entry for `class`.
    pub fn new(class: FixtureClass, options: Vec<InterpreterSpec>) -> Self {
        Self { class, options }
    }
}

/// One rule of a scene: every listed interpreter runs on the fixtures of a
/// group that carry all `tags` and sit inside `addresses`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRule {
    /// Which groups this rule applies to
    pub class: FixtureClass,
    /// Run together as a combo
    pub interpreters: Vec<InterpreterSpec>,
    /// Required tags, empty for no filtering
    pub tags: Vec<FixtureTag>,
    /// Allowed fixture addresses, `None` for all
    pub addresses: Option<RangeInclusive<u16>>,
}

/// Context a policy lookup is made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyContext {
    /// Operator-selected mode
    Mode(Mode),
    /// Detected musical phrase
    Phrase(Phrase),
}

impl From<Mode> for PolicyContext {
    fn from(mode: Mode) -> Self {
        PolicyContext::Mode(mode)
    }
}

impl From<Phrase> for PolicyContext {
    fn from(phrase: Phrase) -> Self {
        PolicyContext::Phrase(phrase)
    }
}

/// Every policy table, built once and handed to the director.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    modes: BTreeMap<Mode, Vec<PolicyEntry>>,
    phrases: BTreeMap<Phrase, Vec<PolicyEntry>>,
    scenes: BTreeMap<String, Vec<SceneRule>>,
}

impl PolicyRegistry {
    /// Empty tables. Every lookup falls back to dark.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in tables.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.set_mode(Mode::Blackout, Vec::new());
        registry.set_mode(Mode::Gentle, gentle());
        registry.set_mode(Mode::Rave, rave());
        for (phrase, entries) in phrases() {
            registry.set_phrase(phrase, entries);
        }
        for (name, rules) in scenes() {
            registry.set_scene(&name, rules);
        }
        registry
    }

    /// Replace the table for `mode`.
    pub fn set_mode(&mut self, mode: Mode, entries: Vec<PolicyEntry>) {
        self.modes.insert(mode, entries);
    }

    /// Replace the table for `phrase`.
    pub fn set_phrase(&mut self, phrase: Phrase, entries: Vec<PolicyEntry>) {
        self.phrases.insert(phrase, entries);
    }

    /// Add or replace a scene.
    pub fn set_scene(&mut self, name: &str, rules: Vec<SceneRule>) {
        self.scenes.insert(name.to_string(), rules);
    }

    /// Names of every scene, sorted.
    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    /// Whether `name` is a known scene.
    pub fn has_scene(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    fn entries(&self, context: PolicyContext) -> &[PolicyEntry] {
        let entries = match context {
            PolicyContext::Mode(mode) => self.modes.get(&mode),
            PolicyContext::Phrase(phrase) => self.phrases.get(&phrase),
        };
        entries.map(Vec::as_slice).unwrap_or_default()
    }

    /// Build the interpreter for `group` in `context`.
    ///
    /// The first entry whose class matches the first fixture's kind is
    /// randomized over; with no match the group is held dark. Errors only for
    /// an empty group or a spec that cannot be built on these fixtures.
    pub fn get_interpreter(
        &self,
        context: impl Into<PolicyContext>,
        group: &[FixtureId],
        rig: &Rig,
        args: &InterpreterArgs,
        rng: &mut StdRng,
    ) -> Result<Box<dyn Interpreter>> {
        let context = context.into();
        let first = group
            .first()
            .ok_or_else(|| CoreError::EmptyGroup(format!("{context:?} group")))?;
        let kind = rig.get(*first).kind();

        let spec = match self.entries(context).iter().find(|e| e.class.matches(kind)) {
            Some(entry) => randomize(entry.options.clone()),
            None => single(K::Dimmer0),
        };
        let interp = spec.build(group, rig, args, rng)?;
        debug!("{:?}: {} -> {}", context, rig.describe(*first), interp.name());
        Ok(interp)
    }

    /// Whether `context` has an entry for fixtures of this kind.
    pub fn covers(&self, context: impl Into<PolicyContext>, kind: FixtureKind) -> bool {
        self.entries(context.into()).iter().any(|e| e.class.matches(kind))
    }

    /// Build the interpreter for `group` under the current mode and phrase.
    ///
    /// The phrase table is used when a phrase is set, the mode is not
    /// [`Mode::Blackout`] and the table covers the group's kind. Everything
    /// else goes through the mode table.
    pub fn select_interpreter(
        &self,
        mode: Mode,
        phrase: Option<Phrase>,
        group: &[FixtureId],
        rig: &Rig,
        args: &InterpreterArgs,
        rng: &mut StdRng,
    ) -> Result<Box<dyn Interpreter>> {
        let phrase = phrase.filter(|phrase| {
            mode != Mode::Blackout
                && group
                    .first()
                    .is_some_and(|id| self.covers(*phrase, rig.get(*id).kind()))
        });
        match phrase {
            Some(phrase) => self.get_interpreter(phrase, group, rig, args, rng),
            None => self.get_interpreter(mode, group, rig, args, rng),
        }
    }

    /// Build the scene interpreter for `group`, or `None` when the scene has
    /// nothing for these fixtures.
    ///
    /// `None` means the group is left to the other interpreters, not that it
    /// is turned off. Fails with [`CoreError::UnknownScene`] for an unknown
    /// name.
    pub fn get_scene_interpreter(
        &self,
        scene: &str,
        group: &[FixtureId],
        rig: &Rig,
        args: &InterpreterArgs,
        rng: &mut StdRng,
    ) -> Result<Option<Box<dyn Interpreter>>> {
        let rules = self
            .scenes
            .get(scene)
            .ok_or_else(|| CoreError::UnknownScene(scene.to_string()))?;
        let Some(first) = group.first() else {
            return Ok(None);
        };
        let kind = rig.get(*first).kind();

        for rule in rules.iter().filter(|r| r.class.matches(kind)) {
            let targets: Vec<FixtureId> = group
                .iter()
                .copied()
                .filter(|id| rig.has_all_tags(*id, &rule.tags))
                .filter(|id| {
                    rule.addresses
                        .as_ref()
                        .map_or(true, |range| range.contains(&rig.get(*id).base.address))
                })
                .collect();
            if targets.is_empty() {
                continue;
            }
            let interp = combo(rule.interpreters.clone()).build(&targets, rig, args, rng)?;
            debug!("scene {}: {} fixtures -> {}", scene, targets.len(), interp.name());
            return Ok(Some(interp));
        }
        Ok(None)
    }
}

fn pulse_or_twinkle() -> InterpreterSpec {
    signal_switch(randomize(vec![
        single(K::GentlePulse(PulseParams::default())),
        single(K::Twinkle),
    ]))
}

fn slow_decay() -> InterpreterSpec {
    single(K::SlowDecay(DecayParams::default()))
}

fn gentle_pulse() -> InterpreterSpec {
    single(K::GentlePulse(PulseParams::default()))
}

fn fade_latched() -> InterpreterSpec {
    single(K::DimmerFadeLatched(LatchParams::default()))
}

fn circles() -> InterpreterSpec {
    single(K::MoveCircles { multiplier: 1.0 })
}

fn spin() -> InterpreterSpec {
    single(K::Spin { speed: 50.0 })
}

fn gentle() -> Vec<PolicyEntry> {
    let wash = || combo(vec![pulse_or_twinkle(), single(K::ColorBg)]);
    vec![
        PolicyEntry::new(FixtureClass::Par, vec![wash()]),
        PolicyEntry::new(
            FixtureClass::MovingHead,
            vec![combo(vec![pulse_or_twinkle(), single(K::ColorBg), circles()])],
        ),
        PolicyEntry::new(FixtureClass::Motionstrip, vec![wash()]),
        PolicyEntry::new(FixtureClass::Laser, vec![signal_switch(single(K::Dimmer0))]),
        PolicyEntry::new(FixtureClass::Rotosphere, vec![wash()]),
        PolicyEntry::new(FixtureClass::Derby, vec![wash()]),
    ]
}

fn strip_dimmers() -> InterpreterSpec {
    signal_switch(randomize(vec![
        combo(vec![single(K::Dimmer255), for_bulbs(single(K::Twinkle))]),
        combo(vec![single(K::DimmersBeatChase), single(K::AllBulbs255)]),
        combo(vec![slow_decay(), single(K::AllBulbs255)]),
        combo(vec![single(K::Dimmer255), for_bulbs(gentle_pulse_trigger(0.1))]),
        combo(vec![single(K::Dimmer255), for_bulbs(single(K::DimmersBeatChase))]),
    ]))
}

fn rave() -> Vec<PolicyEntry> {
    let rotosphere_spin_color = with_args(
        "RotosphereSpinColor",
        combo(vec![single(K::ColorFg), spin()]),
        None,
        None,
    );
    vec![
        PolicyEntry::new(
            FixtureClass::Par,
            vec![combo(vec![
                signal_switch(randomize(vec![
                    single(K::DimmersBeatChase),
                    single(K::SequenceFadeDimmers { wait_time: 3.0 }),
                    gentle_pulse(),
                    very_slow_decay(),
                    slow_sustained(),
                    single(K::SpatialDownwardsPulse),
                ])),
                randomize(vec![
                    single(K::ColorAlternateBg),
                    single(K::ColorBg),
                    single(K::ColorRainbow),
                ]),
            ])],
        ),
        PolicyEntry::new(
            FixtureClass::MovingHead,
            vec![combo(vec![
                signal_switch(randomize(vec![
                    single(K::DimmersBeatChase),
                    slow_decay(),
                    gentle_pulse(),
                    fade_latched(),
                    single(K::SequenceDimmers {
                        dimmer: 255.0,
                        wait_time: 0.5,
                    }),
                    single(K::SequenceFadeDimmers { wait_time: 3.0 }),
                    fade_latch_at(0.3),
                ])),
                weighted_randomize(vec![(95, single(K::ColorFg)), (5, single(K::ColorRainbow))]),
                randomize(vec![circles(), single(K::MoveNod), single(K::MoveFigureEight)]),
                weighted_randomize(vec![
                    (
                        10,
                        with_args(
                            "StarburstGobo",
                            single(K::MoverGobo("starburst".to_string())),
                            None,
                            None,
                        ),
                    ),
                    (90, single(K::MoverNoGobo)),
                ]),
            ])],
        ),
        PolicyEntry::new(
            FixtureClass::Motionstrip,
            vec![combo(vec![
                strip_dimmers(),
                randomize(vec![
                    single(K::ColorFg),
                    single(K::ColorAlternateBg),
                    single(K::ColorBg),
                    for_bulbs(single(K::ColorRainbow)),
                ]),
                randomize(vec![single(K::PanLatched), circles()]),
            ])],
        ),
        PolicyEntry::new(
            FixtureClass::Laser,
            vec![signal_switch(laser_latch()), single(K::StrobeHighSustained)],
        ),
        PolicyEntry::new(
            FixtureClass::Rotosphere,
            vec![
                combo(vec![
                    rotosphere_spin_color,
                    randomize(vec![
                        single(K::FADE_IN),
                        for_bulbs(single(K::Twinkle)),
                        for_bulbs(gentle_pulse()),
                        dimmer_fade_latched_4s(),
                        slow_sustained(),
                    ]),
                ]),
                combo(vec![for_bulbs(single(K::ColorRainbow)), spin(), very_slow_decay()]),
            ],
        ),
        PolicyEntry::new(
            FixtureClass::Derby,
            vec![combo(vec![
                randomize(vec![spin(), single(K::Noop)]),
                randomize(vec![single(K::ColorAlternateBg), single(K::ColorFg)]),
                randomize(vec![
                    gentle_pulse(),
                    fade_latched(),
                    dimmer_fade_latched_4s(),
                    single(K::DimmerBinaryLatched(LatchParams::default())),
                    slow_decay(),
                    single(K::Dimmer0),
                ]),
            ])],
        ),
    ]
}

fn phrases() -> Vec<(Phrase, Vec<PolicyEntry>)> {
    let beat_and_circle = with_args(
        "MoverBeatAndCircle",
        combo(vec![single(K::DimmersBeatChase), single(K::ColorFg), circles()]),
        None,
        None,
    );
    let beat_in_fan = with_args(
        "MoverBeatInFan",
        combo(vec![
            single(K::DimmersBeatChase),
            single(K::ColorFg),
            single(K::MoveFan {
                multiplier: 1.0,
                spread: 1.0,
            }),
        ]),
        None,
        None,
    );
    let dim_and_circle = with_args(
        "MoverDimAndCircle",
        combo(vec![single(K::Dimmer30), single(K::ColorFg), circles()]),
        None,
        None,
    );
    let bulb_beat_and_wiggle = with_args(
        "MotionstripBulbBeatAndWiggle",
        combo(vec![
            single(K::Dimmer255),
            for_bulbs(single(K::DimmersBeatChase)),
            single(K::ColorFg),
            single(K::PanLatched),
        ]),
        None,
        None,
    );
    let strip_slow_respond = with_args(
        "MotionstripSlowRespond",
        combo(vec![single(K::SlowRespond), single(K::ColorFg), circles()]),
        None,
        None,
    );
    let rotosphere_on = with_args(
        "RotosphereOn",
        combo(vec![single(K::Dimmer255), single(K::ColorFg), spin()]),
        None,
        None,
    );

    vec![
        (
            Phrase::IntroOutro,
            vec![
                PolicyEntry::new(
                    FixtureClass::Par,
                    vec![
                        combo(vec![slow_decay(), single(K::ColorAlternateBg)]),
                        combo(vec![single(K::SlowRespond), single(K::ColorAlternateBg)]),
                    ],
                ),
                PolicyEntry::new(FixtureClass::Rotosphere, vec![rotosphere_on]),
            ],
        ),
        (
            Phrase::Build,
            vec![
                PolicyEntry::new(FixtureClass::MovingHead, vec![beat_and_circle, beat_in_fan]),
                PolicyEntry::new(FixtureClass::Motionstrip, vec![bulb_beat_and_wiggle]),
                PolicyEntry::new(
                    FixtureClass::Par,
                    vec![combo(vec![single(K::DimmersBeatChase), single(K::ColorAlternateBg)])],
                ),
            ],
        ),
        (
            Phrase::Drop,
            vec![
                PolicyEntry::new(
                    FixtureClass::Par,
                    vec![combo(vec![slow_decay(), single(K::ColorAlternateBg)])],
                ),
                PolicyEntry::new(
                    FixtureClass::MovingHead,
                    vec![combo(vec![single(K::DimmersBeatChase), single(K::ColorFg), circles()])],
                ),
                PolicyEntry::new(FixtureClass::Motionstrip, vec![strip_slow_respond]),
                PolicyEntry::new(FixtureClass::Laser, vec![fade_latched()]),
            ],
        ),
        (
            Phrase::Breakdown,
            vec![
                PolicyEntry::new(
                    FixtureClass::Par,
                    vec![combo(vec![gentle_pulse(), single(K::ColorAlternateBg)])],
                ),
                PolicyEntry::new(FixtureClass::MovingHead, vec![dim_and_circle]),
                PolicyEntry::new(
                    FixtureClass::Motionstrip,
                    vec![combo(vec![single(K::SlowRespond), single(K::ColorFg), circles()])],
                ),
            ],
        ),
        (
            Phrase::General,
            vec![PolicyEntry::new(
                FixtureClass::Par,
                vec![combo(vec![
                    randomize(vec![
                        gentle_pulse(),
                        single(K::SlowRespond),
                        single(K::DimmersBeatChase),
                        very_slow_decay(),
                    ]),
                    randomize(vec![
                        single(K::ColorAlternateBg),
                        single(K::ColorBg),
                        single(K::ColorRainbow),
                    ]),
                ])],
            )],
        ),
    ]
}

fn scenes() -> Vec<(String, Vec<SceneRule>)> {
    let manual = |addresses| {
        vec![SceneRule {
            class: FixtureClass::Any,
            interpreters: vec![single(K::Dimmer255)],
            tags: vec![FixtureTag::Manual],
            addresses,
        }]
    };
    vec![
        ("manual_fixtures".to_string(), manual(None)),
        ("manual_fixtures_1_9".to_string(), manual(Some(1..=9))),
        (
            "purple_pars".to_string(),
            vec![SceneRule {
                class: FixtureClass::Any,
                interpreters: vec![
                    single(K::Dimmer255),
                    single(K::ColorFixed(Color::from_rgb8(128, 0, 128))),
                ],
                tags: vec![FixtureTag::Par],
                addresses: None,
            }],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureDef;
    use rand::SeedableRng;

    fn args() -> InterpreterArgs {
        InterpreterArgs::wide(50.0, true)
    }

    #[test]
    fn test_unmatched_group_falls_back_to_dark() {
        let registry = PolicyRegistry::standard();
        let mut rig = Rig::new();
        let lamp = rig.add(FixtureDef::house_dimmer(1)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let interp = registry
            .get_interpreter(Mode::Rave, &[lamp], &rig, &args(), &mut rng)
            .unwrap();
        assert_eq!(interp.name(), "Dimmer0");

        let blackout = registry
            .get_interpreter(Mode::Blackout, &[lamp], &rig, &args(), &mut rng)
            .unwrap();
        assert_eq!(blackout.name(), "Dimmer0");
    }

    #[test]
    fn test_phrase_table_takes_precedence_when_it_covers_the_group() {
        let mut registry = PolicyRegistry::new();
        registry.set_mode(
            Mode::Rave,
            vec![PolicyEntry::new(FixtureClass::Any, vec![single(K::Dimmer30)])],
        );
        registry.set_phrase(
            Phrase::Build,
            vec![PolicyEntry::new(FixtureClass::Par, vec![single(K::Dimmer255)])],
        );
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        let laser = rig.add(FixtureDef::five_beam_laser(20)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut name = |mode, phrase, id| {
            registry
                .select_interpreter(mode, phrase, &[id], &rig, &args(), &mut rng)
                .unwrap()
                .name()
        };

        assert_eq!(name(Mode::Rave, Some(Phrase::Build), par), "Dimmer255");
        assert_eq!(name(Mode::Rave, None, par), "Dimmer30");
        // Not covered by the phrase table
        assert_eq!(name(Mode::Rave, Some(Phrase::Build), laser), "Dimmer30");
        assert_eq!(name(Mode::Blackout, Some(Phrase::Build), par), "Dimmer0");
    }

    #[test]
    fn test_mode_tables_use_every_pattern_kind() {
        let registry = PolicyRegistry::standard();
        let tables = format!("{:?}", registry.entries(PolicyContext::Mode(Mode::Rave)));
        for kind in ["MoveFigureEight", "SpatialDownwardsPulse", "DimmerBinaryLatched"] {
            assert!(tables.contains(kind), "{} missing from rave", kind);
        }
    }

    #[test]
    fn test_every_context_builds_for_every_class() {
        let registry = PolicyRegistry::standard();
        let mut rig = Rig::new();
        let fixtures = [
            rig.add(FixtureDef::led_par(1)).unwrap(),
            rig.add(FixtureDef::chauvet_spot_160(10)).unwrap(),
            rig.add(FixtureDef::chauvet_spot_120(30)).unwrap(),
            rig.add(FixtureDef::motionstrip38(50, 0.0, 256.0)).unwrap(),
            rig.add(FixtureDef::five_beam_laser(100)).unwrap(),
            rig.add(FixtureDef::rotosphere(120)).unwrap(),
            rig.add(FixtureDef::derby(150)).unwrap(),
        ];
        let contexts: Vec<PolicyContext> = Mode::ALL
            .iter()
            .map(|m| PolicyContext::from(*m))
            .chain(Phrase::ALL.iter().map(|p| PolicyContext::from(*p)))
            .collect();

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            for context in &contexts {
                for fixture in fixtures {
                    let result = registry.get_interpreter(*context, &[fixture], &rig, &args(), &mut rng);
                    assert!(result.is_ok(), "{context:?} on {}", rig.describe(fixture));
                }
            }
        }
    }

    #[test]
    fn test_unknown_scene() {
        let registry = PolicyRegistry::standard();
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let result = registry.get_scene_interpreter("disco", &[par], &rig, &args(), &mut rng);
        assert!(matches!(result, Err(CoreError::UnknownScene(_))));
    }

    #[test]
    fn test_purple_pars_only_touches_pars() {
        let registry = PolicyRegistry::standard();
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        let laser = rig.add(FixtureDef::five_beam_laser(20)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let interp = registry
            .get_scene_interpreter("purple_pars", &[par], &rig, &args(), &mut rng)
            .unwrap();
        assert!(interp.is_some());
        assert_eq!(interp.unwrap().group(), &[par]);

        let none = registry
            .get_scene_interpreter("purple_pars", &[laser], &rig, &args(), &mut rng)
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_scene_names() {
        let registry = PolicyRegistry::standard();
        let names: Vec<&str> = registry.scene_names().collect();
        assert_eq!(names, vec!["manual_fixtures", "manual_fixtures_1_9", "purple_pars"]);
    }
}
