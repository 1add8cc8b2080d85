use std::collections::BTreeMap;

use lightrig_core::director::{PolicyEntry, SceneRule};
use lightrig_core::interpreters::{signal_switch, single, InterpreterKind};
use lightrig_core::{
    Director, DirectorConfig, DmxBuffer, FixtureClass, Frame, FrameSignal, InterpreterKey, Mode,
    PolicyRegistry, ShowState, Universe, Venue,
};

fn seeded() -> DirectorConfig {
    DirectorConfig {
        seed: Some(1234),
        ..DirectorConfig::default()
    }
}

fn serials(director: &Director) -> BTreeMap<InterpreterKey, u64> {
    director
        .interpreters()
        .iter()
        .map(|(key, active)| (key.clone(), active.serial()))
        .collect()
}

fn changed(before: &BTreeMap<InterpreterKey, u64>, after: &BTreeMap<InterpreterKey, u64>) -> usize {
    before.iter().filter(|(key, serial)| after.get(*key) != Some(*serial)).count()
}

#[test]
fn test_shift_changes_one_group_and_one_color() {
    let mut director =
        Director::new(seeded(), PolicyRegistry::standard(), ShowState::at_venue(Venue::Dmack)).unwrap();
    director.step(&Frame::at(0.0)).unwrap();

    let before = serials(&director);
    let scheme_before = director.target_scheme().to_list();
    director.shift().unwrap();
    let after = serials(&director);
    let scheme_after = director.target_scheme().to_list();

    assert_eq!(before.len(), after.len());
    assert_eq!(changed(&before, &after), 1);
    let recolored = scheme_before
        .iter()
        .zip(scheme_after.iter())
        .filter(|(a, b)| a != b)
        .count();
    assert_eq!(recolored, 1);
}

#[test]
fn test_timed_shift_waits_for_quiet_low_end() {
    let mut director =
        Director::new(seeded(), PolicyRegistry::standard(), ShowState::at_venue(Venue::Dmack)).unwrap();
    director.step(&Frame::at(0.0)).unwrap();
    let start = serials(&director);

    // Past the interval but mid-swell
    director
        .step(&Frame::at(61.0).with(FrameSignal::SustainedLow, 0.5))
        .unwrap();
    assert_eq!(changed(&start, &serials(&director)), 0);

    director
        .step(&Frame::at(62.0).with(FrameSignal::SustainedLow, 0.0))
        .unwrap();
    assert_eq!(changed(&start, &serials(&director)), 1);
}

fn dimmer_scene() -> Vec<SceneRule> {
    vec![SceneRule {
        class: FixtureClass::Dimmer,
        interpreters: vec![single(InterpreterKind::Dimmer255)],
        tags: Vec::new(),
        addresses: None,
    }]
}

fn render_scenes(weights: [(&str, f32); 2]) -> DmxBuffer {
    let mut registry = PolicyRegistry::new();
    for (name, _) in weights {
        registry.set_scene(name, dimmer_scene());
    }
    let mut director =
        Director::new(seeded(), registry, ShowState::at_venue(Venue::CruxTest)).unwrap();
    for (name, weight) in weights {
        director.set_scene_weight(name, weight).unwrap();
    }
    director.step(&Frame::at(0.0)).unwrap();

    let mut sink = DmxBuffer::new();
    director.render(&mut sink).unwrap();
    sink
}

#[test]
fn test_scene_arbitration_is_order_independent() {
    let first = render_scenes([("a", 0.5), ("b", 0.4)]);
    let second = render_scenes([("a", 0.4), ("b", 0.5)]);
    assert_eq!(first.get(5, Universe::Default), 127);
    assert_eq!(second.get(5, Universe::Default), 127);
}

#[test]
fn test_zero_weight_scene_is_silent() {
    let sink = render_scenes([("a", 0.0), ("b", 0.0)]);
    assert_eq!(sink.get(5, Universe::Default), 0);
}

#[test]
fn test_scene_color_stays_weighted_across_frames() {
    let state = ShowState {
        mode: Mode::Blackout,
        ..ShowState::at_venue(Venue::CruxTest)
    };
    let mut director = Director::new(seeded(), PolicyRegistry::standard(), state).unwrap();
    director.set_scene_weight("purple_pars", 0.1).unwrap();

    // First LED par sits at 20: dimmer, red, green, blue, strobe
    let mut frames = Vec::new();
    for i in 0..3 {
        director.step(&Frame::at(i as f64 / 40.0)).unwrap();
        let mut sink = DmxBuffer::new();
        director.render(&mut sink).unwrap();
        frames.push((20..25).map(|ch| sink.get(ch, Universe::Default)).collect::<Vec<_>>());
    }

    assert_eq!(frames[0][0], 25);
    assert!(frames[0][1] > 0 && frames[0][1] <= 13);
    assert!(frames[0][3] > 0 && frames[0][3] <= 13);
    assert_eq!(frames[1], frames[0]);
    assert_eq!(frames[2], frames[0]);
}

/// Strobe byte of the first LED par on the bench rig after one frame that
/// explicitly carries `strobe = 0`.
fn bench_strobe(seed: u64, latch: Option<f32>) -> u8 {
    let mut registry = PolicyRegistry::new();
    registry.set_mode(
        Mode::Rave,
        vec![PolicyEntry::new(
            FixtureClass::Par,
            vec![signal_switch(single(InterpreterKind::Dimmer30))],
        )],
    );
    let config = DirectorConfig {
        seed: Some(seed),
        ..DirectorConfig::default()
    };
    let mut director = Director::new(config, registry, ShowState::at_venue(Venue::CruxTest)).unwrap();
    if let Some(value) = latch {
        director.set_signal(FrameSignal::Strobe, value);
    }
    director
        .step(&Frame::at(0.0).with(FrameSignal::Strobe, 0.0))
        .unwrap();
    let mut sink = DmxBuffer::new();
    director.render(&mut sink).unwrap();
    sink.get(24, Universe::Default)
}

#[test]
fn test_latched_strobe_reaches_subscribed_fixtures() {
    let mut strobing = 0;
    for seed in 0..32 {
        assert_eq!(bench_strobe(seed, None), 0);
        match bench_strobe(seed, Some(1.0)) {
            0 => {}
            220 => strobing += 1,
            other => panic!("unexpected strobe byte {}", other),
        }
    }
    // Each switch subscribes to strobe with probability 0.4
    assert!(strobing > 0);
    assert!(strobing < 32);
}

#[test]
fn test_released_latch_leaves_frame_alone() {
    for seed in 0..8 {
        assert_eq!(bench_strobe(seed, Some(0.0)), 0);
    }
}

#[test]
fn test_venue_change_rebuilds_groups() {
    let mut director =
        Director::new(seeded(), PolicyRegistry::standard(), ShowState::at_venue(Venue::Dmack)).unwrap();
    director.set_venue(Venue::TruckeeTheatre).unwrap();
    assert_eq!(director.state().venue, Venue::TruckeeTheatre);
    assert_eq!(director.groups().len(), 3);
    assert_eq!(director.interpreters().len(), 3);
}
