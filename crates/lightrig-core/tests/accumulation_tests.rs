use lightrig_core::{DmxBuffer, DmxController, FixtureDef, Frame, FrameSignal, Rig, Universe};
use proptest::prelude::*;

#[test]
fn test_strobe_keeps_maximum() {
    let mut rig = Rig::new();
    let par = rig.add(FixtureDef::led_par(1)).unwrap();

    rig.begin(par);
    for value in [50.0, 30.0, 200.0, 100.0] {
        rig.set_strobe(par, value);
    }
    assert_eq!(rig.get_strobe(par), 200.0);

    rig.begin(par);
    assert_eq!(rig.get_strobe(par), 0.0);
}

#[test]
fn test_force_overrides_accumulated() {
    let mut rig = Rig::new();
    let par = rig.add(FixtureDef::led_par(1)).unwrap();

    rig.begin(par);
    rig.set_dimmer(par, 255.0);
    rig.force_dimmer(par, 0.0);
    assert_eq!(rig.get_dimmer(par), 0.0);
}

#[test]
fn test_group_fans_out() {
    let mut rig = Rig::new();
    let group = rig
        .add_group("pair", vec![FixtureDef::led_par(1), FixtureDef::led_par(8)])
        .unwrap();

    rig.begin(group);
    rig.set_dimmer(group, 0.5);
    for child in rig.get(group).children().to_vec() {
        assert_eq!(rig.get_dimmer(child), 0.5);
    }
}

#[test]
fn test_arbitration_is_order_independent() {
    let mut forward = DmxBuffer::new();
    forward.set_max(1, 100, Universe::Default);
    forward.set_max(1, 127, Universe::Default);

    let mut backward = DmxBuffer::new();
    backward.set_max(1, 127, Universe::Default);
    backward.set_max(1, 100, Universe::Default);

    assert_eq!(forward.get(1, Universe::Default), 127);
    assert_eq!(backward.get(1, Universe::Default), 127);
}

#[test]
fn test_out_of_range_channel_is_ignored() {
    let mut buffer = DmxBuffer::new();
    buffer.set_channel(513, 255, Universe::Default);
    buffer.set_channel(0, 255, Universe::Default);
    assert!(buffer.is_empty());
}

#[test]
fn test_frame_extend_only_fills_gaps() {
    let mut frame = Frame::at(1.0).with(FrameSignal::Hype, 0.2);
    frame.extend([(FrameSignal::Hype, 0.9), (FrameSignal::Strobe, 1.0)]);
    assert_eq!(frame[FrameSignal::Hype], 0.2);
    assert_eq!(frame[FrameSignal::Strobe], 1.0);
}

proptest! {
    #[test]
    fn prop_strobe_is_maximum_of_writes(values in prop::collection::vec(0.0f32..=255.0, 1..16)) {
        let mut rig = Rig::new();
        let par = rig.add(FixtureDef::led_par(1)).unwrap();
        rig.begin(par);
        for value in &values {
            rig.set_strobe(par, *value);
        }
        let expected = values.iter().copied().fold(0.0f32, f32::max);
        prop_assert_eq!(rig.get_strobe(par), expected);
    }

    #[test]
    fn prop_set_max_keeps_largest(values in prop::collection::vec(any::<u8>(), 1..16)) {
        let mut buffer = DmxBuffer::new();
        for value in &values {
            buffer.set_max(10, *value, Universe::ART1);
        }
        prop_assert_eq!(buffer.get(10, Universe::ART1), *values.iter().max().unwrap());
    }
}
