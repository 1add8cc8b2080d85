use std::net::UdpSocket;
use std::time::Duration;

use lightrig_control::dmx::{
    build_transport_with, encode_artnet_packet, ArtNetController, EnttecProController,
    MockController, SwitchController, TransportConfig, TransportKind, ARTNET_HEADER_LEN,
};
use lightrig_core::{DmxController, Universe, DMX_CHANNELS};
use proptest::prelude::*;

#[test]
fn test_artnet_reaches_local_socket() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let target = receiver.local_addr().unwrap();

    let mut controller = ArtNetController::with_target(target, 5).unwrap();
    controller.set_channel(1, 255, Universe::ART1);
    controller.set_channel(512, 17, Universe::ART1);
    controller.submit().unwrap();

    let mut buf = [0u8; 1024];
    let (len, _) = receiver.recv_from(&mut buf).unwrap();
    assert_eq!(len, ARTNET_HEADER_LEN + DMX_CHANNELS);
    assert_eq!(&buf[0..8], b"Art-Net\0");
    assert_eq!(buf[14], 5);
    assert_eq!(buf[18], 255);
    assert_eq!(buf[529], 17);
}

#[test]
fn test_sequence_advances_per_submit() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let mut controller = ArtNetController::with_target(receiver.local_addr().unwrap(), 0).unwrap();

    let mut buf = [0u8; 1024];
    controller.submit().unwrap();
    receiver.recv_from(&mut buf).unwrap();
    let first = buf[12];
    controller.submit().unwrap();
    receiver.recv_from(&mut buf).unwrap();
    assert_eq!(buf[12], first.wrapping_add(1));
}

#[test]
fn test_enttec_writes_to_device_file() {
    let device = tempfile::NamedTempFile::new().unwrap();
    let path = device.path().to_str().unwrap().to_string();

    let mut controller = EnttecProController::open(&path).unwrap();
    controller.set_channel(1, 42, Universe::Default);
    controller.submit().unwrap();

    let written = std::fs::read(&path).unwrap();
    assert_eq!(written.len(), DMX_CHANNELS + 6);
    assert_eq!(written[0], 0x7E);
    assert_eq!(written[5], 42);
}

#[test]
fn test_construction_without_hardware_never_fails() {
    let config = TransportConfig {
        serial_port: Some("/dev/does-not-exist".to_string()),
        mock: false,
        artnet: lightrig_core::Venue::MtnLotus.artnet_targets(),
    };
    let switch = build_transport_with(&config, &|_| None);
    assert_eq!(switch.kind(Universe::Default), Some(TransportKind::Mock));
    // Binding a UDP socket needs no network, so the node is still addressed
    assert_eq!(switch.kind(Universe::ART1), Some(TransportKind::ArtNet));

    let mut mocked = build_transport_with(
        &TransportConfig {
            mock: true,
            ..config
        },
        &|_| None,
    );
    assert_eq!(mocked.kind(Universe::ART1), Some(TransportKind::Mock));
    mocked.set_channel(1, 1, Universe::Default);
    assert!(mocked.submit().is_ok());
}

#[test]
fn test_mock_submit_never_fails() {
    let mut mock = MockController::new();
    for channel in [0, 1, 512, 513, 600] {
        mock.set_channel(channel, 255, Universe::Default);
    }
    assert!(mock.submit().is_ok());
    assert_eq!(mock.get(512, Universe::Default), 255);
}

#[test]
fn test_switch_routes_by_universe() {
    let mut switch = SwitchController::new();
    switch.add(Universe::Default, TransportKind::Mock, Box::new(MockController::new()));
    switch.add(Universe::ART1, TransportKind::Mock, Box::new(MockController::new()));
    switch.set_channel(3, 30, Universe::Default);
    switch.set_channel(3, 60, Universe::ART1);
    assert!(switch.submit().is_ok());
    assert_eq!(switch.routes().count(), 2);
}

proptest! {
    #[test]
    fn prop_packet_carries_frame(data in prop::collection::vec(any::<u8>(), DMX_CHANNELS), universe in any::<u16>(), seq in any::<u8>()) {
        let mut frame = [0u8; DMX_CHANNELS];
        frame.copy_from_slice(&data);
        let packet = encode_artnet_packet(universe, seq, &frame);
        prop_assert_eq!(&packet[ARTNET_HEADER_LEN..], &frame[..]);
        prop_assert_eq!(u16::from_le_bytes([packet[14], packet[15]]), universe);
        prop_assert_eq!(packet[12], seq);
    }
}
