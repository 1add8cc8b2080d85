//! Builds the transport for a venue.
//!
//! Opening hardware never fails the caller: anything that cannot be opened is
//! replaced by a [`MockController`] and a warning is logged.

use lightrig_core::{ArtNetTarget, Universe};
use tracing::{info, warn};

use super::{ArtNetController, EnttecProController, MockController, SwitchController, TransportKind};

/// Environment variable forcing mock output.
pub const MOCK_DMX_ENV: &str = "MOCK_DMX";

/// What to open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportConfig {
    /// Serial device for the local universe
    pub serial_port: Option<String>,
    /// Open nothing real
    pub mock: bool,
    /// Art-Net universes to open
    pub artnet: Vec<ArtNetTarget>,
}

/// Whether `MOCK_DMX` asks for mock output. Any value except empty, `0` and
/// `false` counts.
pub fn mock_forced(env: &dyn Fn(&str) -> Option<String>) -> bool {
    env(MOCK_DMX_ENV).is_some_and(|v| !matches!(v.trim(), "" | "0" | "false"))
}

/// [`build_transport_with`] reading the process environment.
pub fn build_transport(config: &TransportConfig) -> SwitchController {
    build_transport_with(config, &|key| std::env::var(key).ok())
}

/// Assemble a switch with the local universe and every Art-Net target.
///
/// `env` supplies `MOCK_DMX` and the `ARTNET_<UNIVERSE>_IP` overrides.
pub fn build_transport_with(
    config: &TransportConfig,
    env: &dyn Fn(&str) -> Option<String>,
) -> SwitchController {
    let mock = config.mock || mock_forced(env);
    let mut switch = SwitchController::new();

    match (&config.serial_port, mock) {
        (Some(path), false) => match EnttecProController::open(path) {
            Ok(controller) => switch.add(Universe::Default, TransportKind::Enttec, Box::new(controller)),
            Err(e) => {
                warn!("Could not open DMX device {}: {}. Falling back to mock output", path, e);
                switch.add(Universe::Default, TransportKind::Mock, Box::new(MockController::new()));
            }
        },
        _ => switch.add(Universe::Default, TransportKind::Mock, Box::new(MockController::new())),
    }

    for target in &config.artnet {
        if mock {
            switch.add(target.universe, TransportKind::Mock, Box::new(MockController::new()));
            continue;
        }
        let ip = env(&target.env_key()).unwrap_or_else(|| target.ip.clone());
        match ArtNetController::new(&ip, target.artnet_universe) {
            Ok(controller) => switch.add(target.universe, TransportKind::ArtNet, Box::new(controller)),
            Err(e) => {
                warn!(
                    "Could not open Art-Net {} at {}: {}. Falling back to mock output",
                    target.universe, ip, e
                );
                switch.add(target.universe, TransportKind::Mock, Box::new(MockController::new()));
            }
        }
    }

    for (universe, kind) in switch.routes() {
        info!("Universe {} -> {}", universe, kind);
    }
    switch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_mock_flag_values() {
        assert!(!mock_forced(&no_env));
        assert!(mock_forced(&|_| Some("1".to_string())));
        assert!(!mock_forced(&|_| Some("0".to_string())));
        assert!(!mock_forced(&|_| Some("false".to_string())));
    }

    #[test]
    fn test_missing_device_falls_back() {
        let config = TransportConfig {
            serial_port: Some("/nonexistent/ttyUSB9".to_string()),
            ..TransportConfig::default()
        };
        let switch = build_transport_with(&config, &no_env);
        assert_eq!(switch.kind(Universe::Default), Some(TransportKind::Mock));
    }

    #[test]
    fn test_env_overrides_artnet_ip() {
        let config = TransportConfig {
            artnet: vec![ArtNetTarget {
                universe: Universe::ART1,
                ip: "not-an-ip".to_string(),
                artnet_universe: 0,
            }],
            ..TransportConfig::default()
        };
        // The configured IP is invalid, so only the override can open a socket
        let switch = build_transport_with(&config, &|key| {
            (key == "ARTNET_ART1_IP").then(|| "127.0.0.1".to_string())
        });
        assert_eq!(switch.kind(Universe::ART1), Some(TransportKind::ArtNet));

        let switch = build_transport_with(&config, &no_env);
        assert_eq!(switch.kind(Universe::ART1), Some(TransportKind::Mock));
    }

    #[test]
    fn test_mock_env_skips_hardware() {
        let config = TransportConfig {
            artnet: vec![ArtNetTarget {
                universe: Universe::ART1,
                ip: "127.0.0.1".to_string(),
                artnet_universe: 0,
            }],
            ..TransportConfig::default()
        };
        let switch = build_transport_with(&config, &|key| {
            (key == MOCK_DMX_ENV).then(|| "1".to_string())
        });
        assert_eq!(switch.kind(Universe::ART1), Some(TransportKind::Mock));
    }
}
