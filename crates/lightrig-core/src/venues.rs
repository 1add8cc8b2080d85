//! Venue patches: which fixtures sit at which addresses in each room.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dmx::Universe;
use crate::fixtures::{FixtureDef, Rig};
use crate::{CoreError, Result, Vec3};

/// Network destination for one Art-Net universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtNetTarget {
    /// Universe tag fixtures are patched with
    pub universe: Universe,
    /// Node IP address
    pub ip: String,
    /// Art-Net universe number on the node
    pub artnet_universe: u16,
}

impl ArtNetTarget {
    /// Environment variable that overrides [`ArtNetTarget::ip`], e.g.
    /// `ARTNET_ART1_IP`.
    pub fn env_key(&self) -> String {
        format!("ARTNET_{}_IP", self.universe.key().to_uppercase())
    }
}

/// Known rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    /// Home rig
    Dmack,
    /// Mountain Lotus, with an Art-Net node for the pars
    #[default]
    MtnLotus,
    /// Truckee theatre, grouped stage wash plus house lights
    TruckeeTheatre,
    /// Bench setup for testing effect lights
    CruxTest,
}

impl Venue {
    /// Every venue.
    pub const ALL: [Venue; 4] = [
        Venue::Dmack,
        Venue::MtnLotus,
        Venue::TruckeeTheatre,
        Venue::CruxTest,
    ];

    /// Config name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Dmack => "dmack",
            Venue::MtnLotus => "mtn_lotus",
            Venue::TruckeeTheatre => "truckee_theatre",
            Venue::CruxTest => "crux_test",
        }
    }

    /// Resolve a config name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == name)
            .ok_or_else(|| CoreError::UnknownVenue(name.to_string()))
    }

    /// Art-Net nodes this venue sends to.
    pub fn artnet_targets(&self) -> Vec<ArtNetTarget> {
        match self {
            Venue::MtnLotus => vec![ArtNetTarget {
                universe: Universe::ART1,
                ip: "192.168.100.113".to_string(),
                artnet_universe: 0,
            }],
            _ => Vec::new(),
        }
    }

    /// Whether the venue has house lights on a manual group.
    pub fn has_manual_dimmer(&self) -> bool {
        matches!(self, Venue::MtnLotus | Venue::TruckeeTheatre)
    }

    /// Build the fixture patch.
    pub fn patch(&self) -> Result<Rig> {
        let mut rig = Rig::new();
        match self {
            Venue::Dmack => {
                rig.add(FixtureDef::chauvet_spot_160(1))?;
                for address in [12, 19, 26, 33, 40, 47] {
                    rig.add(FixtureDef::led_par(address))?;
                }
                rig.add(FixtureDef::motionstrip38(59, 0.0, 256.0))?;
                rig.add(FixtureDef::five_beam_laser(100))?;
                rig.add(FixtureDef::two_beam_laser(120))?;
                rig.add(FixtureDef::chauvet_spot_120(140))?;
                rig.add(FixtureDef::chauvet_spot_120(152))?;
                rig.add(FixtureDef::motionstrip38(165, 0.0, 256.0))?;
            }
            Venue::MtnLotus => {
                for (i, address) in (10..66).step_by(7).enumerate() {
                    let height = if i % 2 == 0 { 3.0 } else { 0.5 };
                    rig.add(
                        FixtureDef::par_rgbawu(address as u16)
                            .on_universe(Universe::ART1)
                            .at_position(Vec3::new(i as f32, height, 0.0)),
                    )?;
                }
                rig.add(FixtureDef::motionstrip38(70, 0.0, 256.0))?;
                rig.add(FixtureDef::two_beam_laser(110))?;
                rig.add_manual_group(
                    "house lights",
                    vec![
                        FixtureDef::house_dimmer(1).named("house left"),
                        FixtureDef::house_dimmer(2).named("house right"),
                    ],
                )?;
            }
            Venue::TruckeeTheatre => {
                rig.add_group(
                    "stage wash",
                    (0..6)
                        .map(|i| FixtureDef::par_rgbawu(20 + i * 7))
                        .collect(),
                )?;
                rig.add_group(
                    "movers",
                    vec![
                        FixtureDef::chauvet_spot_160(80),
                        FixtureDef::chauvet_spot_160(92),
                    ],
                )?;
                rig.add(FixtureDef::five_beam_laser(110))?;
                rig.add_manual_group(
                    "house",
                    (1..=4).map(FixtureDef::house_dimmer).collect(),
                )?;
            }
            Venue::CruxTest => {
                rig.add(FixtureDef::house_dimmer(5).named("bench lamp"))?;
                rig.add(FixtureDef::house_dimmer(10).named("bench lamp 2"))?;
                rig.add(FixtureDef::led_par(20))?;
                rig.add(FixtureDef::led_par(27))?;
                rig.add(FixtureDef::rotosphere(40))?;
                rig.add(FixtureDef::derby(70))?;
            }
        }
        Ok(rig)
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureKind;

    #[test]
    fn test_every_venue_patches() {
        for venue in Venue::ALL {
            let rig = venue.patch().unwrap();
            assert!(!rig.roots().is_empty(), "{venue} is empty");
        }
    }

    #[test]
    fn test_no_overlapping_channels() {
        for venue in Venue::ALL {
            let rig = venue.patch().unwrap();
            let mut used = std::collections::HashSet::new();
            for (_, fixture) in rig.iter() {
                if fixture.is_group() || fixture.kind() == FixtureKind::Bulb {
                    continue;
                }
                let base = &fixture.base;
                for channel in base.address as usize..base.address as usize + base.width {
                    assert!(
                        used.insert((base.universe, channel)),
                        "{venue}: channel {channel} on {} used twice",
                        base.universe
                    );
                }
            }
        }
    }

    #[test]
    fn test_manual_groups_match_flag() {
        for venue in Venue::ALL {
            let rig = venue.patch().unwrap();
            assert_eq!(!rig.manual_groups().is_empty(), venue.has_manual_dimmer());
        }
    }

    #[test]
    fn test_artnet_config() {
        let targets = Venue::MtnLotus.artnet_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].ip, "192.168.100.113");
        assert_eq!(targets[0].artnet_universe, 0);
        assert_eq!(targets[0].env_key(), "ARTNET_ART1_IP");
        assert!(Venue::Dmack.artnet_targets().is_empty());
    }

    #[test]
    fn test_venue_names() {
        assert_eq!(Venue::from_name("truckee_theatre").unwrap(), Venue::TruckeeTheatre);
        assert!(matches!(Venue::from_name("moon"), Err(CoreError::UnknownVenue(_))));
    }
}
