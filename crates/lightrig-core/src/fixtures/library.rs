//! Static fixture definitions: channel counts, wheels and default tags for
//! every supported device.

use glam::Vec3;

use crate::dmx::Universe;
use crate::fixtures::base::{FixtureBase, FixtureTag};
use crate::fixtures::model::{FixtureModel, MoverLayout, MoverProfile};
use crate::fixtures::wheel::{ColorWheelEntry, GoboWheelEntry};
use crate::fixtures::FixtureKind;
use crate::Result;

/// A bulb inside a parent fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct BulbSlot {
    /// First channel of the bulb, relative to the parent (0-based)
    pub offset: usize,
    /// Bulb translation
    pub model: FixtureModel,
    /// Channels the bulb occupies
    pub width: usize,
}

/// Validated pieces of a [`FixtureDef`], ready to be placed in a rig.
pub(crate) struct FixtureParts {
    pub kind: FixtureKind,
    pub model: FixtureModel,
    pub base: FixtureBase,
    pub bulbs: Vec<BulbSlot>,
}

/// Everything needed to patch one fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureDef {
    kind: FixtureKind,
    model: FixtureModel,
    address: u16,
    name: String,
    width: usize,
    tags: Vec<FixtureTag>,
    universe: Universe,
    position: Option<Vec3>,
    bulbs: Vec<BulbSlot>,
    pan: f32,
    tilt: f32,
}

impl FixtureDef {
    fn new(kind: FixtureKind, model: FixtureModel, address: u16, name: &str, width: usize) -> Self {
        Self {
            kind,
            model,
            address,
            name: name.to_string(),
            width,
            tags: Vec::new(),
            universe: Universe::Default,
            position: None,
            bulbs: Vec::new(),
            pan: 0.0,
            tilt: 0.0,
        }
    }

    /// Untranslated fixture with `width` raw channels.
    pub fn generic(address: u16, name: &str, width: usize) -> Self {
        Self::new(FixtureKind::Generic, FixtureModel::Generic, address, name, width)
    }

    /// Single-channel house dimmer.
    pub fn house_dimmer(address: u16) -> Self {
        Self::new(
            FixtureKind::HouseDimmer,
            FixtureModel::HouseDimmer,
            address,
            "house dimmer",
            1,
        )
        .with_tags(&[FixtureTag::Manual])
    }

    /// 7-channel RGB par.
    pub fn led_par(address: u16) -> Self {
        Self::new(FixtureKind::LedPar, FixtureModel::LedPar, address, "led par", 7)
            .with_tags(&[FixtureTag::Par])
    }

    /// Chauvet SlimPAR RGBAW+UV in 7-channel mode.
    pub fn par_rgbawu(address: u16) -> Self {
        Self::new(
            FixtureKind::ParRgbawu,
            FixtureModel::ParRgbawu,
            address,
            "chauvet par rgbawu",
            7,
        )
        .with_tags(&[FixtureTag::Par])
    }

    /// Chauvet Intimidator Spot 160, 11-channel mode.
    pub fn chauvet_spot_160(address: u16) -> Self {
        let profile = MoverProfile {
            layout: MoverLayout {
                pan_coarse: 0,
                pan_fine: Some(1),
                tilt_coarse: 2,
                tilt_fine: Some(3),
                speed: 4,
                color_wheel: 5,
                gobo_wheel: 6,
                dimmer: 7,
                shutter: 8,
            },
            color_wheel: vec![
                ColorWheelEntry::named("white", 0),
                ColorWheelEntry::named("red", 12),
                ColorWheelEntry::named("orange", 16),
                ColorWheelEntry::named("yellow", 22),
                ColorWheelEntry::named("green", 30),
                ColorWheelEntry::named("blue", 37),
                ColorWheelEntry::named("antiquewhite", 46),
                ColorWheelEntry::named("cyan", 52),
                ColorWheelEntry::named("magenta", 58),
                ColorWheelEntry::named("lime", 64),
            ],
            gobo_wheel: vec![
                GoboWheelEntry::new("open", 0),
                GoboWheelEntry::new("starburst", 10),
                GoboWheelEntry::new("dots", 20),
            ],
            pan_range: (0.0, 0.0),
            tilt_range: (0.0, 0.0),
            dimmer_upper: 255.0,
            shutter_open: 6,
            strobe_shutter: (4.0, 76.0),
        }
        .with_angles((360.0, 540.0), (0.0, 90.0));

        Self::new(
            FixtureKind::ChauvetSpot160,
            FixtureModel::Mover(Box::new(profile)),
            address,
            "chauvet intimidator 160",
            11,
        )
        .with_tags(&[FixtureTag::MovingHead])
    }

    /// Chauvet Intimidator Spot 120, 12-channel mode.
    pub fn chauvet_spot_120(address: u16) -> Self {
        let profile = MoverProfile {
            layout: MoverLayout {
                pan_coarse: 0,
                pan_fine: Some(1),
                tilt_coarse: 2,
                tilt_fine: Some(3),
                speed: 4,
                color_wheel: 5,
                shutter: 6,
                dimmer: 7,
                gobo_wheel: 8,
            },
            color_wheel: vec![
                ColorWheelEntry::named("white", 0),
                ColorWheelEntry::named("red", 40),
                ColorWheelEntry::named("green", 70),
                ColorWheelEntry::named("blue", 100),
                ColorWheelEntry::named("yellow", 140),
                ColorWheelEntry::named("magenta", 170),
                ColorWheelEntry::named("antiquewhite", 200),
                ColorWheelEntry::named("cyan", 230),
            ],
            gobo_wheel: vec![
                GoboWheelEntry::new("open", 0),
                GoboWheelEntry::new("wood", 40),
                GoboWheelEntry::new("spiral", 80),
                GoboWheelEntry::new("dots", 110),
                GoboWheelEntry::new("squares", 150),
                GoboWheelEntry::new("three", 180),
                GoboWheelEntry::new("circles", 200),
                GoboWheelEntry::new("starburst", 230),
                GoboWheelEntry::new("ring", 255),
            ],
            pan_range: (0.0, 0.0),
            tilt_range: (0.0, 0.0),
            dimmer_upper: 255.0,
            shutter_open: 6,
            strobe_shutter: (4.0, 76.0),
        }
        .with_angles((270.0, 450.0), (0.0, 90.0));

        Self::new(
            FixtureKind::ChauvetSpot120,
            FixtureModel::Mover(Box::new(profile)),
            address,
            "chauvet intimidator 120",
            12,
        )
        .with_tags(&[FixtureTag::MovingHead])
    }

    /// 38-channel pan strip with 8 RGBW bulbs starting at channel offset 6.
    pub fn motionstrip38(address: u16, pan_lower: f32, pan_upper: f32) -> Self {
        let mut def = Self::new(
            FixtureKind::Motionstrip38,
            FixtureModel::Motionstrip {
                pan_lower,
                pan_upper,
            },
            address,
            "motionstrip 38",
            38,
        );
        def.bulbs = (0..8)
            .map(|i| BulbSlot {
                offset: 6 + i * 4,
                model: FixtureModel::RgbwBulb,
                width: 4,
            })
            .collect();
        def
    }

    /// Uking 5 beam laser, 13-channel mode.
    pub fn five_beam_laser(address: u16) -> Self {
        let mut def = Self::new(
            FixtureKind::FiveBeamLaser,
            FixtureModel::FiveBeamLaser,
            address,
            "uking 5 beam laser",
            13,
        )
        .with_tags(&[FixtureTag::Laser]);
        // Pan/tilt above 200 engages the built-in auto move
        def.pan = 210.0;
        def.tilt = 210.0;
        def
    }

    /// Oultia 2 beam laser, 10-channel mode.
    pub fn two_beam_laser(address: u16) -> Self {
        Self::new(
            FixtureKind::TwoBeamLaser,
            FixtureModel::TwoBeamLaser,
            address,
            "oultia 2 beam laser",
            10,
        )
        .with_tags(&[FixtureTag::Laser])
    }

    /// Chauvet Rotosphere in 28-channel mode: three 8-channel bulbs.
    pub fn rotosphere(address: u16) -> Self {
        let mut def = Self::new(
            FixtureKind::Rotosphere,
            FixtureModel::Rotosphere,
            address,
            "chauvet rotosphere",
            28,
        )
        .with_tags(&[FixtureTag::Effect]);
        def.bulbs = (0..3)
            .map(|i| BulbSlot {
                offset: i * 8,
                model: FixtureModel::RotosphereBulb,
                width: 8,
            })
            .collect();
        def
    }

    /// Chauvet Derby, 6-channel mode.
    pub fn derby(address: u16) -> Self {
        Self::new(FixtureKind::Derby, FixtureModel::Derby, address, "chauvet derby", 6)
            .with_tags(&[FixtureTag::Effect])
    }

    /// Add scene tags.
    pub fn with_tags(mut self, tags: &[FixtureTag]) -> Self {
        for tag in tags {
            if !self.tags.contains(tag) {
                self.tags.push(*tag);
            }
        }
        self
    }

    /// Patch onto `universe`.
    pub fn on_universe(mut self, universe: Universe) -> Self {
        self.universe = universe;
        self
    }

    /// Override the display name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Place the fixture in the room.
    pub fn at_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    /// Concrete type.
    pub fn kind(&self) -> FixtureKind {
        self.kind
    }

    /// First channel.
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Channel count.
    pub fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn into_parts(self) -> Result<FixtureParts> {
        let mut base = FixtureBase::new(self.address, self.name, self.width)?;
        base.tags = self.tags;
        base.universe = self.universe;
        base.position = self.position;
        base.pan = self.pan;
        base.tilt = self.tilt;
        Ok(FixtureParts {
            kind: self.kind,
            model: self.model,
            base,
            bulbs: self.bulbs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Rig;

    #[test]
    fn test_widths() {
        assert_eq!(FixtureDef::led_par(1).width(), 7);
        assert_eq!(FixtureDef::motionstrip38(1, 0.0, 256.0).width(), 38);
        assert_eq!(FixtureDef::rotosphere(1).width(), 28);
        assert_eq!(FixtureDef::five_beam_laser(1).width(), 13);
        assert_eq!(FixtureDef::chauvet_spot_120(1).width(), 12);
    }

    #[test]
    fn test_invalid_address_fails_on_patch() {
        let mut rig = Rig::new();
        assert!(rig.add(FixtureDef::led_par(0)).is_err());
    }

    #[test]
    fn test_initial_state_is_translated() {
        let mut rig = Rig::new();
        let laser = rig.add(FixtureDef::five_beam_laser(1)).unwrap();
        assert_eq!(rig.get(laser).base.values[7], 210);

        let spot = rig.add(FixtureDef::chauvet_spot_160(20)).unwrap();
        // Shutter open
        assert_eq!(rig.get(spot).base.values[8], 6);
    }

    #[test]
    fn test_builders() {
        let def = FixtureDef::led_par(12)
            .on_universe(Universe::ART1)
            .with_tags(&[FixtureTag::Manual, FixtureTag::Par])
            .named("stage left");
        let mut rig = Rig::new();
        let id = rig.add(def).unwrap();
        let base = &rig.get(id).base;
        assert_eq!(base.universe, Universe::ART1);
        assert_eq!(base.tags, vec![FixtureTag::Par, FixtureTag::Manual]);
        assert_eq!(base.name, "stage left");
    }
}
