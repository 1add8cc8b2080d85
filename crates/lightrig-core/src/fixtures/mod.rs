//! Fixture model
//!
//! Fixtures are DMX devices occupying a contiguous channel range. They are
//! stored in a [`Rig`] arena and addressed by [`FixtureId`]; groups, manual
//! groups and bulbs are nodes in the same arena.
//!
//! ## Accumulation
//!
//! Between two calls to [`Rig::begin`], `set_dimmer` and `set_strobe` keep
//! the loudest value written, while `set_color`, `set_pan`, `set_tilt` and
//! `set_speed` keep the last one.
//!
//! ```rust
//! use lightrig_core::fixtures::{FixtureDef, Rig};
//!
//! # fn main() -> lightrig_core::Result<()> {
//! let mut rig = Rig::new();
//! let par = rig.add(FixtureDef::led_par(12))?;
//!
//! rig.begin(par);
//! rig.set_strobe(par, 50.0);
//! rig.set_strobe(par, 200.0);
//! rig.set_strobe(par, 100.0);
//! assert_eq!(rig.get_strobe(par), 200.0);
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod library;
pub mod model;
pub mod rig;
pub mod wheel;

pub use base::{FixtureBase, FixtureTag};
pub use library::FixtureDef;
pub use model::{FixtureModel, MoverProfile};
pub use rig::{Fixture, FixtureId, Rig};
pub use wheel::{ColorWheelEntry, GoboWheelEntry};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Concrete fixture type, resolved once when a fixture is patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FixtureKind {
    /// Raw channels with no translation
    Generic,
    /// Single-channel house dimmer
    HouseDimmer,
    /// 7-channel RGB par
    LedPar,
    /// Chauvet SlimPAR RGBAW+UV
    ParRgbawu,
    /// Chauvet Intimidator Spot 160
    ChauvetSpot160,
    /// Chauvet Intimidator Spot 120
    ChauvetSpot120,
    /// 38-channel pan strip with 8 RGBW bulbs
    Motionstrip38,
    /// Uking five beam laser
    FiveBeamLaser,
    /// Oultia two beam laser
    TwoBeamLaser,
    /// Chauvet Rotosphere (28ch)
    Rotosphere,
    /// Chauvet Derby
    Derby,
    /// Sub-fixture inside a fixture with bulbs
    Bulb,
    /// Explicit fixture group
    Group,
    /// Manually dimmed group
    ManualGroup,
}

impl FixtureKind {
    /// Short human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            FixtureKind::Generic => "Generic",
            FixtureKind::HouseDimmer => "HouseDimmer",
            FixtureKind::LedPar => "LedPar",
            FixtureKind::ParRgbawu => "ParRGBAWU",
            FixtureKind::ChauvetSpot160 => "ChauvetSpot160",
            FixtureKind::ChauvetSpot120 => "ChauvetSpot120",
            FixtureKind::Motionstrip38 => "Motionstrip38",
            FixtureKind::FiveBeamLaser => "FiveBeamLaser",
            FixtureKind::TwoBeamLaser => "TwoBeamLaser",
            FixtureKind::Rotosphere => "Rotosphere",
            FixtureKind::Derby => "Derby",
            FixtureKind::Bulb => "Bulb",
            FixtureKind::Group => "Group",
            FixtureKind::ManualGroup => "ManualGroup",
        }
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Capability classes used by policy tables to match fixture groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixtureClass {
    /// Matches every fixture
    Any,
    /// Color-mixing pars
    Par,
    /// Pan/tilt heads with color and gobo wheels
    MovingHead,
    /// Pan strips with bulbs
    Motionstrip,
    /// Lasers
    Laser,
    /// Rotospheres
    Rotosphere,
    /// Derby effects
    Derby,
    /// Plain dimmers
    Dimmer,
}

impl FixtureClass {
    /// Whether a fixture of `kind` belongs to this class.
    pub fn matches(&self, kind: FixtureKind) -> bool {
        match self {
            FixtureClass::Any => true,
            FixtureClass::Par => matches!(kind, FixtureKind::LedPar | FixtureKind::ParRgbawu),
            FixtureClass::MovingHead => matches!(
                kind,
                FixtureKind::ChauvetSpot160 | FixtureKind::ChauvetSpot120
            ),
            FixtureClass::Motionstrip => kind == FixtureKind::Motionstrip38,
            FixtureClass::Laser => matches!(
                kind,
                FixtureKind::FiveBeamLaser | FixtureKind::TwoBeamLaser
            ),
            FixtureClass::Rotosphere => kind == FixtureKind::Rotosphere,
            FixtureClass::Derby => kind == FixtureKind::Derby,
            FixtureClass::Dimmer => kind == FixtureKind::HouseDimmer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_matching() {
        assert!(FixtureClass::Par.matches(FixtureKind::LedPar));
        assert!(FixtureClass::Par.matches(FixtureKind::ParRgbawu));
        assert!(!FixtureClass::Par.matches(FixtureKind::Motionstrip38));
        assert!(FixtureClass::MovingHead.matches(FixtureKind::ChauvetSpot120));
        assert!(FixtureClass::Laser.matches(FixtureKind::TwoBeamLaser));
        assert!(FixtureClass::Any.matches(FixtureKind::Bulb));
    }
}
