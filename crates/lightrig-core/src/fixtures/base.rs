//! Per-fixture record: addressing plus the accumulator fields interpreters
//! write each frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::dmx::{Universe, DMX_CHANNELS};
use crate::{CoreError, Result};

/// Labels used by scenes to filter fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureTag {
    /// Operator-controlled house fixture
    Manual,
    /// Color par
    Par,
    /// Moving head
    MovingHead,
    /// Laser
    Laser,
    /// Effect light (rotosphere, derby)
    Effect,
}

/// Addressing and accumulator state shared by every fixture node.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureBase {
    /// First DMX channel, `1..=512`
    pub address: u16,
    /// Display name
    pub name: String,
    /// Channel count
    pub width: usize,
    /// Translated DMX bytes, one per channel
    pub values: Vec<u8>,
    /// Last color written
    pub color: Color,
    /// Loudest dimmer written since `begin`, `0..=255`
    pub dimmer: f32,
    /// Loudest strobe written since `begin`, `0..=255`
    pub strobe: f32,
    /// Movement or rotation speed
    pub speed: f32,
    /// Pan, `0..=255`
    pub pan: f32,
    /// Tilt, `0..=255`
    pub tilt: f32,
    /// Selected gobo, if the fixture has a gobo wheel
    pub gobo: Option<String>,
    /// Scene filter tags
    pub tags: Vec<FixtureTag>,
    /// Output universe
    pub universe: Universe,
    /// Position in the room, when known
    pub position: Option<Vec3>,
}

impl FixtureBase {
    /// Create a record with zeroed accumulators.
    ///
    /// Fails when `address` is outside `1..=512`.
    pub fn new(address: u16, name: impl Into<String>, width: usize) -> Result<Self> {
        let name = name.into();
        if address == 0 || address as usize > DMX_CHANNELS {
            return Err(CoreError::InvalidAddress { name, address });
        }
        if address as usize + width.saturating_sub(1) > DMX_CHANNELS {
            tracing::warn!(
                "Fixture '{}' at {} spans {} channels past DMX channel {}",
                name,
                address,
                address as usize + width - 1 - DMX_CHANNELS,
                DMX_CHANNELS
            );
        }
        Ok(Self::unchecked(address, name, width))
    }

    /// Bulbs are addressed relative to their parent, starting at 0.
    pub(crate) fn unchecked(address: u16, name: String, width: usize) -> Self {
        Self {
            address,
            name,
            width,
            values: vec![0; width],
            color: Color::black(),
            dimmer: 0.0,
            strobe: 0.0,
            speed: 0.0,
            pan: 0.0,
            tilt: 0.0,
            gobo: None,
            tags: Vec::new(),
            universe: Universe::Default,
            position: None,
        }
    }

    /// Whether the fixture carries every tag in `tags`.
    pub fn has_all_tags(&self, tags: &[FixtureTag]) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }

    /// Last DMX channel this fixture occupies.
    pub fn last_channel(&self) -> usize {
        self.address as usize + self.width.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        assert!(FixtureBase::new(0, "bad", 4).is_err());
        assert!(FixtureBase::new(513, "bad", 1).is_err());
        let base = FixtureBase::new(510, "tail", 7).unwrap();
        assert_eq!(base.last_channel(), 516);
        assert_eq!(base.values.len(), 7);
    }

    #[test]
    fn test_tags() {
        let mut base = FixtureBase::new(1, "house", 1).unwrap();
        base.tags = vec![FixtureTag::Manual, FixtureTag::Par];
        assert!(base.has_all_tags(&[FixtureTag::Manual]));
        assert!(base.has_all_tags(&[]));
        assert!(!base.has_all_tags(&[FixtureTag::Laser]));
    }
}
