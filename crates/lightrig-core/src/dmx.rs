//! DMX512 addressing, value clamping and the transport contract.
//!
//! Channels are 1-indexed at the API (`1..=512`) and 0-indexed on the wire.
//! Every transport implements [`DmxController`]; the director writes through
//! it once per frame and then calls [`DmxController::submit`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::Result;

/// Channels in one DMX universe.
pub const DMX_CHANNELS: usize = 512;

/// Clamp an arbitrary float into a DMX byte. NaN maps to 0, fractions
/// truncate.
pub fn dmx_clamp(value: f32) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.clamp(0.0, 255.0) as u8
    }
}

/// Clamp a whole slice of floats into DMX bytes.
pub fn dmx_clamp_list(values: &[f32]) -> Vec<u8> {
    values.iter().map(|v| dmx_clamp(*v)).collect()
}

/// Which physical or network output a fixture is patched into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Universe {
    /// Local serial interface
    #[default]
    Default,
    /// Named Art-Net universe (`art1`, `art2`, ...)
    ArtNet(u8),
}

impl Universe {
    /// First Art-Net universe.
    pub const ART1: Universe = Universe::ArtNet(1);

    /// Config key for this universe, e.g. `default` or `art1`.
    pub fn key(&self) -> String {
        match self {
            Universe::Default => "default".to_string(),
            Universe::ArtNet(n) => format!("art{}", n),
        }
    }

    /// Parse a config key produced by [`Universe::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        if key == "default" {
            return Some(Universe::Default);
        }
        key.strip_prefix("art")
            .and_then(|n| n.parse().ok())
            .map(Universe::ArtNet)
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A sink for DMX channel writes.
pub trait DmxController {
    /// Stage `value` for `channel` (`1..=512`) on `universe`.
    ///
    /// Implementations ignore channels outside `1..=512`.
    fn set_channel(&mut self, channel: u16, value: u8, universe: Universe);

    /// Flush every staged channel to the output.
    fn submit(&mut self) -> Result<()>;
}

impl<T: DmxController + ?Sized> DmxController for Box<T> {
    fn set_channel(&mut self, channel: u16, value: u8, universe: Universe) {
        (**self).set_channel(channel, value, universe)
    }

    fn submit(&mut self) -> Result<()> {
        (**self).submit()
    }
}

/// In-memory per-universe channel buffers.
///
/// Used by the director as the transient arbitration buffer and to capture
/// what an interpreter's fixtures would write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DmxBuffer {
    universes: BTreeMap<Universe, [u8; DMX_CHANNELS]>,
    touched: BTreeMap<Universe, [bool; DMX_CHANNELS]>,
}

impl DmxBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value last written to `channel`, 0 when never written.
    pub fn get(&self, channel: u16, universe: Universe) -> u8 {
        match index(channel) {
            Some(i) => self.universes.get(&universe).map_or(0, |data| data[i]),
            None => 0,
        }
    }

    /// Write `value` unless it is below what the channel already holds.
    pub fn set_max(&mut self, channel: u16, value: u8, universe: Universe) {
        if let Some(i) = index(channel) {
            let current = self.get(channel, universe);
            let touched = self.touched.get(&universe).is_some_and(|t| t[i]);
            if !touched || value > current {
                self.set_channel(channel, value, universe);
            }
        }
    }

    /// Every written channel as `(universe, channel, value)`.
    pub fn written(&self) -> impl Iterator<Item = (Universe, u16, u8)> + '_ {
        self.touched.iter().flat_map(move |(universe, touched)| {
            let data = self.universes.get(universe);
            touched
                .iter()
                .enumerate()
                .filter(|(_, t)| **t)
                .map(move |(i, _)| (*universe, (i + 1) as u16, data.map_or(0, |d| d[i])))
        })
    }

    /// Full 512-byte frame for `universe`, if anything was written there.
    pub fn universe(&self, universe: Universe) -> Option<&[u8; DMX_CHANNELS]> {
        self.universes.get(&universe)
    }

    /// Forget every write.
    pub fn clear(&mut self) {
        self.universes.clear();
        self.touched.clear();
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }
}

impl DmxController for DmxBuffer {
    fn set_channel(&mut self, channel: u16, value: u8, universe: Universe) {
        if let Some(i) = index(channel) {
            self.universes.entry(universe).or_insert([0; DMX_CHANNELS])[i] = value;
            self.touched.entry(universe).or_insert([false; DMX_CHANNELS])[i] = true;
        }
    }

    fn submit(&mut self) -> Result<()> {
        Ok(())
    }
}

fn index(channel: u16) -> Option<usize> {
    if (1..=DMX_CHANNELS as u16).contains(&channel) {
        Some(channel as usize - 1)
    } else {
        None
    }
}
