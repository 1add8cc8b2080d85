//! Show modes and musical phrases: the contexts policy tables are keyed by.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CoreError, Result};

/// Overall energy the operator has asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Everything dark
    Blackout,
    /// Soft pulses and background colors
    Gentle,
    /// Full show
    #[default]
    Rave,
}

impl Mode {
    /// Every mode, in menu order.
    pub const ALL: [Mode; 3] = [Mode::Blackout, Mode::Gentle, Mode::Rave];

    /// Config name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Blackout => "blackout",
            Mode::Gentle => "gentle",
            Mode::Rave => "rave",
        }
    }

    /// Resolve a config name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == name)
            .ok_or_else(|| CoreError::UnknownMode(name.to_string()))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phrase {
    /// Start or end of a track
    IntroOutro,
    /// Rising tension
    Build,
    /// Peak after a build
    Drop,
    /// Quiet section between drops
    Breakdown,
    /// Anything else
    General,
}

impl Phrase {
    /// Every phrase.
    pub const ALL: [Phrase; 5] = [
        Phrase::IntroOutro,
        Phrase::Build,
        Phrase::Drop,
        Phrase::Breakdown,
        Phrase::General,
    ];

    /// Config name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phrase::IntroOutro => "intro_outro",
            Phrase::Build => "build",
            Phrase::Drop => "drop",
            Phrase::Breakdown => "breakdown",
            Phrase::General => "general",
        }
    }

    /// Resolve a config name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| CoreError::UnknownPhrase(name.to_string()))
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
