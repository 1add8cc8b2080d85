//! LightRig Core - Fixture Model, Interpreters and Director
//!
//! This crate contains the lighting domain model for LightRig, including:
//! - Frame signals and color schemes
//! - Fixture addressing and per-frame accumulation
//! - Interpreter combinators (combo, randomize, signal/hype switches)
//! - Mode/Phrase/Scene policy tables
//! - The director that steps, shifts and renders interpreters to DMX

#![warn(missing_docs)]

pub use glam::Vec3;
use thiserror::Error;

// Value types
pub mod color;
pub mod color_scheme;
pub mod frame;
pub mod lerp;
pub mod themes;

// Fixtures and output
pub mod dmx;
pub mod fixtures;
pub mod venues;

// Behaviour
pub mod director;
pub mod interpreters;

// Settings
pub mod config;
pub mod logging;

// --- Re-exports grouped by category ---

// Values
pub use color::Color;
pub use color_scheme::ColorScheme;
pub use frame::{Frame, FrameSignal, SignalStates};
pub use lerp::{clamp, lerp, Lerp, LerpAnimator};
pub use themes::{Theme, ThemeName};

// Fixtures & DMX
pub use dmx::{dmx_clamp, DmxBuffer, DmxController, Universe, DMX_CHANNELS};
pub use fixtures::{FixtureClass, FixtureDef, FixtureId, FixtureKind, FixtureTag, Rig};
pub use venues::{ArtNetTarget, Venue};

// Interpreters
pub use interpreters::{Interpreter, InterpreterArgs, InterpreterKind, InterpreterSpec};

// Director
pub use director::{
    Director, DirectorConfig, InterpreterKey, InterpreterSource, Mode, ModeMachine, Phrase,
    PolicyRegistry, ShowState,
};

// Settings
pub use config::RigSettings;
pub use logging::LogConfig;

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// A fixture group was built without members
    #[error("Fixture group '{0}' must contain at least one fixture")]
    EmptyGroup(String),

    /// Fixture address outside 1..=512
    #[error("Invalid DMX address {address} for fixture '{name}'")]
    InvalidAddress {
        /// Fixture name
        name: String,
        /// Requested address
        address: u16,
    },

    /// Gobo name not on any wheel in the group
    #[error("Unknown gobo: {0}")]
    UnknownGobo(String),

    /// Scene name not in the registry
    #[error("Unknown scene: {0}")]
    UnknownScene(String),

    /// Theme name not recognised
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    /// Venue name not recognised
    #[error("Unknown venue: {0}")]
    UnknownVenue(String),

    /// Mode name not recognised
    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    /// Phrase name not recognised
    #[error("Unknown phrase: {0}")]
    UnknownPhrase(String),

    /// Color keyword not recognised
    #[error("Unknown color: {0}")]
    UnknownColor(String),

    /// Transport write or flush failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error("Settings serialize error: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
