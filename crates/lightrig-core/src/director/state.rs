//! Operator-facing show state.

use serde::{Deserialize, Serialize};

use crate::director::mode::{Mode, Phrase};
use crate::frame::SignalStates;
use crate::interpreters::MAX_HYPE;
use crate::themes::ThemeName;
use crate::venues::Venue;

/// Hype bracket used while the limiter is engaged.
pub const HYPE_LIMITER_ENVELOPE: (f32, f32) = (30.0, 70.0);

/// What the operator has asked for. The director reads it every frame and
/// reacts to changes through its `set_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowState {
    /// Current mode
    pub mode: Mode,
    /// Phrase whose table overrides the mode's, when set
    #[serde(default)]
    pub phrase: Option<Phrase>,
    /// Global hype, `0..=100`
    pub hype: f32,
    /// Current theme
    pub theme: ThemeName,
    /// Current venue
    pub venue: Venue,
    /// Clamp selection into [`HYPE_LIMITER_ENVELOPE`]
    pub hype_limiter: bool,
    /// House light level for manual groups, `0..=1`
    pub manual_dimmer: f32,
    /// Manually latched signals
    #[serde(skip)]
    pub signal_states: SignalStates,
}

impl Default for ShowState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            phrase: None,
            hype: 30.0,
            theme: ThemeName::default(),
            venue: Venue::default(),
            hype_limiter: false,
            manual_dimmer: 0.0,
            signal_states: SignalStates::new(),
        }
    }
}

impl ShowState {
    /// Default state at `venue`.
    pub fn at_venue(venue: Venue) -> Self {
        Self {
            venue,
            ..Self::default()
        }
    }

    /// Set hype, clamped to `0..=100`.
    pub fn set_hype(&mut self, hype: f32) {
        self.hype = hype.clamp(0.0, MAX_HYPE);
    }

    /// Limiter envelope, when engaged.
    pub fn hype_envelope(&self) -> Option<(f32, f32)> {
        self.hype_limiter.then_some(HYPE_LIMITER_ENVELOPE)
    }
}
