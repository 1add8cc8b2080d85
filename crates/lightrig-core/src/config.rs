//! Runtime settings loaded from a TOML file.
//!
//! Every field has a default, so a partial file (or no file at all) is
//! valid. CLI flags and environment overrides are applied on top by the
//! binary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::director::{DirectorConfig, Mode, Phrase, ShowState};
use crate::dmx::Universe;
use crate::logging::LogConfig;
use crate::themes::ThemeName;
use crate::venues::{ArtNetTarget, Venue};
use crate::Result;

/// Art-Net destination override for one universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtNetSettings {
    /// Node IP address
    pub ip: String,
    /// Art-Net universe number on the node
    #[serde(default)]
    pub universe: u16,
}

/// Operator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigSettings {
    /// Venue to patch at startup
    pub venue: Venue,
    /// Starting mode
    pub mode: Mode,
    /// Starting phrase, `None` to follow the mode table alone
    pub phrase: Option<Phrase>,
    /// Starting theme
    pub theme: ThemeName,
    /// Starting global hype, `0..=100`
    pub hype: f32,
    /// Start with the hype limiter engaged
    pub hype_limiter: bool,
    /// Control loop rate
    pub fps: f32,
    /// Seed for interpreter and color selection
    pub seed: Option<u64>,
    /// Output ramp-up time after start
    pub warmup_seconds: f64,
    /// Minimum seconds between timed shifts
    pub shift_after: f64,
    /// Serial device for the local universe, e.g. `/dev/ttyUSB0`
    pub serial_port: Option<String>,
    /// Never open real hardware
    pub mock_dmx: bool,
    /// Art-Net overrides keyed by universe name (`art1`, ...)
    pub artnet: BTreeMap<String, ArtNetSettings>,
    /// Logging
    pub logging: LogConfig,
}

impl Default for RigSettings {
    fn default() -> Self {
        let director = DirectorConfig::default();
        Self {
            venue: Venue::default(),
            mode: Mode::default(),
            phrase: None,
            theme: ThemeName::default(),
            hype: 30.0,
            hype_limiter: false,
            fps: 40.0,
            seed: None,
            warmup_seconds: director.warmup_seconds,
            shift_after: director.shift_after,
            serial_port: None,
            mock_dmx: false,
            artnet: BTreeMap::new(),
            logging: LogConfig::default(),
        }
    }
}

impl RigSettings {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let settings = toml::from_str(&content)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Director timing derived from these settings.
    pub fn director_config(&self) -> DirectorConfig {
        DirectorConfig {
            warmup_seconds: self.warmup_seconds,
            shift_after: self.shift_after,
            seed: self.seed,
            ..DirectorConfig::default()
        }
    }

    /// Initial show state.
    pub fn show_state(&self) -> ShowState {
        let mut state = ShowState {
            mode: self.mode,
            phrase: self.phrase,
            theme: self.theme,
            venue: self.venue,
            hype_limiter: self.hype_limiter,
            ..ShowState::default()
        };
        state.set_hype(self.hype);
        state
    }

    /// The venue's Art-Net targets with any configured overrides applied.
    /// Entries for universes the venue does not patch are added as well.
    pub fn artnet_targets(&self) -> Vec<ArtNetTarget> {
        let mut targets = self.venue.artnet_targets();
        for (key, settings) in &self.artnet {
            let Some(universe) = Universe::from_key(key) else {
                warn!("Ignoring Art-Net settings for unknown universe '{}'", key);
                continue;
            };
            let target = ArtNetTarget {
                universe,
                ip: settings.ip.clone(),
                artnet_universe: settings.universe,
            };
            match targets.iter_mut().find(|t| t.universe == universe) {
                Some(existing) => *existing = target,
                None => targets.push(target),
            }
        }
        targets
    }
}
