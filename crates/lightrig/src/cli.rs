use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lightrig_core::{Mode, Phrase, RigSettings, ThemeName, Venue};

/// LightRig: audio-reactive DMX lighting director.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file. Missing files fall back to defaults.
    #[arg(short, long, default_value = "lightrig.toml")]
    pub config: PathBuf,

    /// Venue patch: dmack, mtn_lotus, truckee_theatre, crux_test.
    #[arg(long)]
    pub venue: Option<String>,

    /// Starting mode: blackout, gentle, rave.
    #[arg(long)]
    pub mode: Option<String>,

    /// Follow a phrase table: intro_outro, build, drop, breakdown, general.
    #[arg(long)]
    pub phrase: Option<String>,

    /// Starting theme: Rave, Pride, Berlin, Tropical, Halloween.
    #[arg(long)]
    pub theme: Option<String>,

    /// Starting hype, 0-100.
    #[arg(long)]
    pub hype: Option<f32>,

    /// Engage the hype limiter.
    #[arg(long, default_value_t = false)]
    pub hype_limiter: bool,

    /// Control loop rate.
    #[arg(long)]
    pub fps: Option<f32>,

    /// Seed for every random choice.
    #[arg(long)]
    pub seed: Option<u64>,

    /// ENTTEC DMX USB Pro device for the local universe.
    #[arg(long)]
    pub serial_port: Option<String>,

    /// Never open real hardware.
    #[arg(long, default_value_t = false)]
    pub mock: bool,

    /// Tempo of the synthetic signal source.
    #[arg(long, default_value_t = 128.0)]
    pub bpm: f64,

    /// Stop after this many seconds. Runs until interrupted when omitted.
    #[arg(long)]
    pub duration: Option<f64>,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the venue patch and exit.
    #[arg(long, default_value_t = false)]
    pub list_fixtures: bool,
}

impl Cli {
    /// Load the settings file and apply the flags on top.
    pub fn settings(&self) -> anyhow::Result<RigSettings> {
        let mut settings = RigSettings::load(&self.config)
            .with_context(|| format!("Failed to load settings from {:?}", self.config))?;
        self.apply(&mut settings)?;
        Ok(settings)
    }

    /// Override `settings` with every flag that was given.
    ///
    /// # Errors
    /// Returns an error for an unknown venue, mode, phrase or theme name.
    pub fn apply(&self, settings: &mut RigSettings) -> anyhow::Result<()> {
        if let Some(venue) = &self.venue {
            settings.venue = Venue::from_name(venue)?;
        }
        if let Some(mode) = &self.mode {
            settings.mode = Mode::from_name(mode)?;
        }
        if let Some(phrase) = &self.phrase {
            settings.phrase = Some(Phrase::from_name(phrase)?);
        }
        if let Some(theme) = &self.theme {
            settings.theme = ThemeName::from_name(theme)?;
        }
        if let Some(hype) = self.hype {
            settings.hype = hype;
        }
        if self.hype_limiter {
            settings.hype_limiter = true;
        }
        if let Some(fps) = self.fps {
            anyhow::ensure!(fps > 0.0, "--fps must be positive, got {}", fps);
            settings.fps = fps;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        if self.serial_port.is_some() {
            settings.serial_port = self.serial_port.clone();
        }
        if self.mock {
            settings.mock_dmx = true;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
        Ok(())
    }
}
