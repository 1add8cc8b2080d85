//! LightRig - audio-reactive DMX lighting director

mod cli;
mod logging_setup;
mod show;
mod signal_source;

use anyhow::{Context, Result};
use clap::Parser;
use lightrig_control::{build_transport, TransportConfig};
use lightrig_core::{Director, PolicyRegistry};
use tracing::info;

use crate::cli::Cli;
use crate::signal_source::SignalSource;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;
    let _log_guard = logging_setup::init(&settings.logging)?;

    info!("==========================================");
    info!("===      LightRig Session Started      ===");
    info!("==========================================");

    if cli.list_fixtures {
        let rig = settings.venue.patch()?;
        println!("{}:", settings.venue);
        for id in rig.roots() {
            println!("  {}", rig.describe(*id));
        }
        return Ok(());
    }

    let mut director = Director::new(
        settings.director_config(),
        PolicyRegistry::standard(),
        settings.show_state(),
    )
    .context("Failed to set up director")?;

    let mut output = build_transport(&TransportConfig {
        serial_port: settings.serial_port.clone(),
        mock: settings.mock_dmx,
        artnet: settings.artnet_targets(),
    });

    let seed = settings.seed.unwrap_or_else(rand::random);
    let (mut source, frames) = SignalSource::spawn(cli.bpm, settings.fps, seed)?;

    info!("--- Entering Show Loop ---");
    let stats = show::run(&mut director, &mut output, &frames, cli.duration)?;
    source.stop();

    info!(
        "Session finished: {} frames, {} failed submits",
        stats.frames, stats.submit_errors
    );
    Ok(())
}
