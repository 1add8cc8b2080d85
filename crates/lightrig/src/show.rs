//! The control loop: frames in, DMX out.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use lightrig_core::{Director, DmxController, Frame};
use tracing::{info, warn};

/// Seconds between status lines.
const STATUS_INTERVAL: Duration = Duration::from_secs(10);
/// How long to wait for a frame before complaining.
const FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowStats {
    /// Frames stepped and rendered
    pub frames: u64,
    /// Renders whose submit failed
    pub submit_errors: u64,
}

/// Step and render every frame from `frames` until the sender hangs up or
/// frame time passes `duration`.
///
/// Submit failures are logged and counted; the show keeps running. A failing
/// step is a configuration error and ends the run.
pub fn run(
    director: &mut Director,
    output: &mut dyn DmxController,
    frames: &Receiver<Frame>,
    duration: Option<f64>,
) -> Result<ShowStats> {
    let mut stats = ShowStats::default();
    let mut first_time = None;
    let mut last_status = Instant::now();

    loop {
        let frame = match frames.recv_timeout(FRAME_TIMEOUT) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => {
                warn!("No signal frames for {:?}", FRAME_TIMEOUT);
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => {
                info!("Signal source disconnected");
                break;
            }
        };

        let start = *first_time.get_or_insert(frame.time);
        if duration.is_some_and(|limit| frame.time - start >= limit) {
            info!("Reached run duration");
            break;
        }

        director
            .step(&frame)
            .with_context(|| format!("Director step failed at {:.2}s", frame.time))?;
        if let Err(e) = director.render(output) {
            stats.submit_errors += 1;
            warn!("DMX submit failed: {}", e);
        }
        stats.frames += 1;

        if last_status.elapsed() >= STATUS_INTERVAL {
            last_status = Instant::now();
            let state = director.state();
            info!(
                "{} frames | mode {} | hype {:.0} | scheme {}",
                stats.frames,
                state.mode,
                state.hype,
                director.scheme()
            );
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use lightrig_core::{
        CoreError, DirectorConfig, DmxBuffer, FrameSignal, PolicyRegistry, ShowState, Universe,
        Venue,
    };

    fn director() -> Director {
        let config = DirectorConfig {
            seed: Some(9),
            warmup_seconds: 0.0,
            ..DirectorConfig::default()
        };
        Director::new(config, PolicyRegistry::standard(), ShowState::at_venue(Venue::MtnLotus)).unwrap()
    }

    struct Unplugged;

    impl DmxController for Unplugged {
        fn set_channel(&mut self, _channel: u16, _value: u8, _universe: Universe) {}

        fn submit(&mut self) -> lightrig_core::Result<()> {
            Err(CoreError::Transport("unplugged".to_string()))
        }
    }

    #[test]
    fn test_runs_until_sender_hangs_up() {
        let (tx, rx) = bounded(16);
        for i in 0..10 {
            tx.send(Frame::at(i as f64 / 40.0).with(FrameSignal::FreqAll, 0.5)).unwrap();
        }
        drop(tx);

        let mut output = DmxBuffer::new();
        let stats = run(&mut director(), &mut output, &rx, None).unwrap();
        assert_eq!(stats.frames, 10);
        assert_eq!(stats.submit_errors, 0);
    }

    #[test]
    fn test_duration_stops_run() {
        let (tx, rx) = bounded(16);
        for i in 0..10 {
            tx.send(Frame::at(100.0 + i as f64)).unwrap();
        }

        let mut output = DmxBuffer::new();
        let stats = run(&mut director(), &mut output, &rx, Some(5.0)).unwrap();
        assert_eq!(stats.frames, 5);
    }

    #[test]
    fn test_submit_errors_do_not_stop_the_show() {
        let (tx, rx) = bounded(4);
        for i in 0..3 {
            tx.send(Frame::at(i as f64)).unwrap();
        }
        drop(tx);

        let stats = run(&mut director(), &mut Unplugged, &rx, None).unwrap();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.submit_errors, 3);
    }
}
