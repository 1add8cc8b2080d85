//! Synthetic audio signals for running without an analysis front end.
//!
//! A kick over a bass line on every beat, hats on the off-beats and a
//! breakdown with no low end for the last quarter of every phrase. `sustained_low` follows the kick
//! slowly, so breakdowns produce the trough-then-swell the mode machine
//! looks for.

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Context;
use crossbeam_channel::{bounded, Receiver, TrySendError};
use lightrig_core::{Frame, FrameSignal};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Beats per phrase.
const PHRASE_BEATS: f64 = 64.0;
/// Fraction of each phrase without a kick.
const BREAKDOWN_FRACTION: f64 = 0.25;
/// Smoothing of `sustained_low` and `sustained_high` per frame.
const SUSTAIN_SMOOTHING: f32 = 0.05;
const NOISE: f32 = 0.05;

/// Frame generator. Pure apart from the noise rng.
pub struct SyntheticSignals {
    bpm: f64,
    rng: StdRng,
    sustained_low: f32,
    sustained_high: f32,
}

impl SyntheticSignals {
    /// Generator at `bpm` with seeded noise.
    pub fn new(bpm: f64, seed: u64) -> Self {
        Self {
            bpm,
            rng: StdRng::seed_from_u64(seed),
            sustained_low: 0.0,
            sustained_high: 0.0,
        }
    }

    fn beats(&self, time: f64) -> f64 {
        time * self.bpm / 60.0
    }

    /// Whether `time` falls in a breakdown.
    pub fn in_breakdown(&self, time: f64) -> bool {
        let phrase = (self.beats(time) / PHRASE_BEATS).fract();
        phrase >= 1.0 - BREAKDOWN_FRACTION
    }

    /// Signals at `time` seconds.
    pub fn frame_at(&mut self, time: f64) -> Frame {
        let beats = self.beats(time);
        let phase = beats.fract();
        let breakdown = self.in_breakdown(time);

        let kick = if breakdown { 0.0 } else { (-phase * 8.0).exp() as f32 };
        let bass = if breakdown { 0.0 } else { 0.4 };
        let hat = ((phase - 0.5).abs() < 0.1) as u8 as f32 * 0.6;
        // Slow pad that keeps the highs moving through breakdowns
        let pad = (0.5 + 0.5 * (TAU * beats / 16.0).sin()) as f32 * 0.3;

        let mut noise = || self.rng.random_range(-NOISE..NOISE);
        let freq_low = (kick * 0.6 + bass + noise()).clamp(0.0, 1.0);
        let freq_high = (hat + pad + noise()).clamp(0.0, 1.0);
        let freq_all = (freq_low + freq_high) / 2.0;

        self.sustained_low += (freq_low - self.sustained_low) * SUSTAIN_SMOOTHING;
        self.sustained_high += (freq_high - self.sustained_high) * SUSTAIN_SMOOTHING;

        Frame::at(time)
            .with(FrameSignal::FreqLow, freq_low)
            .with(FrameSignal::FreqHigh, freq_high)
            .with(FrameSignal::FreqAll, freq_all)
            .with(FrameSignal::SustainedLow, self.sustained_low)
            .with(FrameSignal::SustainedHigh, self.sustained_high)
            .with(FrameSignal::Pulse, if kick > 0.8 { 1.0 } else { 0.0 })
    }
}

/// Handle to the generator thread. Stops the thread when dropped.
pub struct SignalSource {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SignalSource {
    /// Start generating `fps` frames per second into a bounded channel.
    ///
    /// When the consumer falls behind, frames are dropped rather than queued.
    pub fn spawn(bpm: f64, fps: f32, seed: u64) -> anyhow::Result<(Self, Receiver<Frame>)> {
        let (tx, rx) = bounded(4);
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let period = Duration::from_secs_f64(1.0 / f64::from(fps));

        let thread = thread::Builder::new()
            .name("signal-source".to_string())
            .spawn(move || {
                info!("Synthetic signal source started at {} BPM", bpm);
                let mut signals = SyntheticSignals::new(bpm, seed);
                let start = Instant::now();

                while flag.load(Ordering::Relaxed) {
                    let tick = Instant::now();
                    let frame = signals.frame_at(start.elapsed().as_secs_f64());
                    match tx.try_send(frame) {
                        Ok(()) => {}
                        Err(TrySendError::Full(frame)) => {
                            debug!("Dropped signal frame at {:.2}s (queue full)", frame.time)
                        }
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                    if let Some(rest) = period.checked_sub(tick.elapsed()) {
                        thread::sleep(rest);
                    }
                }
                info!("Synthetic signal source stopped");
            })
            .context("Failed to spawn signal source thread")?;

        Ok((
            Self {
                running,
                thread: Some(thread),
            },
            rx,
        ))
    }

    /// Stop the thread and wait for it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Signal source thread panicked");
            }
        }
    }
}

impl Drop for SignalSource {
    fn drop(&mut self) {
        self.stop();
    }
}
