//! Derives the `hype` signal from swells in the bass envelope.

use tracing::{debug, info};

use crate::frame::{Frame, FrameSignal};

/// Longest trough-to-peak rise that still counts as a swell, in seconds.
pub const TROUGH_TO_PEAK_MAX_SECONDS: f64 = 1.0;
/// `sustained_low` below this is a trough.
pub const TROUGH_LEVEL: f32 = 0.1;
/// `sustained_low` above this is a peak.
pub const PEAK_LEVEL: f32 = 0.35;
/// No new trough is registered this soon after a peak.
pub const THROTTLE_SECONDS: f64 = 8.0;
/// Fraction of hype lost per frame.
pub const HYPE_DECAY: f32 = 0.01;

/// Watches `sustained_low` for a fast rise out of a trough.
///
/// A peak sets `hype` to 1, which then decays every frame.
#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    trough_time: Option<f64>,
    peak_time: Option<f64>,
    hype: f32,
}

impl ModeMachine {
    /// A machine with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current derived hype, `0..=1`.
    pub fn hype(&self) -> f32 {
        self.hype
    }

    /// Signals to merge into the frame.
    pub fn signals(&self) -> [(FrameSignal, f32); 1] {
        [(FrameSignal::Hype, self.hype)]
    }

    /// Advance one frame. Returns true when a peak was detected.
    pub fn step(&mut self, frame: &Frame) -> bool {
        self.hype *= 1.0 - HYPE_DECAY;
        let level = frame[FrameSignal::SustainedLow];

        let throttled = self
            .peak_time
            .is_some_and(|t| frame.time - t <= THROTTLE_SECONDS);
        if level < TROUGH_LEVEL && !throttled {
            if self.trough_time.is_none() {
                debug!("Trough detected at {:.2}s", frame.time);
            }
            self.trough_time = Some(frame.time);
            self.peak_time = None;
        }

        let rising = self
            .trough_time
            .is_some_and(|t| frame.time - t <= TROUGH_TO_PEAK_MAX_SECONDS);
        if level > PEAK_LEVEL && rising {
            info!("Peak detected at {:.2}s", frame.time);
            self.trough_time = None;
            self.peak_time = Some(frame.time);
            self.hype = 1.0;
            return true;
        }
        false
    }
}
