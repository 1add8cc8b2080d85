//! Per-tick signal snapshots consumed by interpreters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, Mul};

/// Named audio-derived control channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSignal {
    /// Bass band energy
    FreqLow,
    /// Treble band energy
    FreqHigh,
    /// Full-spectrum energy
    FreqAll,
    /// Slow-moving bass envelope
    SustainedLow,
    /// Slow-moving treble envelope
    SustainedHigh,
    /// Strobe request
    Strobe,
    /// Generic pulse request
    Pulse,
    /// Large pulse request
    BigPulse,
    /// Small pulse request
    SmallPulse,
    /// Full blinder request
    BigBlinder,
    /// Partial blinder request
    SmallBlinder,
    /// Blackout request
    Dampen,
    /// Twinkle request
    Twinkle,
    /// Derived energy level
    Hype,
}

impl FrameSignal {
    /// Every signal, in declaration order.
    pub const ALL: [FrameSignal; 14] = [
        FrameSignal::FreqLow,
        FrameSignal::FreqHigh,
        FrameSignal::FreqAll,
        FrameSignal::SustainedLow,
        FrameSignal::SustainedHigh,
        FrameSignal::Strobe,
        FrameSignal::Pulse,
        FrameSignal::BigPulse,
        FrameSignal::SmallPulse,
        FrameSignal::BigBlinder,
        FrameSignal::SmallBlinder,
        FrameSignal::Dampen,
        FrameSignal::Twinkle,
        FrameSignal::Hype,
    ];

    /// Signals that operators latch by hand rather than derive from audio.
    pub const MANUAL: [FrameSignal; 7] = [
        FrameSignal::Strobe,
        FrameSignal::BigPulse,
        FrameSignal::SmallPulse,
        FrameSignal::Twinkle,
        FrameSignal::Dampen,
        FrameSignal::BigBlinder,
        FrameSignal::SmallBlinder,
    ];

    /// snake_case name used in logs and config.
    pub fn name(&self) -> &'static str {
        match self {
            FrameSignal::FreqLow => "freq_low",
            FrameSignal::FreqHigh => "freq_high",
            FrameSignal::FreqAll => "freq_all",
            FrameSignal::SustainedLow => "sustained_low",
            FrameSignal::SustainedHigh => "sustained_high",
            FrameSignal::Strobe => "strobe",
            FrameSignal::Pulse => "pulse",
            FrameSignal::BigPulse => "big_pulse",
            FrameSignal::SmallPulse => "small_pulse",
            FrameSignal::BigBlinder => "big_blinder",
            FrameSignal::SmallBlinder => "small_blinder",
            FrameSignal::Dampen => "dampen",
            FrameSignal::Twinkle => "twinkle",
            FrameSignal::Hype => "hype",
        }
    }
}

impl fmt::Display for FrameSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const ZERO: f32 = 0.0;

/// Signal values for one control tick plus the logical time in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    values: HashMap<FrameSignal, f32>,
    /// Monotonic time in seconds
    pub time: f64,
}

impl Frame {
    /// Create a frame from signal values.
    pub fn new(values: HashMap<FrameSignal, f32>, time: f64) -> Self {
        Self { values, time }
    }

    /// An empty frame at `time`.
    pub fn at(time: f64) -> Self {
        Self {
            values: HashMap::new(),
            time,
        }
    }

    /// Builder-style signal assignment.
    pub fn with(mut self, signal: FrameSignal, value: f32) -> Self {
        self.values.insert(signal, value);
        self
    }

    /// Value of `signal`, 0 when absent.
    pub fn get(&self, signal: FrameSignal) -> f32 {
        self[signal]
    }

    /// Whether `signal` was explicitly provided.
    pub fn contains(&self, signal: FrameSignal) -> bool {
        self.values.contains_key(&signal)
    }

    /// Merge derived signals. Keys already present are kept as-is.
    pub fn extend<I>(&mut self, extra: I)
    where
        I: IntoIterator<Item = (FrameSignal, f32)>,
    {
        for (signal, value) in extra {
            self.values.entry(signal).or_insert(value);
        }
    }

    /// Merge values keeping the louder of the two for every key.
    pub fn raise<I>(&mut self, extra: I)
    where
        I: IntoIterator<Item = (FrameSignal, f32)>,
    {
        for (signal, value) in extra {
            let current = self.values.entry(signal).or_insert(value);
            *current = current.max(value);
        }
    }

    /// Iterate over the explicitly provided signals.
    pub fn iter(&self) -> impl Iterator<Item = (FrameSignal, f32)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

impl Index<FrameSignal> for Frame {
    type Output = f32;

    fn index(&self, signal: FrameSignal) -> &f32 {
        self.values.get(&signal).unwrap_or(&ZERO)
    }
}

impl Mul<f32> for &Frame {
    type Output = Frame;

    fn mul(self, factor: f32) -> Frame {
        Frame {
            values: self.values.iter().map(|(k, v)| (*k, v * factor)).collect(),
            time: self.time,
        }
    }
}

impl Mul<f32> for Frame {
    type Output = Frame;

    fn mul(self, factor: f32) -> Frame {
        &self * factor
    }
}

/// Manually latched signal values merged into every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalStates {
    states: HashMap<FrameSignal, f32>,
}

impl Default for SignalStates {
    fn default() -> Self {
        Self {
            states: FrameSignal::MANUAL.iter().map(|s| (*s, 0.0)).collect(),
        }
    }
}

impl SignalStates {
    /// All manual signals at rest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch `signal` at `value`.
    pub fn set_signal(&mut self, signal: FrameSignal, value: f32) {
        self.states.insert(signal, value.clamp(0.0, 1.0));
    }

    /// Snapshot of the current latched values.
    pub fn get_states(&self) -> HashMap<FrameSignal, f32> {
        self.states.clone()
    }

    /// Latched values that are currently engaged.
    pub fn active(&self) -> impl Iterator<Item = (FrameSignal, f32)> + '_ {
        self.states
            .iter()
            .filter(|(_, v)| **v > 0.0)
            .map(|(k, v)| (*k, *v))
    }
}
