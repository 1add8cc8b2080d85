//! In-memory transport.

use std::collections::BTreeMap;

use lightrig_core::{DmxController, Universe, DMX_CHANNELS};
use tracing::trace;

use super::frame_index;

/// Keeps staged and submitted frames in memory. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MockController {
    staged: BTreeMap<Universe, [u8; DMX_CHANNELS]>,
    submitted: BTreeMap<Universe, [u8; DMX_CHANNELS]>,
    submits: usize,
}

impl MockController {
    /// Empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `channel` in the last submitted frame.
    pub fn get(&self, channel: u16, universe: Universe) -> u8 {
        let Some(i) = usize::from(channel).checked_sub(1).filter(|i| *i < DMX_CHANNELS) else {
            return 0;
        };
        self.submitted.get(&universe).map_or(0, |frame| frame[i])
    }

    /// Last submitted frame for `universe`.
    pub fn frame(&self, universe: Universe) -> Option<&[u8; DMX_CHANNELS]> {
        self.submitted.get(&universe)
    }

    /// Number of submits so far.
    pub fn submit_count(&self) -> usize {
        self.submits
    }
}

impl DmxController for MockController {
    fn set_channel(&mut self, channel: u16, value: u8, universe: Universe) {
        if let Some(i) = frame_index(channel) {
            self.staged.entry(universe).or_insert([0; DMX_CHANNELS])[i] = value;
        }
    }

    fn submit(&mut self) -> lightrig_core::Result<()> {
        for (universe, frame) in &self.staged {
            self.submitted.insert(*universe, *frame);
        }
        self.submits += 1;
        trace!("Mock submit #{}", self.submits);
        Ok(())
    }
}
