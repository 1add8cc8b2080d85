//! ENTTEC DMX USB Pro output.
//!
//! The device is written without blocking. A message the driver only
//! partly accepts is finished at the start of the next submit; while that
//! remainder is still stuck, new frames are dropped so the wire never sees
//! an interleaved message.

use std::fs::OpenOptions;
use std::io::{self, ErrorKind, Write};

use lightrig_core::{CoreError, DmxController, Universe, DMX_CHANNELS};
use tracing::{debug, info, trace, warn};

use super::frame_index;
use crate::Result;

const START_OF_MESSAGE: u8 = 0x7E;
const END_OF_MESSAGE: u8 = 0xE7;
const SEND_DMX_LABEL: u8 = 6;
const DMX_START_CODE: u8 = 0x00;

/// Frame a full universe as a "send DMX" widget message.
pub fn encode_enttec_message(data: &[u8; DMX_CHANNELS]) -> Vec<u8> {
    // Start code plus channel data
    let length = (DMX_CHANNELS + 1) as u16;
    let mut message = Vec::with_capacity(DMX_CHANNELS + 6);
    message.push(START_OF_MESSAGE);
    message.push(SEND_DMX_LABEL);
    message.extend_from_slice(&length.to_le_bytes());
    message.push(DMX_START_CODE);
    message.extend_from_slice(data);
    message.push(END_OF_MESSAGE);
    message
}

/// Writes the local universe to an ENTTEC DMX USB Pro.
pub struct EnttecProController {
    port: Box<dyn Write + Send>,
    name: String,
    frame: [u8; DMX_CHANNELS],
    pending: Vec<u8>,
    dropped: u64,
}

impl EnttecProController {
    /// Open the widget's serial device, e.g. `/dev/ttyUSB0`, in
    /// non-blocking mode.
    pub fn open(path: &str) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY);
        }
        let port = options.open(path)?;
        info!("ENTTEC DMX USB Pro opened at {}", path);
        Ok(Self::from_writer(path, Box::new(port)))
    }

    /// Use any writer as the device. The writer should report
    /// [`ErrorKind::WouldBlock`] rather than block.
    pub fn from_writer(name: &str, port: Box<dyn Write + Send>) -> Self {
        Self {
            port,
            name: name.to_string(),
            frame: [0; DMX_CHANNELS],
            pending: Vec::new(),
            dropped: 0,
        }
    }

    /// Staged frame.
    pub fn frame(&self) -> &[u8; DMX_CHANNELS] {
        &self.frame
    }

    /// Frames skipped because the device was not accepting data.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Write as much of `pending` as the device takes. `Ok(false)` means
    /// the device would block with bytes still outstanding.
    fn drain(&mut self) -> io::Result<bool> {
        while !self.pending.is_empty() {
            match self.port.write(&self.pending) {
                Ok(0) => return Err(io::Error::new(ErrorKind::WriteZero, "device accepted no bytes")),
                Ok(n) => {
                    self.pending.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(false),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    fn write_error(&self, e: io::Error) -> CoreError {
        CoreError::Transport(format!("ENTTEC write to {} failed: {}", self.name, e))
    }
}

impl DmxController for EnttecProController {
    fn set_channel(&mut self, channel: u16, value: u8, _universe: Universe) {
        if let Some(i) = frame_index(channel) {
            self.frame[i] = value;
        }
    }

    fn submit(&mut self) -> lightrig_core::Result<()> {
        match self.drain() {
            Ok(true) => {}
            Ok(false) => {
                self.dropped += 1;
                warn!(
                    "ENTTEC device {} busy, dropped frame ({} so far)",
                    self.name, self.dropped
                );
                return Ok(());
            }
            Err(e) => return Err(self.write_error(e)),
        }

        self.pending = encode_enttec_message(&self.frame);
        match self.drain() {
            Ok(true) => {
                trace!("Sent ENTTEC frame to {}", self.name);
            }
            Ok(false) => {
                debug!(
                    "ENTTEC device {} took a partial frame, {} bytes left",
                    self.name,
                    self.pending.len()
                );
            }
            Err(e) => return Err(self.write_error(e)),
        }
        match self.port.flush() {
            Err(e) if e.kind() != ErrorKind::WouldBlock => Err(self.write_error(e)),
            _ => Ok(()),
        }
    }
}
