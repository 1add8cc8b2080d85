//! DMX output system
//!
//! ## Art-Net
//!
//! Art-Net carries DMX512 over UDP port 6454.
//! - One OpDmx packet per universe per submit
//! - 18-byte header followed by the full 512-byte frame
//! - Sends are non-blocking; a full socket buffer drops the frame
//!
//! ## ENTTEC DMX USB Pro
//!
//! The widget shows up as a serial device and takes framed messages:
//! start byte `0x7E`, label 6 ("send DMX"), a little-endian length, the DMX
//! start code, 512 data bytes and end byte `0xE7`.
//!
//! ## Example Usage
//!
//! ```rust
//! use lightrig_control::dmx::{MockController, SwitchController, TransportKind};
//! use lightrig_core::{DmxController, Universe};
//!
//! let mut switch = SwitchController::new();
//! switch.add(Universe::Default, TransportKind::Mock, Box::new(MockController::new()));
//!
//! switch.set_channel(1, 255, Universe::Default);
//! switch.submit().unwrap();
//! ```

pub mod artnet;
pub mod enttec;
pub mod factory;
pub mod mock;
pub mod switch;

pub use artnet::{encode_artnet_packet, ArtNetController, ARTNET_HEADER_LEN, ARTNET_PORT};
pub use enttec::{encode_enttec_message, EnttecProController};
pub use factory::{build_transport, build_transport_with, mock_forced, TransportConfig};
pub use mock::MockController;
pub use switch::{SwitchController, TransportKind};

use lightrig_core::DMX_CHANNELS;
use tracing::warn;

/// Zero-based frame index for a 1-based channel, warning on overflow.
pub(crate) fn frame_index(channel: u16) -> Option<usize> {
    let index = usize::from(channel).checked_sub(1)?;
    if index >= DMX_CHANNELS {
        warn!("DMX channel {} is past the end of the universe, skipped", channel);
        return None;
    }
    Some(index)
}
