//! LightRig Control - DMX512 Transports
//!
//! Every transport implements [`lightrig_core::DmxController`]:
//! - **Art-Net**: OpDmx packets over UDP, one controller per universe
//! - **ENTTEC DMX USB Pro**: framed "send DMX" messages to a serial device
//! - **Mock**: in-memory frames for headless runs and tests
//! - **Switch**: routes writes by [`lightrig_core::Universe`] and flushes
//!   every backing controller together
//!
//! [`dmx::build_transport`] assembles a switch for a venue and falls back to
//! mocks for anything that cannot be opened.
//!
//! ## Modules
//!
//! - [`dmx`] - Transports and the transport factory
//! - [`error`] - Error types

#![warn(missing_docs)]

/// Error types
pub mod error;

/// DMX output (Art-Net, ENTTEC Pro, mock)
pub mod dmx;

// Re-exports
pub use dmx::{
    build_transport, ArtNetController, EnttecProController, MockController, SwitchController,
    TransportConfig, TransportKind,
};
pub use error::{ControlError, Result};
