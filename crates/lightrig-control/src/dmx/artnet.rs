//! Art-Net OpDmx output.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, UdpSocket};

use lightrig_core::{CoreError, DmxController, Universe, DMX_CHANNELS};
use tracing::{debug, info, trace};

use super::frame_index;
use crate::{error::ControlError, Result};

/// UDP port every Art-Net node listens on.
pub const ARTNET_PORT: u16 = 6454;

/// Bytes before the DMX data in an OpDmx packet.
pub const ARTNET_HEADER_LEN: usize = 18;

const OP_DMX: u16 = 0x5000;
const PROTOCOL_VERSION: u16 = 14;

/// Build an OpDmx packet.
pub fn encode_artnet_packet(universe: u16, sequence: u8, data: &[u8; DMX_CHANNELS]) -> Vec<u8> {
    let mut packet = vec![0u8; ARTNET_HEADER_LEN + DMX_CHANNELS];

    packet[0..8].copy_from_slice(b"Art-Net\0");
    packet[8..10].copy_from_slice(&OP_DMX.to_le_bytes());
    packet[10..12].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    packet[12] = sequence;
    // Physical input port
    packet[13] = 0;
    packet[14..16].copy_from_slice(&universe.to_le_bytes());
    packet[16..18].copy_from_slice(&(DMX_CHANNELS as u16).to_be_bytes());
    packet[ARTNET_HEADER_LEN..].copy_from_slice(data);

    packet
}

/// Sends one Art-Net universe to one node.
pub struct ArtNetController {
    socket: UdpSocket,
    target: SocketAddr,
    universe: u16,
    sequence: u8,
    frame: [u8; DMX_CHANNELS],
}

impl ArtNetController {
    /// Open a socket sending `universe` to `ip` on the Art-Net port.
    pub fn new(ip: &str, universe: u16) -> Result<Self> {
        let ip: IpAddr = ip
            .parse()
            .map_err(|e| ControlError::DmxError(format!("Invalid Art-Net IP '{}': {}", ip, e)))?;
        Self::with_target(SocketAddr::new(ip, ARTNET_PORT), universe)
    }

    /// Open a socket sending `universe` to an explicit address.
    pub fn with_target(target: SocketAddr, universe: u16) -> Result<Self> {
        let bind: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind)?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;

        info!("Art-Net sender created for universe {} -> {}", universe, target);

        Ok(Self {
            socket,
            target,
            universe,
            sequence: 0,
            frame: [0; DMX_CHANNELS],
        })
    }

    /// Art-Net universe on the node.
    pub fn universe(&self) -> u16 {
        self.universe
    }

    /// Destination address.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Staged frame.
    pub fn frame(&self) -> &[u8; DMX_CHANNELS] {
        &self.frame
    }
}

impl DmxController for ArtNetController {
    fn set_channel(&mut self, channel: u16, value: u8, _universe: Universe) {
        if let Some(i) = frame_index(channel) {
            self.frame[i] = value;
        }
    }

    fn submit(&mut self) -> lightrig_core::Result<()> {
        let packet = encode_artnet_packet(self.universe, self.sequence, &self.frame);
        match self.socket.send_to(&packet, self.target) {
            Ok(_) => {
                self.sequence = self.sequence.wrapping_add(1);
                trace!("Sent Art-Net DMX packet for universe {}", self.universe);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                debug!("Art-Net socket busy, dropped frame for universe {}", self.universe);
                Ok(())
            }
            Err(e) => Err(CoreError::Transport(format!(
                "Art-Net send to {} failed: {}",
                self.target, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artnet_packet_structure() {
        let mut data = [0u8; DMX_CHANNELS];
        data[0] = 7;
        data[511] = 9;
        let packet = encode_artnet_packet(0x0102, 3, &data);

        assert_eq!(&packet[0..8], b"Art-Net\0");
        // OpCode, little-endian
        assert_eq!(packet[8], 0x00);
        assert_eq!(packet[9], 0x50);
        // Protocol version, big-endian
        assert_eq!(packet[10], 0);
        assert_eq!(packet[11], 14);
        assert_eq!(packet[12], 3);
        assert_eq!(packet[13], 0);
        // Universe, little-endian
        assert_eq!(packet[14], 0x02);
        assert_eq!(packet[15], 0x01);
        // Length, big-endian
        assert_eq!(packet[16], 0x02);
        assert_eq!(packet[17], 0x00);

        assert_eq!(packet.len(), ARTNET_HEADER_LEN + DMX_CHANNELS);
        assert_eq!(packet[18], 7);
        assert_eq!(packet[529], 9);
    }

    #[test]
    fn test_invalid_ip() {
        assert!(ArtNetController::new("not-an-ip", 0).is_err());
    }

    #[test]
    fn test_overflow_channel_skipped() {
        let mut controller = ArtNetController::new("127.0.0.1", 0).unwrap();
        controller.set_channel(513, 255, Universe::ART1);
        controller.set_channel(512, 4, Universe::ART1);
        assert_eq!(controller.frame()[511], 4);
        assert!(controller.frame()[..511].iter().all(|v| *v == 0));
    }
}
