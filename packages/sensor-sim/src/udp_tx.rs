//! udp_tx.rs — UDP transmitter for measurement datagrams
//!
//! One datagram per message, text wire form from `relay_types::codec`.
//! Best-effort: nothing is acknowledged or retransmitted.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use relay_types::{codec, Message, MAX_DATAGRAM_SIZE};
use tracing::debug;

use crate::SensorError;

pub struct UdpTransmitter {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl UdpTransmitter {
    /// Bind an ephemeral local socket and resolve the field unit address once.
    pub fn new(address: &str, port: u16) -> Result<Self, SensorError> {
        let dest = (address, port)
            .to_socket_addrs()
            .map_err(|source| SensorError::Resolve {
                address: address.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| SensorError::Resolve {
                address: address.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no address found"),
            })?;

        let bind_addr = if dest.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_nonblocking(false)?;
        Ok(Self { socket, dest })
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }

    pub fn send_message(&self, msg: &Message) -> Result<usize, SensorError> {
        let bytes = codec::encode(msg);
        if bytes.len() > MAX_DATAGRAM_SIZE {
            return Err(SensorError::Oversized {
                size: bytes.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        let sent = self.socket.send_to(&bytes, self.dest)?;
        debug!("UDP → {} {}", self.dest, msg);
        Ok(sent)
    }
}
