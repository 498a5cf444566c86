/// Destinations for serialized messages.
use std::{
    io,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
};

use tracing::{debug, trace};

use crate::{config::TransportConfig, Error, SRResult};

/// Default UDP port the listening clients bind.
pub const DEFAULT_UDP_PORT: u16 = 45678;

/// Something that delivers one serialized message. Blocking; timeouts are the implementation's
/// business.
pub trait MessageSink {
    fn send_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<T: MessageSink + ?Sized> MessageSink for &mut T {
    fn send_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).send_bytes(bytes)
    }
}

/// Sends each message as a single UDP datagram, broadcast by default.
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpSink {
    /// Bind an ephemeral local port and target `destination`.
    pub fn new(destination: SocketAddr) -> io::Result<Self> {
        let bind_addr: SocketAddr = if destination.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_broadcast(true)?;
        debug!("udp sink {} -> {}", socket.local_addr()?, destination);
        Ok(Self {
            socket,
            destination,
        })
    }

    pub fn from_config(config: &TransportConfig) -> SRResult<Self> {
        let destination = config
            .destination
            .to_socket_addrs()
            .map_err(|e| Error::Config(format!("destination {:?}: {e}", config.destination)))?
            .next()
            .ok_or_else(|| {
                Error::Config(format!("destination {:?} did not resolve", config.destination))
            })?;
        Ok(Self::new(destination)?)
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }
}

impl MessageSink for UdpSink {
    fn send_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        let n = self.socket.send_to(bytes, self.destination)?;
        trace!("udp sent {} of {} bytes to {}", n, bytes.len(), self.destination);
        if n != bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram: {n} of {} bytes", bytes.len()),
            ));
        }
        Ok(())
    }
}

/// Keeps every message in memory, in send order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub messages: Vec<Vec<u8>>,
}

impl MessageSink for MemorySink {
    fn send_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.messages.push(bytes.to_vec());
        Ok(())
    }
}
