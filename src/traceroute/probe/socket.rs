use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use socket2::{Domain, Protocol, Type};

use crate::traceroute::async_socket::AsyncSocket;
use crate::traceroute::error::TracerouteError;
use crate::traceroute::probe::ProbeProtocol;
use crate::traceroute::utils::packet_utils::UDP_PROBE_DESTINATION_PORT;

/// The sockets owned by a single probe attempt.
#[async_trait]
pub trait ProbeSocket: Send {
    async fn send_to(&mut self, packet: &[u8], destination_address: Ipv4Addr) -> io::Result<()>;

    /// Reads one datagram from the receive side, waiting no longer than `timeout`.
    async fn recv_within(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}

/// Opens a fresh socket set for every probe attempt, with the hop limit applied.
pub trait ProbeSocketOpener {
    type Socket: ProbeSocket;

    fn open(&self, protocol: ProbeProtocol, ttl: u8) -> Result<Self::Socket, TracerouteError>;
}

pub struct RawSocketOpener {
    udp_local_port: u16,
}

impl RawSocketOpener {
    pub const DEFAULT_UDP_LOCAL_PORT: u16 = 7;

    pub fn new(udp_local_port: u16) -> Self {
        Self { udp_local_port }
    }

    fn build_socket(ty: Type, protocol: Protocol, ttl: u8) -> Result<AsyncSocket, TracerouteError> {
        let socket = AsyncSocket::new(Domain::IPV4, ty, Some(protocol))
            .map_err(TracerouteError::from_socket_creation)?;
        socket.set_ttl(ttl as u32).map_err(TracerouteError::SocketOption)?;
        Ok(socket)
    }

    fn bind_local_port(&self, socket: &AsyncSocket) -> Result<(), TracerouteError> {
        let local_address = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.udp_local_port);
        socket.bind(local_address).map_err(|source| TracerouteError::SocketBind {
            port: self.udp_local_port,
            source,
        })
    }
}

impl Default for RawSocketOpener {
    fn default() -> Self {
        Self::new(Self::DEFAULT_UDP_LOCAL_PORT)
    }
}

impl ProbeSocketOpener for RawSocketOpener {
    type Socket = RawProbeSocket;

    fn open(&self, protocol: ProbeProtocol, ttl: u8) -> Result<RawProbeSocket, TracerouteError> {
        match protocol {
            ProbeProtocol::ICMP => {
                let socket = Self::build_socket(Type::RAW, Protocol::ICMPV4, ttl)?;
                Ok(RawProbeSocket::Icmp { socket })
            },
            ProbeProtocol::UDP => {
                let sender = Self::build_socket(Type::DGRAM, Protocol::UDP, ttl)?;
                self.bind_local_port(&sender)?;
                // Same hop limit on the receiver so returned errors are not filtered locally.
                let receiver = Self::build_socket(Type::RAW, Protocol::ICMPV4, ttl)?;
                self.bind_local_port(&receiver)?;
                Ok(RawProbeSocket::Udp { sender, receiver })
            },
        }
    }
}

/// ICMP probes send and receive on one raw socket; UDP probes send on a
/// datagram socket and listen for the ICMP answer on a raw one.
pub enum RawProbeSocket {
    Icmp { socket: AsyncSocket },
    Udp { sender: AsyncSocket, receiver: AsyncSocket },
}

#[async_trait]
impl ProbeSocket for RawProbeSocket {
    async fn send_to(&mut self, packet: &[u8], destination_address: Ipv4Addr) -> io::Result<()> {
        match self {
            RawProbeSocket::Icmp { socket } => {
                let socket_addr = SocketAddr::new(IpAddr::V4(destination_address), 0);
                socket.send_to(packet, socket_addr).await?;
            },
            RawProbeSocket::Udp { sender, .. } => {
                let socket_addr = SocketAddr::new(IpAddr::V4(destination_address), UDP_PROBE_DESTINATION_PORT);
                sender.send_to(packet, socket_addr).await?;
            },
        }

        Ok(())
    }

    async fn recv_within(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        let receiver = match self {
            RawProbeSocket::Icmp { socket } => socket,
            RawProbeSocket::Udp { receiver, .. } => receiver,
        };

        receiver.recv_within(buf, timeout).await
    }
}
