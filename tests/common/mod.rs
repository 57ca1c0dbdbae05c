#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use hoptrace::{ProbeProtocol, ProbeSocket, ProbeSocketOpener, ReverseResolver, TracerouteError};

pub const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
pub const REPLY_DELAY: Duration = Duration::from_millis(5);

/// How the simulated network answers one probe.
#[derive(Clone, Debug)]
pub enum Hop {
    /// Nothing ever comes back; the socket waits out its timeout.
    Silent,
    /// The socket gives up immediately without data.
    GivesUp,
    /// A router on the path answers with Time-Exceeded.
    Router(Ipv4Addr),
    /// The destination answers: Echo-Reply for ICMP, Port-Unreachable for UDP.
    Destination,
    /// Replies for somebody else's probe keep arriving at a fixed pace.
    Noise { every: Duration },
    /// Opening the sockets fails for lack of privileges.
    Refuses,
}

#[derive(Default)]
pub struct NetworkLog {
    pub opens: Vec<u8>,
    pub sent: Vec<Vec<u8>>,
    pub waits: Vec<Duration>,
}

/// Scripted network: each ttl maps to the behaviour of its consecutive probes,
/// the last entry repeating once the script runs out.
#[derive(Clone)]
pub struct FakeNetwork {
    destination_address: Ipv4Addr,
    udp_local_port: u16,
    hops: HashMap<u8, Vec<Hop>>,
    default_hop: Hop,
    log: Arc<Mutex<NetworkLog>>,
}

impl FakeNetwork {
    pub fn new(destination_address: Ipv4Addr) -> Self {
        Self {
            destination_address,
            udp_local_port: 7,
            hops: HashMap::new(),
            default_hop: Hop::Silent,
            log: Arc::new(Mutex::new(NetworkLog::default())),
        }
    }

    pub fn udp_local_port(mut self, udp_local_port: u16) -> Self {
        self.udp_local_port = udp_local_port;
        self
    }

    pub fn hop(mut self, ttl: u8, hop: Hop) -> Self {
        self.hops.insert(ttl, vec![hop]);
        self
    }

    pub fn probes(mut self, ttl: u8, hops: Vec<Hop>) -> Self {
        self.hops.insert(ttl, hops);
        self
    }

    pub fn opens(&self) -> Vec<u8> {
        self.log.lock().unwrap().opens.clone()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.log.lock().unwrap().sent.clone()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.log.lock().unwrap().waits.clone()
    }

    fn behaviour(&self, ttl: u8, attempt: usize) -> Hop {
        match self.hops.get(&ttl) {
            Some(hops) => hops.get(attempt).or(hops.last()).cloned().unwrap_or(Hop::Silent),
            None => self.default_hop.clone(),
        }
    }
}

impl ProbeSocketOpener for FakeNetwork {
    type Socket = FakeSocket;

    fn open(&self, protocol: ProbeProtocol, ttl: u8) -> Result<FakeSocket, TracerouteError> {
        let attempt = {
            let mut log = self.log.lock().unwrap();
            let attempt = log.opens.iter().filter(|&&opened| opened == ttl).count();
            log.opens.push(ttl);
            attempt
        };

        let behaviour = self.behaviour(ttl, attempt);
        if let Hop::Refuses = behaviour {
            let error = io::Error::from(io::ErrorKind::PermissionDenied);
            return Err(TracerouteError::from_socket_creation(error));
        }

        Ok(FakeSocket {
            protocol,
            behaviour,
            destination_address: self.destination_address,
            udp_local_port: self.udp_local_port,
            log: self.log.clone(),
            reply: None,
            noise: None,
        })
    }
}

pub struct FakeSocket {
    protocol: ProbeProtocol,
    behaviour: Hop,
    destination_address: Ipv4Addr,
    udp_local_port: u16,
    log: Arc<Mutex<NetworkLog>>,
    reply: Option<Vec<u8>>,
    noise: Option<Vec<u8>>,
}

impl FakeSocket {
    /// The identifier a real stack would put in front of the probe payload.
    fn identifier(&self, packet: &[u8]) -> u16 {
        match self.protocol {
            ProbeProtocol::ICMP => u16::from_be_bytes([packet[4], packet[5]]),
            ProbeProtocol::UDP => self.udp_local_port,
        }
    }

    fn quoted_probe(&self, packet: &[u8], identifier: u16) -> Vec<u8> {
        match self.protocol {
            ProbeProtocol::ICMP => {
                let mut echo_request = packet.to_vec();
                echo_request[4..6].copy_from_slice(&identifier.to_be_bytes());
                ipv4(LOCAL, 1, &echo_request)
            },
            ProbeProtocol::UDP => ipv4(LOCAL, 17, &udp_header(identifier)),
        }
    }
}

#[async_trait]
impl ProbeSocket for FakeSocket {
    async fn send_to(&mut self, packet: &[u8], _destination_address: Ipv4Addr) -> io::Result<()> {
        self.log.lock().unwrap().sent.push(packet.to_vec());

        let identifier = self.identifier(packet);
        self.reply = match &self.behaviour {
            Hop::Router(router) => Some(ipv4(*router, 1, &icmp_error(11, 0, &self.quoted_probe(packet, identifier)))),
            Hop::Destination => match self.protocol {
                ProbeProtocol::ICMP => {
                    let mut echo_reply = packet.to_vec();
                    echo_reply[0] = 0;
                    Some(ipv4(self.destination_address, 1, &echo_reply))
                },
                ProbeProtocol::UDP => Some(ipv4(
                    self.destination_address,
                    1,
                    &icmp_error(3, 3, &self.quoted_probe(packet, identifier)),
                )),
            },
            _ => None,
        };
        let foreign = identifier.wrapping_add(1);
        self.noise = Some(ipv4(Ipv4Addr::new(10, 9, 9, 9), 1, &icmp_error(11, 0, &self.quoted_probe(packet, foreign))));

        Ok(())
    }

    async fn recv_within(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        self.log.lock().unwrap().waits.push(timeout);

        let (delay, datagram) = match &self.behaviour {
            Hop::GivesUp => return Ok(None),
            Hop::Noise { every } if *every < timeout => (*every, self.noise.clone()),
            Hop::Router(_) | Hop::Destination if REPLY_DELAY < timeout => (REPLY_DELAY, self.reply.clone()),
            _ => (timeout, None),
        };

        tokio::time::sleep(delay).await;
        Ok(datagram.map(|datagram| {
            buf[..datagram.len()].copy_from_slice(&datagram);
            datagram.len()
        }))
    }
}

pub fn ipv4(source: Ipv4Addr, protocol: u8, payload: &[u8]) -> Vec<u8> {
    let mut datagram = vec![0u8; 20];
    datagram[0] = 0x45;
    datagram[2..4].copy_from_slice(&((20 + payload.len()) as u16).to_be_bytes());
    datagram[8] = 64;
    datagram[9] = protocol;
    datagram[12..16].copy_from_slice(&source.octets());
    datagram[16..20].copy_from_slice(&LOCAL.octets());
    datagram.extend_from_slice(payload);
    datagram
}

pub fn icmp_error(icmp_type: u8, icmp_code: u8, quoted: &[u8]) -> Vec<u8> {
    let mut icmp = vec![icmp_type, icmp_code, 0, 0, 0, 0, 0, 0];
    icmp.extend_from_slice(quoted);
    icmp
}

pub fn udp_header(source_port: u16) -> Vec<u8> {
    let mut udp = Vec::new();
    udp.extend_from_slice(&source_port.to_be_bytes());
    udp.extend_from_slice(&33434u16.to_be_bytes());
    udp.extend_from_slice(&16u16.to_be_bytes());
    udp.extend_from_slice(&0u16.to_be_bytes());
    udp
}

/// Reverse lookups answered from a fixed table.
#[derive(Default)]
pub struct HostsTable {
    names: HashMap<Ipv4Addr, String>,
}

impl HostsTable {
    pub fn with(mut self, address: Ipv4Addr, name: &str) -> Self {
        self.names.insert(address, name.to_string());
        self
    }
}

#[async_trait(?Send)]
impl ReverseResolver for HostsTable {
    async fn reverse_lookup(&self, address: Ipv4Addr) -> Option<String> {
        self.names.get(&address).cloned()
    }
}
