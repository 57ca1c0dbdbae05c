use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;
use tokio::time::Instant;

pub use executor::ProbeExecutor;
pub use hop::{HopProber, HopResult, PROBES_PER_HOP};
pub use parser::ProbeReplyParser;
pub use socket::{ProbeSocket, ProbeSocketOpener, RawProbeSocket, RawSocketOpener};

use crate::traceroute::utils::bytes::ToBytes;
use crate::traceroute::utils::packet_utils;
use crate::traceroute::utils::packet_utils::{
    ICMP_DESTINATION_UNREACHABLE, ICMP_ECHO_REPLY, ICMP_PORT_UNREACHABLE_CODE, ICMP_TIME_EXCEEDED,
};

pub mod executor;
pub mod hop;
pub mod parser;
pub mod socket;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ProbeProtocol {
    #[default]
    #[value(name = "icmp")]
    ICMP,
    #[value(name = "udp")]
    UDP,
}

impl ProbeProtocol {
    pub fn reply_parser(&self) -> &'static dyn ProbeReplyParser {
        match self {
            ProbeProtocol::ICMP => &parser::IcmpProbeReplyParser,
            ProbeProtocol::UDP => &parser::UdpProbeReplyParser,
        }
    }
}

impl Display for ProbeProtocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeProtocol::ICMP => write!(f, "ICMP"),
            ProbeProtocol::UDP => write!(f, "UDP"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown probe protocol '{0}'")]
pub struct UnknownProtocol(pub String);

impl FromStr for ProbeProtocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ICMP" => Ok(ProbeProtocol::ICMP),
            "UDP" => Ok(ProbeProtocol::UDP),
            _ => Err(UnknownProtocol(s.trim().to_string())),
        }
    }
}

/// ICMP message types that can answer a probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    EchoReply,
    DestinationUnreachable { code: u8 },
    TimeExceeded,
}

impl ReplyKind {
    pub fn from_icmp(icmp_type: u8, icmp_code: u8) -> Option<Self> {
        match icmp_type {
            ICMP_ECHO_REPLY => Some(ReplyKind::EchoReply),
            ICMP_DESTINATION_UNREACHABLE => Some(ReplyKind::DestinationUnreachable { code: icmp_code }),
            ICMP_TIME_EXCEEDED => Some(ReplyKind::TimeExceeded),
            _ => None,
        }
    }

    pub fn icmp_type(&self) -> u8 {
        match self {
            ReplyKind::EchoReply => ICMP_ECHO_REPLY,
            ReplyKind::DestinationUnreachable { .. } => ICMP_DESTINATION_UNREACHABLE,
            ReplyKind::TimeExceeded => ICMP_TIME_EXCEEDED,
        }
    }

    /// Echo-Reply and Port-Unreachable are only ever sent by the destination itself.
    pub fn is_destination_reached(&self) -> bool {
        match self {
            ReplyKind::EchoReply => true,
            ReplyKind::DestinationUnreachable { code } => *code == ICMP_PORT_UNREACHABLE_CODE,
            ReplyKind::TimeExceeded => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeReply {
    pub kind: ReplyKind,
    pub identifier: u16,
    pub from_address: Ipv4Addr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reply {
        delay: Duration,
        from_address: Ipv4Addr,
        kind: ReplyKind,
    },
    /// The whole wait budget was spent without a matching reply.
    Timeout,
    /// The socket gave up before the budget was spent.
    NoResponse,
}

impl ProbeOutcome {
    pub fn is_loss(&self) -> bool {
        !matches!(self, ProbeOutcome::Reply { .. })
    }

    pub fn from_address(&self) -> Option<Ipv4Addr> {
        match self {
            ProbeOutcome::Reply { from_address, .. } => Some(*from_address),
            _ => None,
        }
    }

    pub fn is_destination_reached(&self) -> bool {
        match self {
            ProbeOutcome::Reply { kind, .. } => kind.is_destination_reached(),
            _ => false,
        }
    }
}

impl Display for ProbeOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Reply { delay, .. } => write!(f, "{} ms", delay.as_millis()),
            ProbeOutcome::Timeout | ProbeOutcome::NoResponse => write!(f, "*"),
        }
    }
}

/// One outbound probe. The send instant is taken when the probe is created.
#[derive(Debug)]
pub struct Probe {
    protocol: ProbeProtocol,
    destination_address: Ipv4Addr,
    ttl: u8,
    identifier: u16,
    timestamp: f64,
    sent_at: Instant,
}

impl Probe {
    pub fn new(protocol: ProbeProtocol, destination_address: Ipv4Addr, ttl: u8, identifier: u16) -> Self {
        Self {
            protocol,
            destination_address,
            ttl,
            identifier,
            timestamp: packet_utils::unix_timestamp(),
            sent_at: Instant::now(),
        }
    }

    pub fn protocol(&self) -> ProbeProtocol {
        self.protocol
    }

    pub fn destination_address(&self) -> Ipv4Addr {
        self.destination_address
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self.protocol {
            ProbeProtocol::ICMP => packet_utils::build_icmpv4_echo_request(
                self.identifier,
                packet_utils::ICMP_ECHO_SEQUENCE_NUMBER,
                self.timestamp,
            ).to_bytes(),
            ProbeProtocol::UDP => packet_utils::build_udp_datagram_with_ports(
                packet_utils::UDP_PROBE_SOURCE_PORT,
                packet_utils::UDP_PROBE_DESTINATION_PORT,
                self.timestamp,
            ).to_bytes(),
        }
    }

    pub fn complete(&self, probe_reply: ProbeReply) -> Option<ProbeOutcome> {
        if probe_reply.identifier != self.identifier {
            return None;
        }

        Some(ProbeOutcome::Reply {
            delay: self.sent_at.elapsed(),
            from_address: probe_reply.from_address,
            kind: probe_reply.kind,
        })
    }
}
