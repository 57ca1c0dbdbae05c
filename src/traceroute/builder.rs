use std::net::IpAddr;
use std::time::Duration;

use crate::traceroute::error::TracerouteError;
use crate::traceroute::probe::{HopProber, ProbeExecutor, ProbeProtocol, ProbeSocketOpener, RawSocketOpener};
use crate::traceroute::session::TraceSession;
use crate::traceroute::utils;
use crate::Traceroute;

pub struct TracerouteBuilder;

impl TracerouteBuilder {
    pub fn udp() -> TracerouteUdpBuilder {
        let traceroute_base_builder = TracerouteBaseBuilder::new();
        TracerouteUdpBuilder::new(traceroute_base_builder)
    }

    pub fn icmp() -> TracerouteIcmpBuilder {
        let traceroute_base_builder = TracerouteBaseBuilder::new();
        TracerouteIcmpBuilder::new(traceroute_base_builder)
    }
}

struct TracerouteBaseBuilder {
    target_ip_address: Option<IpAddr>,
    max_ttl: u8,
    max_wait_probe: Duration,
    is_active_dns_lookup: bool,
}

impl TracerouteBaseBuilder {
    const DEFAULT_MAX_TTL: u8 = 30;
    const DEFAULT_MAX_WAIT_PROBE: Duration = Duration::from_secs(1);
    const DEFAULT_IS_ACTIVE_DNS_LOOKUP: bool = true;

    fn new() -> Self {
        Self {
            target_ip_address: None,
            max_ttl: Self::DEFAULT_MAX_TTL,
            max_wait_probe: Self::DEFAULT_MAX_WAIT_PROBE,
            is_active_dns_lookup: Self::DEFAULT_IS_ACTIVE_DNS_LOOKUP,
        }
    }

    fn target_ip_address(&mut self, ip_addr: IpAddr) {
        self.target_ip_address = Some(ip_addr);
    }

    fn max_ttl(&mut self, max_ttl: u8) {
        self.max_ttl = max_ttl;
    }

    fn max_wait_probe(&mut self, max_wait_probe: Duration) {
        self.max_wait_probe = max_wait_probe;
    }

    fn active_dns_lookup(&mut self, active_dns_lookup: bool) {
        self.is_active_dns_lookup = active_dns_lookup;
    }

    fn build<O: ProbeSocketOpener>(
        self,
        protocol: ProbeProtocol,
        identifier: u16,
        socket_opener: O,
    ) -> Result<Traceroute<O>, TracerouteError> {
        let destination_address = match self.target_ip_address {
            None => return Err(TracerouteError::MissingDestination),
            Some(IpAddr::V6(ipv6_address)) => return Err(TracerouteError::Ipv6NotSupported(IpAddr::V6(ipv6_address))),
            Some(IpAddr::V4(ipv4_address)) => ipv4_address,
        };

        let max_ttl = self.max_ttl.max(1);
        let session = TraceSession::new(destination_address, protocol, self.max_wait_probe, identifier, max_ttl);
        let probe_executor = ProbeExecutor::new(
            socket_opener,
            protocol,
            destination_address,
            identifier,
            self.max_wait_probe,
        );

        Ok(Traceroute::new(session, HopProber::new(probe_executor), self.is_active_dns_lookup))
    }
}

pub struct TracerouteUdpBuilder {
    traceroute_base_builder: TracerouteBaseBuilder,
    local_port: u16,
}

impl TracerouteUdpBuilder {
    fn new(traceroute_base_builder: TracerouteBaseBuilder) -> Self {
        Self {
            local_port: RawSocketOpener::DEFAULT_UDP_LOCAL_PORT,
            traceroute_base_builder,
        }
    }

    /// Local port of the probe sockets. Replies are matched on it.
    pub fn local_port(mut self, local_port: u16) -> Self {
        self.local_port = local_port;
        self
    }

    pub fn target_ip_address(mut self, ip_addr: IpAddr) -> Self {
        self.traceroute_base_builder.target_ip_address(ip_addr);
        self
    }

    pub fn max_ttl(mut self, max_ttl: u8) -> Self {
        self.traceroute_base_builder.max_ttl(max_ttl);
        self
    }

    pub fn max_wait_probe(mut self, max_wait_probe: Duration) -> Self {
        self.traceroute_base_builder.max_wait_probe(max_wait_probe);
        self
    }

    pub fn active_dns_lookup(mut self, active_dns_lookup: bool) -> Self {
        self.traceroute_base_builder.active_dns_lookup(active_dns_lookup);
        self
    }

    pub fn build(self) -> Result<Traceroute<RawSocketOpener>, TracerouteError> {
        let socket_opener = RawSocketOpener::new(self.local_port);
        self.build_with(socket_opener)
    }

    pub fn build_with<O: ProbeSocketOpener>(self, socket_opener: O) -> Result<Traceroute<O>, TracerouteError> {
        self.traceroute_base_builder.build(ProbeProtocol::UDP, self.local_port, socket_opener)
    }
}

pub struct TracerouteIcmpBuilder {
    traceroute_base_builder: TracerouteBaseBuilder,
    identifier: u16,
}

impl TracerouteIcmpBuilder {
    fn new(traceroute_base_builder: TracerouteBaseBuilder) -> Self {
        Self {
            identifier: utils::session_identifier(),
            traceroute_base_builder,
        }
    }

    /// Echo identifier of every probe; defaults to one derived from the process id.
    pub fn identifier(mut self, identifier: u16) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn target_ip_address(mut self, ip_addr: IpAddr) -> Self {
        self.traceroute_base_builder.target_ip_address(ip_addr);
        self
    }

    pub fn max_ttl(mut self, max_ttl: u8) -> Self {
        self.traceroute_base_builder.max_ttl(max_ttl);
        self
    }

    pub fn max_wait_probe(mut self, max_wait_probe: Duration) -> Self {
        self.traceroute_base_builder.max_wait_probe(max_wait_probe);
        self
    }

    pub fn active_dns_lookup(mut self, active_dns_lookup: bool) -> Self {
        self.traceroute_base_builder.active_dns_lookup(active_dns_lookup);
        self
    }

    pub fn build(self) -> Result<Traceroute<RawSocketOpener>, TracerouteError> {
        self.build_with(RawSocketOpener::default())
    }

    pub fn build_with<O: ProbeSocketOpener>(self, socket_opener: O) -> Result<Traceroute<O>, TracerouteError> {
        self.traceroute_base_builder.build(ProbeProtocol::ICMP, self.identifier, socket_opener)
    }
}
