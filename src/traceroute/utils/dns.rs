use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use std::str::FromStr;

use async_trait::async_trait;
use domain::base::name::Name;
use domain::resolv::StubResolver;
use tracing::debug;

use crate::traceroute::error::TracerouteError;

/// Resolves the trace destination: literal IPv4 addresses are used as-is,
/// names go through the stub resolver and then the system resolver.
pub async fn resolve_destination(hostname: &str) -> Result<Ipv4Addr, TracerouteError> {
    match IpAddr::from_str(hostname) {
        Ok(IpAddr::V4(ipv4_address)) => return Ok(ipv4_address),
        Ok(ip_addr @ IpAddr::V6(_)) => return Err(TracerouteError::Ipv6NotSupported(ip_addr)),
        Err(_) => (),
    }

    if let Some(ipv4_address) = dns_lookup_first_ipv4_addr(hostname).await {
        return Ok(ipv4_address);
    }

    nslookup(hostname).ok_or_else(|| TracerouteError::HostnameNotResolved(hostname.to_string()))
}

pub async fn dns_lookup_first_ipv4_addr(hostname: &str) -> Option<Ipv4Addr> {
    let qname = Name::<Vec<u8>>::from_str(hostname).ok()?;
    let resolver = StubResolver::new();
    let found_hosts = match resolver.lookup_host(qname).await {
        Ok(found_hosts) => found_hosts,
        Err(error) => {
            debug!(hostname, %error, "host lookup failed");
            return None;
        }
    };

    let ipv4_address = found_hosts.iter().find_map(first_ipv4);
    ipv4_address
}

/// System resolver lookup, which also honours the hosts file.
pub fn nslookup(hostname: &str) -> Option<Ipv4Addr> {
    let sock_addrs = match format!("{hostname}:0").to_socket_addrs() {
        Ok(sock_addrs) => sock_addrs,
        Err(error) => {
            debug!(hostname, %error, "system lookup failed");
            return None;
        }
    };

    sock_addrs
        .map(|sock_addr| sock_addr.ip())
        .find_map(first_ipv4)
}

fn first_ipv4(ip_addr: IpAddr) -> Option<Ipv4Addr> {
    match ip_addr {
        IpAddr::V4(ipv4_address) => Some(ipv4_address),
        IpAddr::V6(_) => None,
    }
}

#[async_trait(?Send)]
pub trait ReverseResolver {
    async fn reverse_lookup(&self, address: Ipv4Addr) -> Option<String>;
}

pub struct StubReverseResolver {
    resolver: StubResolver,
}

impl StubReverseResolver {
    pub fn new() -> Self {
        Self {
            resolver: StubResolver::new(),
        }
    }
}

#[async_trait(?Send)]
impl ReverseResolver for StubReverseResolver {
    async fn reverse_lookup(&self, address: Ipv4Addr) -> Option<String> {
        let found_addrs = match self.resolver.lookup_addr(IpAddr::V4(address)).await {
            Ok(found_addrs) => found_addrs,
            Err(error) => {
                debug!(%address, %error, "reverse lookup failed");
                return None;
            }
        };

        let hostname = found_addrs.iter().next()?.to_string();
        let hostname = hostname.trim_end_matches('.');
        if hostname.is_empty() {
            None
        } else {
            Some(hostname.to_string())
        }
    }
}
