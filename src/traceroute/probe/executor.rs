use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::traceroute::error::TracerouteError;
use crate::traceroute::probe::{Probe, ProbeOutcome, ProbeProtocol, ProbeSocket, ProbeSocketOpener};

/// Sends one probe and waits for the reply that belongs to it.
///
/// Unrelated packets read while waiting are dropped and the wait resumes with
/// whatever is left of the original budget, so noise on the wire can never
/// stretch a probe beyond `max_wait_probe`.
pub struct ProbeExecutor<O> {
    socket_opener: O,
    protocol: ProbeProtocol,
    destination_address: Ipv4Addr,
    identifier: u16,
    max_wait_probe: Duration,
}

impl<O: ProbeSocketOpener> ProbeExecutor<O> {
    const BUFFER_SIZE: usize = 1024;

    pub fn new(
        socket_opener: O,
        protocol: ProbeProtocol,
        destination_address: Ipv4Addr,
        identifier: u16,
        max_wait_probe: Duration,
    ) -> Self {
        Self {
            socket_opener,
            protocol,
            destination_address,
            identifier,
            max_wait_probe,
        }
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub async fn execute(&self, ttl: u8) -> Result<ProbeOutcome, TracerouteError> {
        let mut socket = self.socket_opener.open(self.protocol, ttl)?;

        let probe = Probe::new(self.protocol, self.destination_address, ttl, self.identifier);
        socket
            .send_to(&probe.to_bytes(), self.destination_address)
            .await
            .map_err(|source| TracerouteError::Send { ttl, source })?;
        debug!(ttl, identifier = self.identifier, protocol = %self.protocol, "probe sent");

        self.wait_reply(&mut socket, &probe).await
    }

    async fn wait_reply(&self, socket: &mut O::Socket, probe: &Probe) -> Result<ProbeOutcome, TracerouteError> {
        let reply_parser = self.protocol.reply_parser();
        let mut buffer = [0u8; Self::BUFFER_SIZE];
        let mut time_left = self.max_wait_probe;

        loop {
            let wait_started_at = Instant::now();
            let received = socket
                .recv_within(&mut buffer, time_left)
                .await
                .map_err(TracerouteError::Receive)?;
            time_left = time_left.saturating_sub(wait_started_at.elapsed());

            if time_left.is_zero() {
                debug!(ttl = probe.ttl(), "probe timed out");
                return Ok(ProbeOutcome::Timeout);
            }

            let Some(length) = received else {
                debug!(ttl = probe.ttl(), "no response");
                return Ok(ProbeOutcome::NoResponse);
            };

            let Some(probe_reply) = reply_parser.parse(&buffer[..length]) else {
                trace!(ttl = probe.ttl(), length, "ignored datagram that is not a probe reply");
                continue;
            };

            let reply_identifier = probe_reply.identifier;
            match probe.complete(probe_reply) {
                Some(outcome) => return Ok(outcome),
                None => trace!(
                    expected = probe.identifier(),
                    actual = reply_identifier,
                    "ignored reply with different identifier"
                ),
            }
        }
    }
}
