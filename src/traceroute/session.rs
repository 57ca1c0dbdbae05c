use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::traceroute::probe::{HopResult, ProbeProtocol};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Reached,
    MaxHopExceeded,
    Aborted,
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Reached => write!(f, "destination reached"),
            Termination::MaxHopExceeded => write!(f, "exceed max_hop"),
            Termination::Aborted => write!(f, "aborted"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Probing(u8),
    Done(Termination),
}

/// Run state of one trace: the hop under probe and, once over, why it ended.
///
/// The hop only ever moves forward by one and the termination is set at most
/// once; later calls to [`TraceSession::record`] or [`TraceSession::abort`]
/// leave it untouched.
#[derive(Clone, Debug)]
pub struct TraceSession {
    destination_address: Ipv4Addr,
    protocol: ProbeProtocol,
    max_wait_probe: Duration,
    identifier: u16,
    max_ttl: u8,
    current_hop: u8,
    termination: Option<Termination>,
}

impl TraceSession {
    pub fn new(
        destination_address: Ipv4Addr,
        protocol: ProbeProtocol,
        max_wait_probe: Duration,
        identifier: u16,
        max_ttl: u8,
    ) -> Self {
        Self {
            destination_address,
            protocol,
            max_wait_probe,
            identifier,
            max_ttl,
            current_hop: 1,
            termination: None,
        }
    }

    pub fn destination_address(&self) -> Ipv4Addr {
        self.destination_address
    }

    pub fn protocol(&self) -> ProbeProtocol {
        self.protocol
    }

    pub fn max_wait_probe(&self) -> Duration {
        self.max_wait_probe
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn max_ttl(&self) -> u8 {
        self.max_ttl
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn state(&self) -> SessionState {
        match self.termination {
            Some(termination) => SessionState::Done(termination),
            None => SessionState::Probing(self.current_hop),
        }
    }

    pub fn current_hop(&self) -> Option<u8> {
        match self.state() {
            SessionState::Probing(hop) => Some(hop),
            SessionState::Done(_) => None,
        }
    }

    pub fn record(&mut self, hop_result: &HopResult) -> SessionState {
        if self.termination.is_some() {
            return self.state();
        }

        if hop_result.is_destination_reached() || hop_result.from_address() == Some(self.destination_address) {
            return self.terminate(Termination::Reached);
        }

        if self.current_hop >= self.max_ttl {
            return self.terminate(Termination::MaxHopExceeded);
        }

        self.current_hop += 1;
        self.state()
    }

    pub fn abort(&mut self) -> SessionState {
        if self.termination.is_none() {
            self.terminate(Termination::Aborted)
        } else {
            self.state()
        }
    }

    fn terminate(&mut self, termination: Termination) -> SessionState {
        self.termination = Some(termination);
        self.state()
    }
}
