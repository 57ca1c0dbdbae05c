use std::io;
use std::io::Write;
use std::net::Ipv4Addr;

use futures::{pin_mut, StreamExt};

use crate::traceroute::error::TracerouteError;
use crate::traceroute::probe::{HopResult, ProbeSocketOpener};
use crate::traceroute::session::Termination;
use crate::traceroute::utils::dns::ReverseResolver;
use crate::traceroute::{TraceEvent, Traceroute};

const TIMED_OUT_HOP: &str = "time out";

/// Prints a trace as `<hop> <rtt1> <rtt2> <rtt3> <responder>` lines.
pub struct TracerouteTerminal<O, R> {
    traceroute: Traceroute<O>,
    reverse_resolver: R,
}

impl<O: ProbeSocketOpener, R: ReverseResolver> TracerouteTerminal<O, R> {
    pub fn new(traceroute: Traceroute<O>, reverse_resolver: R) -> Self {
        Self {
            traceroute,
            reverse_resolver,
        }
    }

    pub async fn print_trace(self) -> Result<Termination, TracerouteError> {
        let mut stdout = io::stdout();
        self.write_trace(&mut stdout).await
    }

    pub async fn write_trace<W: Write>(self, out: &mut W) -> Result<Termination, TracerouteError> {
        let is_active_dns_lookup = self.traceroute.is_active_dns_lookup();
        let reverse_resolver = self.reverse_resolver;
        let trace = self.traceroute.trace();
        pin_mut!(trace);

        let mut termination = Termination::Aborted;
        while let Some(trace_event) = trace.next().await {
            match trace_event? {
                TraceEvent::Hop(hop_result) => {
                    let responder = match hop_result.from_address() {
                        Some(address) if is_active_dns_lookup => {
                            Self::display_name(&reverse_resolver, address).await
                        },
                        Some(address) => address.to_string(),
                        None => TIMED_OUT_HOP.to_string(),
                    };
                    Self::write_hop(out, &hop_result, &responder)?;
                },
                TraceEvent::Done(Termination::MaxHopExceeded) => {
                    termination = Termination::MaxHopExceeded;
                    writeln!(out, "{}", Termination::MaxHopExceeded).map_err(TracerouteError::Output)?;
                },
                TraceEvent::Done(done) => termination = done,
            }
        }

        out.flush().map_err(TracerouteError::Output)?;
        Ok(termination)
    }

    async fn display_name(reverse_resolver: &R, address: Ipv4Addr) -> String {
        match reverse_resolver.reverse_lookup(address).await {
            Some(hostname) => format!("{hostname} [{address}]"),
            None => address.to_string(),
        }
    }

    fn write_hop<W: Write>(out: &mut W, hop_result: &HopResult, responder: &str) -> Result<(), TracerouteError> {
        writeln!(out, "{hop_result} {responder}").map_err(TracerouteError::Output)
    }
}
