use async_stream::stream;
use futures::Stream;
use tracing::info;

use crate::traceroute::error::TracerouteError;
use crate::traceroute::probe::{HopProber, HopResult, ProbeSocketOpener};
use crate::traceroute::session::{SessionState, Termination, TraceSession};

pub mod async_socket;
pub mod builder;
pub mod error;
pub mod probe;
pub mod prompt;
pub mod session;
pub mod terminal;
pub mod utils;

#[derive(Debug)]
pub enum TraceEvent {
    Hop(HopResult),
    Done(Termination),
}

pub struct Traceroute<O> {
    session: TraceSession,
    hop_prober: HopProber<O>,
    is_active_dns_lookup: bool,
}

impl<O: ProbeSocketOpener> Traceroute<O> {
    pub fn new(session: TraceSession, hop_prober: HopProber<O>, is_active_dns_lookup: bool) -> Self {
        Self {
            session,
            hop_prober,
            is_active_dns_lookup,
        }
    }

    pub fn session(&self) -> &TraceSession {
        &self.session
    }

    pub fn is_active_dns_lookup(&self) -> bool {
        self.is_active_dns_lookup
    }

    /// Probes hop after hop, yielding every hop result and then exactly one
    /// final item: `Done(Reached)`, `Done(MaxHopExceeded)` or the error that
    /// aborted the session.
    pub fn trace(self) -> impl Stream<Item = Result<TraceEvent, TracerouteError>> {
        let Traceroute { mut session, hop_prober, .. } = self;

        stream! {
            info!(
                destination_address = %session.destination_address(),
                protocol = %session.protocol(),
                identifier = session.identifier(),
                max_ttl = session.max_ttl(),
                "trace started"
            );

            while let Some(hop) = session.current_hop() {
                match hop_prober.probe_hop(hop).await {
                    Ok(hop_result) => {
                        let session_state = session.record(&hop_result);
                        yield Ok(TraceEvent::Hop(hop_result));

                        if let SessionState::Done(termination) = session_state {
                            info!(%termination, "trace finished");
                            yield Ok(TraceEvent::Done(termination));
                        }
                    },
                    Err(error) => {
                        session.abort();
                        yield Err(error);
                    },
                }
            }
        }
    }
}
