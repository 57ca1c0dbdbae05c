pub use traceroute::builder::TracerouteBuilder;
pub use traceroute::error::TracerouteError;
pub use traceroute::probe::{
    HopProber, HopResult, Probe, ProbeExecutor, ProbeOutcome, ProbeProtocol, ProbeReply, ProbeSocket,
    ProbeSocketOpener, RawProbeSocket, RawSocketOpener, ReplyKind, PROBES_PER_HOP,
};
pub use traceroute::prompt;
pub use traceroute::session::{SessionState, Termination, TraceSession};
pub use traceroute::terminal::TracerouteTerminal;
pub use traceroute::utils;
pub use traceroute::utils::dns::{resolve_destination, ReverseResolver, StubReverseResolver};
pub use traceroute::{TraceEvent, Traceroute};

pub mod traceroute;
