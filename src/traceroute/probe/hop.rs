use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

use tracing::debug;

use crate::traceroute::error::TracerouteError;
use crate::traceroute::probe::{ProbeExecutor, ProbeOutcome, ProbeSocketOpener};

pub const PROBES_PER_HOP: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HopResult {
    hop: u8,
    outcomes: Vec<ProbeOutcome>,
    losses: usize,
    from_address: Option<Ipv4Addr>,
    destination_reached: bool,
}

impl HopResult {
    pub fn new(hop: u8) -> Self {
        Self {
            hop,
            outcomes: Vec::with_capacity(PROBES_PER_HOP),
            losses: 0,
            from_address: None,
            destination_reached: false,
        }
    }

    pub fn add_outcome(&mut self, outcome: ProbeOutcome) {
        if outcome.is_loss() {
            self.losses += 1;
        }

        if self.from_address.is_none() {
            self.from_address = outcome.from_address();
        }

        if outcome.is_destination_reached() {
            self.destination_reached = true;
        }

        self.outcomes.push(outcome);
    }

    pub fn hop(&self) -> u8 {
        self.hop
    }

    pub fn outcomes(&self) -> &[ProbeOutcome] {
        &self.outcomes
    }

    pub fn losses(&self) -> usize {
        self.losses
    }

    /// First address that answered at this hop.
    pub fn from_address(&self) -> Option<Ipv4Addr> {
        self.from_address
    }

    pub fn is_destination_reached(&self) -> bool {
        self.destination_reached
    }

    pub fn is_timed_out(&self) -> bool {
        !self.outcomes.is_empty() && self.losses == self.outcomes.len()
    }
}

/// Renders the hop number followed by one token per probe.
impl Display for HopResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hop)?;
        for outcome in &self.outcomes {
            write!(f, " {outcome}")?;
        }
        Ok(())
    }
}

pub struct HopProber<O> {
    probe_executor: ProbeExecutor<O>,
}

impl<O: ProbeSocketOpener> HopProber<O> {
    pub fn new(probe_executor: ProbeExecutor<O>) -> Self {
        Self { probe_executor }
    }

    /// Probes are strictly sequential and all of them run, whatever the earlier ones returned.
    pub async fn probe_hop(&self, hop: u8) -> Result<HopResult, TracerouteError> {
        let mut hop_result = HopResult::new(hop);

        for _ in 0..PROBES_PER_HOP {
            let outcome = self.probe_executor.execute(hop).await?;
            hop_result.add_outcome(outcome);
        }

        debug!(
            hop,
            losses = hop_result.losses(),
            from_address = ?hop_result.from_address(),
            destination_reached = hop_result.is_destination_reached(),
            "hop probed"
        );

        Ok(hop_result)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::traceroute::probe::ReplyKind;

    fn reply(from_address: Ipv4Addr, millis: u64, kind: ReplyKind) -> ProbeOutcome {
        ProbeOutcome::Reply {
            delay: Duration::from_millis(millis),
            from_address,
            kind,
        }
    }

    #[test]
    fn first_responder_wins() {
        let first = Ipv4Addr::new(10, 0, 0, 1);
        let second = Ipv4Addr::new(10, 0, 0, 2);

        let mut hop_result = HopResult::new(3);
        hop_result.add_outcome(ProbeOutcome::Timeout);
        hop_result.add_outcome(reply(first, 5, ReplyKind::TimeExceeded));
        hop_result.add_outcome(reply(second, 7, ReplyKind::TimeExceeded));

        assert_eq!(hop_result.from_address(), Some(first));
        assert_eq!(hop_result.losses(), 1);
        assert!(!hop_result.is_timed_out());
        assert!(!hop_result.is_destination_reached());
        assert_eq!(hop_result.to_string(), "3 * 5 ms 7 ms");
    }

    #[test]
    fn any_final_reply_marks_destination() {
        let target = Ipv4Addr::new(127, 0, 0, 1);

        let mut hop_result = HopResult::new(1);
        hop_result.add_outcome(ProbeOutcome::NoResponse);
        hop_result.add_outcome(ProbeOutcome::Timeout);
        hop_result.add_outcome(reply(target, 0, ReplyKind::EchoReply));

        assert!(hop_result.is_destination_reached());
        assert_eq!(hop_result.losses(), 2);
    }

    #[test]
    fn all_losses_is_a_timed_out_hop() {
        let mut hop_result = HopResult::new(9);
        for _ in 0..PROBES_PER_HOP {
            hop_result.add_outcome(ProbeOutcome::Timeout);
        }

        assert!(hop_result.is_timed_out());
        assert_eq!(hop_result.from_address(), None);
        assert_eq!(hop_result.to_string(), "9 * * *");
    }
}
