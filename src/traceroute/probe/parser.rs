use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::EchoRequestPacket;
use pnet::packet::udp::UdpPacket;

use crate::traceroute::probe::{ProbeReply, ReplyKind};
use crate::traceroute::utils::packet_utils;
use crate::traceroute::utils::packet_utils::{Ipv4View, ICMP_ECHO_REQUEST};

/// Turns a datagram read from the raw ICMP socket into a reply carrying the
/// identifier of the probe it answers. `None` for anything else.
pub trait ProbeReplyParser: Send + Sync {
    fn parse(&self, ipv4_datagram: &[u8]) -> Option<ProbeReply> {
        let ipv4_view = packet_utils::split_ipv4_datagram(ipv4_datagram)?;
        if !packet_utils::is_icmp_protocol(ipv4_view.protocol) {
            return None;
        }

        let icmp_packet = packet_utils::build_icmpv4_packet_from_bytes(ipv4_view.payload)?;
        let kind = ReplyKind::from_icmp(icmp_packet.get_icmp_type().0, icmp_packet.get_icmp_code().0)?;

        let identifier = match kind {
            ReplyKind::EchoReply => {
                if !packet_utils::is_icmp_echo_reply(&icmp_packet) {
                    return None;
                }
                self.echo_reply_identifier(ipv4_view.payload)?
            },
            ReplyKind::TimeExceeded | ReplyKind::DestinationUnreachable { .. } => {
                let quoted_datagram = packet_utils::extract_quoted_datagram(ipv4_view.payload)?;
                self.quoted_identifier(&quoted_datagram)?
            },
        };

        Some(ProbeReply {
            kind,
            identifier,
            from_address: ipv4_view.source,
        })
    }

    fn echo_reply_identifier(&self, icmp_bytes: &[u8]) -> Option<u16>;

    fn quoted_identifier(&self, quoted_datagram: &Ipv4View) -> Option<u16>;
}

pub struct IcmpProbeReplyParser;

impl ProbeReplyParser for IcmpProbeReplyParser {
    fn echo_reply_identifier(&self, icmp_bytes: &[u8]) -> Option<u16> {
        let echo_reply_packet = EchoReplyPacket::new(icmp_bytes)?;
        Some(echo_reply_packet.get_identifier())
    }

    fn quoted_identifier(&self, quoted_datagram: &Ipv4View) -> Option<u16> {
        if !packet_utils::is_icmp_protocol(quoted_datagram.protocol) {
            return None;
        }

        let echo_request_packet = EchoRequestPacket::new(quoted_datagram.payload)?;
        if echo_request_packet.get_icmp_type().0 != ICMP_ECHO_REQUEST {
            return None;
        }

        Some(echo_request_packet.get_identifier())
    }
}

/// UDP probes are matched on the source port of the quoted UDP header.
pub struct UdpProbeReplyParser;

impl ProbeReplyParser for UdpProbeReplyParser {
    fn echo_reply_identifier(&self, _icmp_bytes: &[u8]) -> Option<u16> {
        None
    }

    fn quoted_identifier(&self, quoted_datagram: &Ipv4View) -> Option<u16> {
        if !packet_utils::is_udp_protocol(quoted_datagram.protocol) {
            return None;
        }

        let udp_header = UdpPacket::new(quoted_datagram.payload)?;
        Some(udp_header.get_source())
    }
}
