use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

use pnet::packet::icmp::{Icmp, IcmpCode, IcmpPacket, IcmpType};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::udp::Udp;

use crate::traceroute::utils::bytes::ToBytes;

pub const ICMP_ECHO_REPLY: u8 = 0;
pub const ICMP_DESTINATION_UNREACHABLE: u8 = 3;
pub const ICMP_ECHO_REQUEST: u8 = 8;
pub const ICMP_TIME_EXCEEDED: u8 = 11;
pub const ICMP_PORT_UNREACHABLE_CODE: u8 = 3;

pub const ICMP_ECHO_SEQUENCE_NUMBER: u16 = 1;
pub const UDP_PROBE_SOURCE_PORT: u16 = 9;
pub const UDP_PROBE_DESTINATION_PORT: u16 = 33434;

/// Header plus an 8 byte timestamp, for both probe kinds.
pub const PROBE_PACKET_LENGTH: usize = 16;

const ICMP_ERROR_HEADER_LENGTH: usize = 8;

/// Internet checksum (RFC 1071), returned in on-wire order.
///
/// Words are summed low byte first, an odd trailing byte is added on its own,
/// the carry is folded back twice and the complement is byte-swapped so that
/// `to_be_bytes()` lays it out correctly in the packet.
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = data.chunks_exact(2);
    for word in &mut words {
        let value = word[0] as u32 + ((word[1] as u32) << 8);
        sum = sum.wrapping_add(value);
    }

    if let [last_byte] = words.remainder() {
        sum = sum.wrapping_add(*last_byte as u32);
    }

    sum = (sum >> 16) + (sum & 0xffff);
    sum += sum >> 16;

    let answer = !(sum as u16);
    answer.swap_bytes()
}

pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

pub fn build_icmpv4_echo_request(id: u16, sqn: u16, timestamp: f64) -> Icmp {
    let mut payload = Vec::with_capacity(PROBE_PACKET_LENGTH - 4);
    payload.extend_from_slice(id.to_be_bytes().as_ref());
    payload.extend_from_slice(sqn.to_be_bytes().as_ref());
    payload.extend_from_slice(timestamp.to_be_bytes().as_ref());

    let mut echo_request = Icmp {
        icmp_type: IcmpType(ICMP_ECHO_REQUEST),
        icmp_code: IcmpCode(0),
        checksum: 0,
        payload,
    };
    echo_request.checksum = internet_checksum(&echo_request.to_bytes());
    echo_request
}

pub fn build_udp_datagram_with_ports(source_port: u16, destination_port: u16, timestamp: f64) -> Udp {
    let payload = timestamp.to_be_bytes().to_vec();
    let mut udp_datagram = Udp {
        source: source_port,
        destination: destination_port,
        length: (8 + payload.len()) as u16,
        checksum: 0,
        payload,
    };
    udp_datagram.checksum = internet_checksum(&udp_datagram.to_bytes());
    udp_datagram
}

/// A received IPv4 datagram split into its source, protocol and payload.
pub struct Ipv4View<'a> {
    pub source: Ipv4Addr,
    pub protocol: IpNextHeaderProtocol,
    pub payload: &'a [u8],
}

/// Splits an IPv4 datagram using its header length only.
///
/// Quoted datagrams inside ICMP errors are truncated, so the total length
/// field cannot be trusted to bound the payload.
pub fn split_ipv4_datagram(data: &[u8]) -> Option<Ipv4View<'_>> {
    let ipv4_packet = Ipv4Packet::new(data)?;
    if ipv4_packet.get_version() != 4 {
        return None;
    }

    let header_length = ipv4_packet.get_header_length() as usize * 4;
    let payload = data.get(header_length..)?;
    Some(Ipv4View {
        source: ipv4_packet.get_source(),
        protocol: ipv4_packet.get_next_level_protocol(),
        payload,
    })
}

pub fn build_icmpv4_packet_from_bytes(data: &[u8]) -> Option<IcmpPacket<'_>> {
    IcmpPacket::new(data)
}

pub fn is_icmp_echo_reply(icmp_packet: &IcmpPacket) -> bool {
    let icmp_type = icmp_packet.get_icmp_type().0;
    let icmp_code = icmp_packet.get_icmp_code().0;
    icmp_type == ICMP_ECHO_REPLY && icmp_code == 0
}

/// Returns the original datagram quoted by an ICMP error message.
pub fn extract_quoted_datagram(icmp_bytes: &[u8]) -> Option<Ipv4View<'_>> {
    let quoted = icmp_bytes.get(ICMP_ERROR_HEADER_LENGTH..)?;
    split_ipv4_datagram(quoted)
}

pub fn is_icmp_protocol(protocol: IpNextHeaderProtocol) -> bool {
    protocol == IpNextHeaderProtocols::Icmp
}

pub fn is_udp_protocol(protocol: IpNextHeaderProtocol) -> bool {
    protocol == IpNextHeaderProtocols::Udp
}
