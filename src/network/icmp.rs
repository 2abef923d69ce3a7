//! ICMP echo packet construction and reply parsing

use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{IcmpCode, IcmpPacket, IcmpTypes};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::Packet;
use std::net::Ipv4Addr;

/// ICMP header (8) plus a timestamp payload
pub const ECHO_REQUEST_LEN: usize = 16;

/// Parsed echo reply fields needed to match a reply to its request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    pub source: Ipv4Addr,
    pub identifier: u16,
    pub sequence: u16,
}

/// Build an ICMP echo request with the given identifier and sequence number
pub fn build_echo_request(identifier: u16, sequence: u16) -> Vec<u8> {
    let mut buffer = vec![0u8; ECHO_REQUEST_LEN];

    {
        // Buffer is sized above the minimum echo request length
        let mut packet = match MutableEchoRequestPacket::new(&mut buffer) {
            Some(packet) => packet,
            None => return buffer,
        };
        packet.set_icmp_type(IcmpTypes::EchoRequest);
        packet.set_icmp_code(IcmpCode(0));
        packet.set_identifier(identifier);
        packet.set_sequence_number(sequence);

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        packet.set_payload(&timestamp.to_be_bytes());
    }

    let checksum = internet_checksum(&buffer);
    buffer[2..4].copy_from_slice(&checksum.to_be_bytes());
    buffer
}

/// Parse a datagram read from a raw ICMPv4 socket (IPv4 header included).
///
/// Returns `None` for anything that is not an echo reply.
pub fn parse_echo_reply(datagram: &[u8]) -> Option<EchoReply> {
    let ip_packet = Ipv4Packet::new(datagram)?;
    if ip_packet.get_next_level_protocol() != IpNextHeaderProtocols::Icmp {
        return None;
    }

    let header_len = ip_packet.get_header_length() as usize * 4;
    let icmp_bytes = datagram.get(header_len..)?;

    let icmp = IcmpPacket::new(icmp_bytes)?;
    if icmp.get_icmp_type() != IcmpTypes::EchoReply {
        return None;
    }

    let reply = EchoReplyPacket::new(icmp.packet())?;
    Some(EchoReply {
        source: ip_packet.get_source(),
        identifier: reply.get_identifier(),
        sequence: reply.get_sequence_number(),
    })
}

/// RFC 1071 one's complement checksum
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum = 0u32;

    for chunk in data.chunks(2) {
        if chunk.len() == 2 {
            sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
        } else {
            sum += (chunk[0] as u32) << 8;
        }
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !sum as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_in_ipv4(source: Ipv4Addr, icmp: &[u8]) -> Vec<u8> {
        let mut datagram = vec![0u8; 20];
        datagram[0] = 0x45; // version 4, IHL 5
        let total_len = (20 + icmp.len()) as u16;
        datagram[2..4].copy_from_slice(&total_len.to_be_bytes());
        datagram[8] = 64; // TTL
        datagram[9] = 1; // ICMP
        datagram[12..16].copy_from_slice(&source.octets());
        datagram[16..20].copy_from_slice(&[10, 0, 0, 99]);
        datagram.extend_from_slice(icmp);
        datagram
    }

    #[test]
    fn test_echo_request_layout() {
        let packet = build_echo_request(0xBEEF, 7);
        assert_eq!(packet.len(), ECHO_REQUEST_LEN);
        assert_eq!(packet[0], 8, "type must be echo request");
        assert_eq!(packet[1], 0);
        assert_eq!(&packet[4..6], &0xBEEFu16.to_be_bytes());
        assert_eq!(&packet[6..8], &7u16.to_be_bytes());
        // A correct checksum folds the whole packet to zero
        assert_eq!(internet_checksum(&packet), 0);
    }

    #[test]
    fn test_parse_echo_reply() {
        let mut icmp = build_echo_request(42, 3);
        icmp[0] = 0; // echo reply
        let source = Ipv4Addr::new(192, 168, 50, 1);
        let datagram = wrap_in_ipv4(source, &icmp);

        let reply = parse_echo_reply(&datagram).unwrap();
        assert_eq!(reply.source, source);
        assert_eq!(reply.identifier, 42);
        assert_eq!(reply.sequence, 3);
    }

    #[test]
    fn test_parse_ignores_other_icmp() {
        // Our own echo request looped back must not count as a reply
        let icmp = build_echo_request(42, 3);
        let datagram = wrap_in_ipv4(Ipv4Addr::new(10, 0, 0, 1), &icmp);
        assert!(parse_echo_reply(&datagram).is_none());

        assert!(parse_echo_reply(&[0x45, 0, 0]).is_none());
    }

    #[test]
    fn test_checksum_odd_length() {
        assert_eq!(internet_checksum(&[0xFF]), !0xFF00u16);
        assert_eq!(internet_checksum(&[]), 0xFFFF);
    }
}
