//! Sniffer bridge line decoding
//!
//! The sniffer firmware prints one captured frame per line over the serial
//! link, after reassembling and decompressing it into a plain IPv6 packet:
//!
//! ```text
//! <hex frame> [<rssi dBm> [<lqi>]]
//! ```
//!
//! Only the fixed IPv6 header is inspected here, to pull out the sender and
//! receiver addresses the registry groups by. The rest of the frame stays an
//! opaque payload. A multicast destination means the packet has no single
//! receiving node, so the receiver is reported as absent.

use crate::core::packet::Packet;
use bytes::Bytes;
use std::net::Ipv6Addr;
use thiserror::Error;

/// Minimum frame size: one fixed IPv6 header.
const IPV6_HEADER_LEN: usize = 40;

const SRC_OFFSET: usize = 8;
const DST_OFFSET: usize = 24;
const NEXT_HEADER_OFFSET: usize = 6;

/// Line decoding errors
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The line was empty or all whitespace
    #[error("empty line")]
    Empty,

    /// The frame token was not valid hex
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The frame is too short to hold an IPv6 header
    #[error("frame too short for an IPv6 header: {len} bytes")]
    Truncated {
        /// Decoded frame length
        len: usize,
    },

    /// The version nibble was not 6
    #[error("not an IPv6 frame (version {version})")]
    NotIpv6 {
        /// Value of the version nibble
        version: u8,
    },
}

/// Decode one line of sniffer bridge output into a packet record.
///
/// # Errors
///
/// Fails when the line is empty, the hex does not decode, the frame is
/// shorter than an IPv6 header, or the version nibble is not 6. Callers are
/// expected to skip bad lines and keep capturing; a sniffer that resyncs
/// mid-frame produces garbage lines routinely.
pub fn decode_line(line: &str) -> Result<Packet, DecodeError> {
    let mut tokens = line.split_whitespace();
    let frame_hex = tokens.next().ok_or(DecodeError::Empty)?;
    let frame = hex::decode(frame_hex)?;

    if frame.len() < IPV6_HEADER_LEN {
        return Err(DecodeError::Truncated { len: frame.len() });
    }

    let version = frame[0] >> 4;
    if version != 6 {
        return Err(DecodeError::NotIpv6 { version });
    }

    let source = addr_at(&frame, SRC_OFFSET);
    let destination = addr_at(&frame, DST_OFFSET);
    let next_header = frame[NEXT_HEADER_OFFSET];

    let receiver = if destination.is_multicast() {
        None
    } else {
        Some(destination.to_string())
    };

    let mut packet = Packet::new(source.to_string(), receiver, Bytes::from(frame));

    if let Some(proto) = protocol_name(next_header) {
        packet = packet.with_protocol(proto);
    }

    // Trailing tokens carry link metadata when the bridge reports it.
    // Anything unparseable is ignored rather than failing the frame.
    if let Some(rssi) = tokens.next().and_then(|t| t.parse::<i8>().ok()) {
        packet = packet.with_rssi(rssi);
    }
    if let Some(lqi) = tokens.next().and_then(|t| t.parse::<u8>().ok()) {
        packet = packet.with_lqi(lqi);
    }

    Ok(packet)
}

fn addr_at(frame: &[u8], offset: usize) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&frame[offset..offset + 16]);
    Ipv6Addr::from(octets)
}

fn protocol_name(next_header: u8) -> Option<&'static str> {
    match next_header {
        6 => Some("TCP"),
        17 => Some("UDP"),
        58 => Some("ICMPv6"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_frame(src: [u8; 16], dst: [u8; 16], next_header: u8) -> Vec<u8> {
        let mut frame = vec![0u8; IPV6_HEADER_LEN + 8];
        frame[0] = 0x60;
        frame[4..6].copy_from_slice(&8u16.to_be_bytes());
        frame[NEXT_HEADER_OFFSET] = next_header;
        frame[7] = 64;
        frame[SRC_OFFSET..SRC_OFFSET + 16].copy_from_slice(&src);
        frame[DST_OFFSET..DST_OFFSET + 16].copy_from_slice(&dst);
        frame
    }

    fn node_addr(tail: u16) -> [u8; 16] {
        let mut addr = [0u8; 16];
        addr[0] = 0x20;
        addr[1] = 0x01;
        addr[2] = 0x0d;
        addr[3] = 0xb8;
        addr[14..16].copy_from_slice(&tail.to_be_bytes());
        addr
    }

    #[test]
    fn test_decode_unicast_frame() {
        let frame = build_frame(node_addr(0xabcd), node_addr(0xbeef), 17);
        let packet = decode_line(&hex::encode(&frame)).unwrap();

        assert_eq!(packet.sender, "2001:db8::abcd");
        assert_eq!(packet.receiver.as_deref(), Some("2001:db8::beef"));
        assert_eq!(packet.metadata.protocol.as_deref(), Some("UDP"));
        assert_eq!(packet.payload.as_ref(), frame.as_slice());
    }

    #[test]
    fn test_decode_multicast_has_no_receiver() {
        let mut dst = [0u8; 16];
        dst[0] = 0xff;
        dst[1] = 0x02;
        dst[15] = 0x1a;
        let frame = build_frame(node_addr(0x0001), dst, 58);
        let packet = decode_line(&hex::encode(frame)).unwrap();

        assert_eq!(packet.receiver, None);
        assert_eq!(packet.metadata.protocol.as_deref(), Some("ICMPv6"));
    }

    #[test]
    fn test_decode_link_metadata() {
        let frame = build_frame(node_addr(1), node_addr(2), 17);
        let line = format!("{} -70 42", hex::encode(frame));
        let packet = decode_line(&line).unwrap();

        assert_eq!(packet.metadata.rssi, Some(-70));
        assert_eq!(packet.metadata.lqi, Some(42));
    }

    #[test]
    fn test_decode_ignores_unparseable_metadata() {
        let frame = build_frame(node_addr(1), node_addr(2), 17);
        let line = format!("{} garbage", hex::encode(frame));
        let packet = decode_line(&line).unwrap();
        assert_eq!(packet.metadata.rssi, None);
    }

    #[test]
    fn test_decode_rejects_empty_line() {
        assert!(matches!(decode_line("   "), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_rejects_bad_hex() {
        assert!(matches!(decode_line("zz00"), Err(DecodeError::Hex(_))));
    }

    #[test]
    fn test_decode_rejects_truncated_frame() {
        assert!(matches!(
            decode_line("600000000008"),
            Err(DecodeError::Truncated { len: 6 })
        ));
    }

    #[test]
    fn test_decode_rejects_non_ipv6() {
        let mut frame = build_frame(node_addr(1), node_addr(2), 17);
        frame[0] = 0x45;
        assert!(matches!(
            decode_line(&hex::encode(frame)),
            Err(DecodeError::NotIpv6 { version: 4 })
        ));
    }

    #[test]
    fn test_unknown_next_header_has_no_protocol_hint() {
        let frame = build_frame(node_addr(1), node_addr(2), 200);
        let packet = decode_line(&hex::encode(frame)).unwrap();
        assert_eq!(packet.metadata.protocol, None);
    }
}
