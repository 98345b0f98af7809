use crate::cursor::{self, DissectError};
use crate::protocols::ip::{self, IpProtocol};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

// IPv4 Protocol
// RFC 791: https://datatracker.ietf.org/doc/html/rfc791

pub const HEADER_MIN_LENGTH: usize = 20;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], IPv4> {
    let frame_length = cursor::remaining(bytes);

    // Version (4 bits), IHL in 4-byte words (4 bits)
    let (rest, version_ihl) = cursor::be_u8(bytes)?;
    let version = version_ihl >> 4;
    let header_length = ((version_ihl & 0x0F) as usize) * 4;

    if version != 4 || header_length < HEADER_MIN_LENGTH {
        return Err(DissectError::MalformedHeader.to_nom(bytes));
    }
    // Declared header does not fit the captured bytes
    if header_length > frame_length {
        return Err(DissectError::MalformedHeader.to_nom(bytes));
    }

    // DSCP (6 bits), ECN (2 bits)
    let (rest, dscp_ecn) = cursor::be_u8(rest)?;

    let (rest, total_length) = cursor::be_u16(rest)?;
    let (rest, identification) = cursor::be_u16(rest)?;

    // Flags (3 bits), Fragment Offset (13 bits)
    let (rest, flags_fragment) = cursor::be_u16(rest)?;

    let (rest, time_to_live) = cursor::be_u8(rest)?;
    let (rest, protocol) = ip::protocol(rest)?;
    let (rest, checksum) = cursor::be_u16(rest)?;

    let (rest, address_source) = ip::v4_address(rest)?;
    let (rest, address_destination) = ip::v4_address(rest)?;

    // Options are skipped, not decoded
    let rest = cursor::skip(rest, header_length - HEADER_MIN_LENGTH);

    // Payload runs to the declared total length. An ethernet trailer past it
    // is cut; a capture shorter than declared is tolerated and the shorter
    // slice wins, so payload offset + payload length never exceeds the frame.
    let payload_length = (total_length as usize)
        .saturating_sub(header_length)
        .min(cursor::remaining(rest));
    let (_, payload) = cursor::bytes(rest, payload_length)?;

    let protocol = IPv4 {
        version,
        header_length: header_length as u16,
        dscp: dscp_ecn >> 2,
        ecn: dscp_ecn & 0b0000_0011,
        total_length,
        identification,
        flags: (flags_fragment >> 13) as u8,
        fragment_offset: flags_fragment & 0x1FFF,
        time_to_live,
        protocol,
        checksum,
        address_source,
        address_destination,
        payload_length: payload_length as u16,
    };

    Ok((payload, protocol))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IPv4 {
    pub version: u8,
    /// Header length in bytes, IHL x 4.
    pub header_length: u16,
    pub dscp: u8,
    pub ecn: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags: u8,
    pub fragment_offset: u16,
    pub time_to_live: u8,
    pub protocol: IpProtocol,
    pub checksum: u16,
    pub address_source: Ipv4Addr,
    pub address_destination: Ipv4Addr,
    /// Bytes actually available after the header, clipped to the frame.
    pub payload_length: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ipv4_udp_header() {
        let hex_actual = "45 00 00 44 D2 6E 00 00 80 11 00 00 C0 A8 00 67 C0 A8 00 01 E5 13 00 35 00 30 81 FA"
            .replace(" ", "");
        let packet = hex::decode(hex_actual).unwrap();

        let (payload, ipv4) = parse(&packet).unwrap();

        let expected = IPv4 {
            version: 4,
            header_length: 20,
            dscp: 0,
            ecn: 0,
            total_length: 68,
            identification: 0xD26E,
            flags: 0,
            fragment_offset: 0,
            time_to_live: 128,
            protocol: IpProtocol::Udp,
            checksum: 0x0000,
            address_source: Ipv4Addr::from_str("192.168.0.103").unwrap(),
            address_destination: Ipv4Addr::from_str("192.168.0.1").unwrap(),
            payload_length: 8,
        };

        assert_eq!(ipv4, expected);
        // Declared 48 bytes of payload, only 8 captured: clipped.
        assert_eq!(payload.len(), 8);
    }

    #[test]
    fn test_ipv4_trailer_padding_cut() {
        // total_length 28 (20 header + 8 payload), frame carries 4 extra
        // bytes of ethernet padding
        let hex_actual = "45 00 00 1C 00 01 00 00 40 11 00 00 0A 00 00 01 0A 00 00 02 11 22 33 44 55 66 77 88 00 00 00 00"
            .replace(" ", "");
        let packet = hex::decode(hex_actual).unwrap();

        let (payload, ipv4) = parse(&packet).unwrap();

        assert_eq!(ipv4.payload_length, 8);
        assert_eq!(payload, &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
    }

    #[test]
    fn test_ipv4_header_length_overruns_frame() {
        // IHL declares 24 bytes, only 20 captured
        let hex_actual = "46 00 00 1C 00 01 00 00 40 11 00 00 0A 00 00 01 0A 00 00 02"
            .replace(" ", "");
        let packet = hex::decode(hex_actual).unwrap();

        assert!(parse(&packet).is_err());
    }

    #[test]
    fn test_ipv4_wrong_version() {
        let packet = [0x65u8; 20];

        assert!(parse(&packet).is_err());
    }

    #[test]
    fn test_ipv4_fragment_fields() {
        // flags = 0b001 (more fragments), offset = 185
        let hex_actual = "45 00 00 14 00 01 20 B9 40 11 00 00 0A 00 00 01 0A 00 00 02"
            .replace(" ", "");
        let packet = hex::decode(hex_actual).unwrap();

        let (_, ipv4) = parse(&packet).unwrap();

        assert_eq!(ipv4.flags, 1);
        assert_eq!(ipv4.fragment_offset, 185);
    }
}
