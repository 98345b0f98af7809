use crate::cursor::{self, DissectError};
use crate::protocols::ip::{self, IpProtocol};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;

// IPv6 Protocol
// RFC 8200: https://datatracker.ietf.org/doc/html/rfc8200
//
// Extension-header chains are not walked: next_header is taken at face
// value, so a packet carrying hop-by-hop/routing headers reports those
// instead of the real transport. Known limitation, kept intentionally.

pub const HEADER_LENGTH: usize = 40;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], IPv6> {
    // Version (4 bits), Traffic Class (8 bits), Flow Label (20 bits)
    let (rest, first_word) = cursor::be_u32(bytes)?;
    let version = (first_word >> 28) as u8;
    if version != 6 {
        return Err(DissectError::MalformedHeader.to_nom(bytes));
    }
    let traffic_class = ((first_word >> 20) & 0xFF) as u8;
    let flow_label = first_word & 0x000F_FFFF;

    let (rest, payload_length) = cursor::be_u16(rest)?;
    let (rest, next_header) = ip::protocol(rest)?;
    let (rest, hop_limit) = cursor::be_u8(rest)?;

    let (rest, address_source) = ip::v6_address(rest)?;
    let (rest, address_destination) = ip::v6_address(rest)?;

    // Cut trailer padding past the declared length; tolerate truncation.
    let available = (payload_length as usize).min(cursor::remaining(rest));
    let (_, payload) = cursor::bytes(rest, available)?;

    let protocol = IPv6 {
        version,
        traffic_class,
        flow_label,
        payload_length,
        next_header,
        hop_limit,
        address_source,
        address_destination,
    };

    Ok((payload, protocol))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IPv6 {
    pub version: u8,
    pub traffic_class: u8,
    pub flow_label: u32,
    pub payload_length: u16,
    pub next_header: IpProtocol,
    pub hop_limit: u8,
    pub address_source: Ipv6Addr,
    pub address_destination: Ipv6Addr,
}
