use crate::cursor::{self, DissectError};
use nom::IResult;
use num_enum::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use strum_macros::Display;

pub const V4_LENGTH_BYTES: usize = 4;
pub const V6_LENGTH_BYTES: usize = 16;

/// Next-protocol identifiers shared by the IPv4 `protocol` field and the
/// IPv6 `next_header` field. Unknown values are preserved verbatim; only
/// TCP and UDP drive the transport dispatch.
#[derive(
    Clone, Copy, Debug, Display, Serialize, Deserialize, PartialEq, Eq, FromPrimitive,
)]
#[repr(u8)]
pub enum IpProtocol {
    #[strum(serialize = "ICMP")]
    Icmp = 1,

    #[strum(serialize = "IGMP")]
    Igmp = 2,

    #[strum(serialize = "TCP")]
    Tcp = 6,

    #[strum(serialize = "UDP")]
    Udp = 17,

    #[strum(serialize = "ICMPv6")]
    Icmpv6 = 58,

    #[strum(serialize = "UNKNOWN")]
    #[num_enum(catch_all)]
    Other(u8),
}

pub fn protocol(input: &[u8]) -> IResult<&[u8], IpProtocol> {
    let (input, value) = cursor::be_u8(input)?;

    Ok((input, IpProtocol::from(value)))
}

pub fn v4_address(input: &[u8]) -> IResult<&[u8], Ipv4Addr> {
    let (input, address) = cursor::bytes(input, V4_LENGTH_BYTES)?;

    let address = Ipv4Addr::from(
        <[u8; V4_LENGTH_BYTES]>::try_from(address)
            .map_err(|_| DissectError::MalformedHeader.to_nom(input))?,
    );

    Ok((input, address))
}

pub fn v6_address(input: &[u8]) -> IResult<&[u8], Ipv6Addr> {
    let (input, address) = cursor::bytes(input, V6_LENGTH_BYTES)?;

    let address = Ipv6Addr::from(
        <[u8; V6_LENGTH_BYTES]>::try_from(address)
            .map_err(|_| DissectError::MalformedHeader.to_nom(input))?,
    );

    Ok((input, address))
}
