use crate::cursor;
use crate::protocols::ethernet::ether_type::EtherType;
use crate::protocols::ethernet::mac::MacAddress;
use nom::IResult;
use serde::{Deserialize, Serialize};

// Ethernet II framing
// IEEE 802.3; 802.1Q tags are skipped transparently

pub const HEADER_LENGTH: usize = 14;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], Ethernet> {
    let (rest, destination_mac) = mac::parse(bytes)?;
    let (rest, source_mac) = mac::parse(rest)?;
    let (mut rest, mut ether_type) = ether_type::parse(rest)?;

    // 802.1Q: 2 bytes of tag control information, then the encapsulated type.
    // Tags may nest (QinQ); each pass consumes 4 bytes, so the loop is
    // bounded by the buffer. A truncated tag keeps the link record as-is.
    let mut vlan_tags: u8 = 0;
    while ether_type == EtherType::Vlan {
        let tagged: IResult<&[u8], EtherType> = cursor::be_u16(rest)
            .and_then(|(after, _tci)| ether_type::parse(after));
        match tagged {
            Ok((after, inner)) => {
                rest = after;
                ether_type = inner;
                vlan_tags = vlan_tags.saturating_add(1);
            },
            Err(_) => break,
        }
    }

    let protocol = Ethernet {
        destination_mac,
        source_mac,
        ether_type,
        vlan_tags,
    };

    Ok((rest, protocol))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Ethernet {
    pub destination_mac: MacAddress,
    pub source_mac: MacAddress,
    pub ether_type: EtherType,
    pub vlan_tags: u8,
}

pub mod ether_type;
pub mod mac;
