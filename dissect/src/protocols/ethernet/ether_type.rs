use crate::cursor;
use nom::IResult;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Ipv6,
    Vlan,
    Other(u16),
}

impl EtherType {
    pub fn value(&self) -> u16 {
        match self {
            Self::Ipv4 => 0x0800,
            Self::Ipv6 => 0x86DD,
            Self::Vlan => 0x8100,
            Self::Other(value) => *value,
        }
    }
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        match value {
            0x0800 => Self::Ipv4,
            0x86DD => Self::Ipv6,
            0x8100 => Self::Vlan,
            other => Self::Other(other),
        }
    }
}

pub fn parse(input: &[u8]) -> IResult<&[u8], EtherType> {
    let (input, ether_type) = cursor::be_u16(input)?;

    Ok((input, EtherType::from(ether_type)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_types() {
        assert_eq!(EtherType::from(0x0800), EtherType::Ipv4);
        assert_eq!(EtherType::from(0x86DD), EtherType::Ipv6);
        assert_eq!(EtherType::from(0x8100), EtherType::Vlan);
    }

    #[test]
    fn test_unknown_round_trip() {
        let arp = EtherType::from(0x0806);
        assert_eq!(arp, EtherType::Other(0x0806));
        assert_eq!(arp.value(), 0x0806);
    }
}
