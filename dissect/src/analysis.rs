use crate::capture::{CaptureError, CaptureFile};
use crate::packet::Packet;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

/// Most frequent source/destination address across the packets, `None` when
/// no network layer was ever decoded.
pub fn most_common_address<I>(packets: I) -> Option<IpAddr>
where
    I: IntoIterator<Item = Packet>,
{
    let mut tallies: HashMap<IpAddr, usize> = HashMap::new();

    for packet in packets {
        if let Some(ipv4) = &packet.ipv4 {
            *tallies.entry(IpAddr::V4(ipv4.address_source)).or_default() += 1;
            *tallies
                .entry(IpAddr::V4(ipv4.address_destination))
                .or_default() += 1;
        } else if let Some(ipv6) = &packet.ipv6 {
            *tallies.entry(IpAddr::V6(ipv6.address_source)).or_default() += 1;
            *tallies
                .entry(IpAddr::V6(ipv6.address_destination))
                .or_default() += 1;
        }
    }

    tallies
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(address, _)| address)
}

pub fn most_common_address_in_file<P: AsRef<Path>>(
    path: P,
) -> Result<Option<IpAddr>, CaptureError> {
    let mut capture = CaptureFile::open(path)?;

    Ok(most_common_address(std::iter::from_fn(|| {
        capture.next_packet()
    })))
}
