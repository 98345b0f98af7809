use crate::cursor;
use nom::IResult;
use serde::{Deserialize, Serialize};

// UDP Protocol
// RFC 768: https://datatracker.ietf.org/doc/html/rfc768

pub const HEADER_LENGTH: usize = 8;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], UDP> {
    let (rest, source_port) = cursor::be_u16(bytes)?;
    let (rest, destination_port) = cursor::be_u16(rest)?;
    let (rest, length) = cursor::be_u16(rest)?;
    let (rest, checksum) = cursor::be_u16(rest)?;

    // Payload runs to the declared datagram length; a declared length past
    // the captured bytes (or below the header size) clips instead of failing.
    let declared = (length as usize).saturating_sub(HEADER_LENGTH);
    let available = declared.min(cursor::remaining(rest));
    let (_, payload) = cursor::bytes(rest, available)?;

    let protocol = UDP {
        source_port,
        destination_port,
        length,
        checksum,
        payload: payload.to_vec(),
    };

    Ok((payload, protocol))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UDP {
    pub source_port: u16,
    pub destination_port: u16,
    /// Datagram length as declared on the wire, header included.
    pub length: u16,
    pub checksum: u16,
    /// Datagram payload, clipped to the captured bytes.
    pub payload: Vec<u8>,
}
