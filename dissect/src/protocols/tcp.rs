use crate::cursor;
use nom::IResult;
use serde::{Deserialize, Serialize};

// TCP Protocol
// RFC 9293: https://datatracker.ietf.org/doc/html/rfc9293

pub const HEADER_MIN_LENGTH: usize = 20;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], TCP> {
    let (rest, source_port) = cursor::be_u16(bytes)?;
    let (rest, destination_port) = cursor::be_u16(rest)?;

    let (rest, seq_number) = cursor::be_u32(rest)?;
    let (rest, ack_number) = cursor::be_u32(rest)?;

    // Data Offset in 4-byte words (4 bits), reserved (4 bits)
    let (rest, offset_byte) = cursor::be_u8(rest)?;
    let data_offset = u16::from(offset_byte >> 4) * 4;

    let (rest, flag_bits) = cursor::be_u8(rest)?;
    let flags = Flags::from(flag_bits);

    let (rest, window) = cursor::be_u16(rest)?;
    let (rest, checksum) = cursor::be_u16(rest)?;
    let (rest, urgent_pointer) = cursor::be_u16(rest)?;

    // Options are skipped. A nonsense data offset (below the fixed header or
    // past the segment end) clips to an empty options region / empty payload
    // rather than failing the record.
    let options_length = (data_offset as usize).saturating_sub(HEADER_MIN_LENGTH);
    let payload = cursor::skip(rest, options_length);

    let protocol = TCP {
        source_port,
        destination_port,
        seq_number,
        ack_number,
        data_offset,
        flags,
        window,
        checksum,
        urgent_pointer,
        payload: payload.to_vec(),
    };

    Ok((payload, protocol))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TCP {
    pub source_port: u16,
    pub destination_port: u16,
    pub seq_number: u32,
    pub ack_number: u32,
    /// Header length in bytes, data-offset nibble x 4.
    pub data_offset: u16,
    pub flags: Flags,
    pub window: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    /// Segment payload, bytes after the header to the end of the frame.
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Flags {
    pub cwr: bool,
    pub ece: bool,
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

impl From<u8> for Flags {
    fn from(bits: u8) -> Self {
        Self {
            cwr: bits & 0b1000_0000 != 0,
            ece: bits & 0b0100_0000 != 0,
            urg: bits & 0b0010_0000 != 0,
            ack: bits & 0b0001_0000 != 0,
            psh: bits & 0b0000_1000 != 0,
            rst: bits & 0b0000_0100 != 0,
            syn: bits & 0b0000_0010 != 0,
            fin: bits & 0b0000_0001 != 0,
        }
    }
}
