use crate::cursor;
use crate::text;
use nom::IResult;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

// Telnet Protocol
// RFC 854: https://datatracker.ietf.org/doc/html/rfc854

pub const PORT: u16 = 23;
pub const IAC: u8 = 255;

/// Classifies the payload: IAC-led option negotiation, plain data, or empty.
/// Exactly one classification holds. Command payloads are not decoded
/// further; data decodes with printable and whitespace bytes kept and the
/// rest `%xx`-escaped.
pub fn parse(bytes: &[u8]) -> IResult<&[u8], Telnet> {
    if bytes.is_empty() {
        let protocol = Telnet {
            classification: Classification::Empty,
            data: String::new(),
        };
        return Ok((bytes, protocol));
    }

    let (after_iac, first) = cursor::be_u8(bytes)?;
    if first == IAC {
        if let Ok((_, second)) = cursor::be_u8(after_iac) {
            if NegotiationCommand::try_from(second).is_ok() {
                let protocol = Telnet {
                    classification: Classification::Command,
                    data: String::new(),
                };
                return Ok((&[], protocol));
            }
        }
    }

    let mut data = String::with_capacity(bytes.len());
    for &byte in bytes {
        if text::is_printable(byte) || text::is_whitespace(byte) {
            data.push(byte as char);
        } else {
            text::push_escaped(&mut data, byte);
        }
    }

    let protocol = Telnet {
        classification: Classification::Data,
        data,
    };

    Ok((&[], protocol))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Telnet {
    pub classification: Classification,
    /// Decoded text when classified as data, empty otherwise.
    pub data: String,
}

impl Telnet {
    pub fn is_command(&self) -> bool {
        self.classification == Classification::Command
    }

    pub fn is_data(&self) -> bool {
        self.classification == Classification::Data
    }

    pub fn is_empty(&self) -> bool {
        self.classification == Classification::Empty
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Classification {
    Command,
    Data,
    Empty,
}

#[derive(
    Clone, Copy, Debug, Display, Serialize, Deserialize, PartialEq, Eq, TryFromPrimitive,
)]
#[repr(u8)]
pub enum NegotiationCommand {
    #[strum(serialize = "SE")]
    SubnegotiationEnd = 240,
    #[strum(serialize = "NOP")]
    NoOperation = 241,
    #[strum(serialize = "DM")]
    DataMark = 242,
    #[strum(serialize = "BRK")]
    Break = 243,
    #[strum(serialize = "IP")]
    InterruptProcess = 244,
    #[strum(serialize = "AO")]
    AbortOutput = 245,
    #[strum(serialize = "AYT")]
    AreYouThere = 246,
    #[strum(serialize = "EC")]
    EraseCharacter = 247,
    #[strum(serialize = "EL")]
    EraseLine = 248,
    #[strum(serialize = "GA")]
    GoAhead = 249,
    #[strum(serialize = "SB")]
    Subnegotiation = 250,
    #[strum(serialize = "WILL")]
    Will = 251,
    #[strum(serialize = "WONT")]
    Wont = 252,
    #[strum(serialize = "DO")]
    Do = 253,
    #[strum(serialize = "DONT")]
    Dont = 254,
    #[strum(serialize = "IAC")]
    InterpretAsCommand = 255,
}
