use crate::cursor::{self, DissectError};
use nom::IResult;
use num_enum::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use strum_macros::Display;

// DNS Protocol
// RFC 1035: https://datatracker.ietf.org/doc/html/rfc1035
// RFC 4034: https://datatracker.ietf.org/doc/html/rfc4034

pub const HEADER_LENGTH: usize = 12;
pub const PORT: u16 = 53;

/// Parses a DNS message. The 12-byte header must be present; past that,
/// truncation never fails the parse: sections stop early, entries decoded
/// so far are kept and `is_incomplete` records the divergence. Declared
/// counts are preserved verbatim, however implausible, so corrupted traffic
/// stays visible to the caller.
pub fn parse(bytes: &[u8]) -> IResult<&[u8], DNS> {
    if cursor::remaining(bytes) < HEADER_LENGTH {
        return Err(DissectError::OutOfBounds.to_nom(bytes));
    }

    let (rest, id) = cursor::be_u16(bytes)?;
    let (rest, flags) = cursor::be_u16(rest)?;
    let (rest, question_count) = cursor::be_u16(rest)?;
    let (rest, answer_count) = cursor::be_u16(rest)?;
    let (rest, authority_count) = cursor::be_u16(rest)?;
    let (mut rest, additional_count) = cursor::be_u16(rest)?;

    let mut questions = Vec::new();
    for _ in 0..question_count {
        match parse_question(rest, bytes) {
            Ok((after, question)) => {
                questions.push(question);
                rest = after;
            },
            Err(_) => break,
        }
    }

    let (rest, answers) = parse_record_section(rest, answer_count, bytes);
    let (rest, authoritatives) = parse_record_section(rest, authority_count, bytes);
    let (rest, additionals) = parse_record_section(rest, additional_count, bytes);

    let is_incomplete = questions.len() < question_count as usize
        || answers.len() < answer_count as usize
        || authoritatives.len() < authority_count as usize
        || additionals.len() < additional_count as usize;

    let protocol = DNS {
        id,
        flags,
        question_count,
        answer_count,
        authority_count,
        additional_count,
        questions,
        answers,
        authoritatives,
        additionals,
        is_incomplete,
    };

    Ok((rest, protocol))
}

fn parse_question<'a>(
    bytes: &'a [u8], whole: &'a [u8],
) -> IResult<&'a [u8], Question> {
    let (rest, name) = parse_name(bytes, whole)?;

    let (rest, record_type) = cursor::be_u16(rest)?;
    let record_type = RecordType::from(record_type);

    let (rest, class) = cursor::be_u16(rest)?;

    let question = Question {
        name,
        record_type,
        class,
    };

    Ok((rest, question))
}

fn parse_record_section<'a>(
    bytes: &'a [u8], declared: u16, whole: &'a [u8],
) -> (&'a [u8], Vec<ResourceRecord>) {
    let mut records = Vec::new();
    let mut rest = bytes;

    for _ in 0..declared {
        match parse_resource_record(rest, whole) {
            Ok((after, record)) => {
                records.push(record);
                rest = after;
            },
            Err(_) => break,
        }
    }

    (rest, records)
}

fn parse_resource_record<'a>(
    bytes: &'a [u8], whole: &'a [u8],
) -> IResult<&'a [u8], ResourceRecord> {
    let (rest, name) = parse_name(bytes, whole)?;

    let (rest, record_type) = cursor::be_u16(rest)?;
    let record_type = RecordType::from(record_type);

    let (rest, class) = cursor::be_u16(rest)?;
    let (rest, time_to_live) = cursor::be_u32(rest)?;

    let (rest, data_length) = cursor::be_u16(rest)?;
    let (rest, rdata) = cursor::bytes(rest, data_length as usize)?;

    let data = render_rdata(&record_type, rdata, whole);

    let record = ResourceRecord {
        name,
        record_type,
        class,
        time_to_live,
        data_length,
        data,
    };

    Ok((rest, record))
}

/// Decompresses a domain name. A length byte with the top two bits set is a
/// 14-bit back-reference into the message, followed transparently; the
/// visited-offset set rejects pointer cycles, so adversarial chains
/// terminate with an error instead of looping. The returned rest resumes
/// right after the name's in-entry bytes (two bytes for a pointer).
fn parse_name<'a>(bytes: &'a [u8], whole: &'a [u8]) -> IResult<&'a [u8], String> {
    let mut labels: Vec<String> = Vec::new();
    let mut visited: HashSet<usize> = HashSet::new();

    // Resume point inside the entry once the first pointer jumps away
    let mut resume: Option<&'a [u8]> = None;
    let mut current = bytes;

    loop {
        let (after, length_octet) = cursor::be_u8(current)?;

        // Null terminator
        if length_octet == 0 {
            current = after;
            break;
        }

        let is_pointer = (length_octet & 0b1100_0000) == 0b1100_0000;
        if is_pointer {
            let (after, low_byte) = cursor::be_u8(after)?;
            let offset =
                (((length_octet & 0b0011_1111) as usize) << 8) | low_byte as usize;

            if !visited.insert(offset) {
                return Err(DissectError::MalformedHeader.to_nom(bytes));
            }

            if resume.is_none() {
                resume = Some(after);
            }

            current = whole
                .get(offset..)
                .ok_or(DissectError::OutOfBounds.to_nom(bytes))?;
        } else {
            let (after, label) = cursor::bytes(after, length_octet as usize)?;
            labels.push(String::from_utf8_lossy(label).into_owned());
            current = after;
        }
    }

    let rest = resume.unwrap_or(current);
    let name = match labels.is_empty() {
        // Root name
        true => ".".to_string(),
        false => labels.join("."),
    };

    Ok((rest, name))
}

/// Renders rdata into its display form. Types without a dedicated format
/// (and any rdata too mangled for its type) fall back to a lowercase hex
/// dump, like the reference dissectors this output is compared against.
fn render_rdata(record_type: &RecordType, rdata: &[u8], whole: &[u8]) -> String {
    try_render(record_type, rdata, whole).unwrap_or_else(|| hex::encode(rdata))
}

fn try_render(record_type: &RecordType, rdata: &[u8], whole: &[u8]) -> Option<String> {
    match record_type {
        RecordType::A => {
            let octets = <[u8; 4]>::try_from(rdata).ok()?;
            Some(Ipv4Addr::from(octets).to_string())
        },

        RecordType::AAAA => {
            let octets = <[u8; 16]>::try_from(rdata).ok()?;
            Some(Ipv6Addr::from(octets).to_string())
        },

        RecordType::NS | RecordType::CNAME | RecordType::PTR => {
            let (_, name) = parse_name(rdata, whole).ok()?;
            Some(name)
        },

        RecordType::MX => {
            let (rest, preference) = cursor::be_u16(rdata).ok()?;
            let (_, exchange) = parse_name(rest, whole).ok()?;
            Some(format!("{} {}", preference, exchange))
        },

        RecordType::SOA => {
            let (rest, mname) = parse_name(rdata, whole).ok()?;
            let (rest, rname) = parse_name(rest, whole).ok()?;
            let (rest, serial) = cursor::be_u32(rest).ok()?;
            let (rest, refresh) = cursor::be_u32(rest).ok()?;
            let (rest, retry) = cursor::be_u32(rest).ok()?;
            let (rest, expire) = cursor::be_u32(rest).ok()?;
            let (_, minimum) = cursor::be_u32(rest).ok()?;

            Some(format!(
                "\"{} {} {} {} {} {} {}\"",
                mname, rname, serial, refresh, retry, expire, minimum
            ))
        },

        RecordType::DS => {
            let (rest, key_tag) = cursor::be_u16(rdata).ok()?;
            let (rest, algorithm) = cursor::be_u8(rest).ok()?;
            let (rest, digest_type) = cursor::be_u8(rest).ok()?;

            Some(format!(
                "\"{} {} {} {}\"",
                key_tag,
                dnssec_algorithm(algorithm),
                digest_type_name(digest_type),
                hex::encode(rest)
            ))
        },

        RecordType::DNSKEY => {
            let (rest, key_flags) = cursor::bytes(rdata, 2).ok()?;
            let (rest, protocol) = cursor::be_u8(rest).ok()?;
            let (rest, algorithm) = cursor::be_u8(rest).ok()?;

            Some(format!(
                "\"0x{} {} {} {}\"",
                hex::encode(key_flags),
                protocol,
                dnssec_algorithm(algorithm),
                hex::encode(rest)
            ))
        },

        RecordType::NSSEC => {
            let (rest, next_domain) = parse_name(rdata, whole).ok()?;
            Some(format!("\"{} {}\"", next_domain, hex::encode(rest)))
        },

        _ => None,
    }
}

fn dnssec_algorithm(algorithm: u8) -> &'static str {
    match algorithm {
        1 => "RSA/MD5",
        2 => "DH",
        3 => "DSA/SHA-1",
        4 => "ECC",
        5 => "RSA/SHA-1",
        6 => "DSA-NSEC3-SHA1",
        7 => "RSASHA1-NSEC3-SHA1",
        8 => "RSA/SHA-256",
        10 => "RSA/SHA-512",
        12 => "ECC-GOST",
        13 => "ECDSAP256SHA256",
        14 => "ECDSAP384SHA384",
        15 => "ED25519",
        16 => "ED448",
        252 => "INDIRECT",
        253 => "PRIVATEDNS",
        254 => "PRIVATEOID",
        _ => "UNKNOWN",
    }
}

fn digest_type_name(digest_type: u8) -> &'static str {
    match digest_type {
        1 => "SHA-1",
        2 => "SHA-256",
        3 => "ECC-GOST",
        4 => "SHA-384",
        _ => "UNKNOWN",
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DNS {
    pub id: u16,
    pub flags: u16,

    /// Section counts as declared in the header, preserved verbatim.
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,

    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authoritatives: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,

    /// True when any section parsed fewer entries than its declared count.
    pub is_incomplete: bool,
}

impl DNS {
    /// Query (0) x response (1) bit.
    pub fn qr(&self) -> u8 {
        (self.flags >> 15) as u8
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub name: String,
    pub record_type: RecordType,
    pub class: u16,
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.record_type)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResourceRecord {
    pub name: String,
    pub record_type: RecordType,
    pub class: u16,
    pub time_to_live: u32,
    pub data_length: u16,
    /// Rendered rdata value, type-specific format.
    pub data: String,
}

impl std::fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {} {}", self.name, self.record_type, self.data)
    }
}

#[derive(
    Clone, Copy, Debug, Display, Serialize, Deserialize, PartialEq, Eq, FromPrimitive,
)]
#[repr(u16)]
pub enum RecordType {
    A = 1,
    NS = 2,
    MD = 3,
    MF = 4,
    CNAME = 5,
    SOA = 6,
    MB = 7,
    MG = 8,
    MR = 9,
    NULL = 10,
    WKS = 11,
    PTR = 12,
    HINFO = 13,
    MINFO = 14,
    MX = 15,
    TXT = 16,
    AAAA = 28,
    SRV = 33,
    OPT = 41,
    DS = 43,
    RRSIG = 46,
    NSSEC = 47,
    DNSKEY = 48,
    NSEC3 = 50,

    #[strum(serialize = "UNKNOWN")]
    #[num_enum(default)]
    Unknown = 0,
}
