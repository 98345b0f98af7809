use crate::cursor;
use crate::text;
use nom::IResult;
use serde::{Deserialize, Serialize};

// HTTP Protocol
// RFC 2616: https://datatracker.ietf.org/doc/html/rfc2616

pub const PORTS: [u16; 2] = [80, 8080];

pub const REQUEST_METHODS: [&str; 8] = [
    "OPTIONS", "GET", "HEAD", "POST", "PUT", "DELETE", "TRACE", "CONNECT",
];

pub const PROTOCOL_VERSIONS: [&str; 5] =
    ["HTTP/0.9", "HTTP/1.0", "HTTP/1.1", "HTTP/2.0", "HTTP/3.0"];

/// Decodes one HTTP message. Never fails: a first line matching neither the
/// request nor the status grammar yields a record with every field empty, so
/// binary data misidentified as HTTP degrades to "not HTTP" without an
/// error. The record owns the body.
pub fn parse(bytes: &[u8]) -> IResult<&[u8], HTTP> {
    let mut protocol = HTTP::default();

    let (rest, first_line) = match cursor::line(bytes) {
        Ok(value) => value,
        // Empty payload: empty record
        Err(_) => return Ok((&[], protocol)),
    };
    let (first_line, non_ascii) = text::escape_line(first_line);
    protocol.non_ascii = non_ascii;

    let mut parts = first_line.splitn(3, ' ');
    let first_token = parts.next().unwrap_or_default();

    if REQUEST_METHODS.contains(&first_token) {
        protocol.kind = MessageKind::Request;
        protocol.request_method = first_token.to_string();
        protocol.request_uri = parts.next().unwrap_or_default().to_string();
        protocol.version = parts.next().unwrap_or_default().to_string();
    } else if PROTOCOL_VERSIONS.contains(&first_token) {
        protocol.kind = MessageKind::Response;
        protocol.version = first_token.to_string();
        protocol.status_code = parts.next().unwrap_or_default().to_string();
        protocol.response_phrase = parts.next().unwrap_or_default().to_string();
    } else {
        // Neither grammar: no header parsing, everything stays empty
        return Ok((&[], protocol));
    }

    let rest = parse_headers(rest, &mut protocol);
    protocol.body = rest.to_vec();

    Ok((&[], protocol))
}

/// Header block: `Name: Value` lines up to the blank separator. A line
/// without a colon also ends the block (consumed, excluded from the body).
/// Values keep printable ASCII and `%xx`-escape the rest.
fn parse_headers<'a>(input: &'a [u8], protocol: &mut HTTP) -> &'a [u8] {
    let mut rest_buffer = input;

    loop {
        let (rest, header_line) = match cursor::line(rest_buffer) {
            Ok(value) => value,
            Err(_) => return rest_buffer,
        };
        rest_buffer = rest;

        // Blank separator: body starts here
        if header_line.is_empty() {
            return rest_buffer;
        }

        let (header_line, non_ascii) = text::escape_line(header_line);
        protocol.non_ascii |= non_ascii;

        match header_line.split_once(':') {
            Some((key, value)) => {
                let value = value.strip_prefix(' ').unwrap_or(value);
                protocol
                    .headers
                    .push((key.to_string(), value.to_string()));
            },
            None => return rest_buffer,
        }
    }
}

pub fn matches_grammar(payload: &[u8]) -> bool {
    if payload.starts_with(b"HTTP/") {
        return true;
    }

    REQUEST_METHODS.iter().any(|method| {
        payload.starts_with(method.as_bytes())
            && payload.get(method.len()) == Some(&b' ')
    })
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct HTTP {
    pub kind: MessageKind,

    pub request_method: String,
    pub request_uri: String,
    pub version: String,

    pub status_code: String,
    pub response_phrase: String,

    /// Ordered and case-preserving; duplicate keys keep every occurrence.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,

    /// Some header value or line carried bytes outside printable ASCII.
    pub non_ascii: bool,
}

impl HTTP {
    pub fn is_request(&self) -> bool {
        self.kind == MessageKind::Request
    }

    pub fn is_response(&self) -> bool {
        self.kind == MessageKind::Response
    }

    /// First-match-wins lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn body_length(&self) -> usize {
        self.body.len()
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,

    #[default]
    Unrecognized,
}
