use nom::IResult;
use nom::Parser;
use thiserror::Error;

/// Every parser in this crate reads the wire through the primitives below.
/// The input slice is the cursor position, `IResult` threads the advance and
/// a failed read is a recoverable `nom::Err` the assembler can absorb.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum DissectError {
    #[error("Cursor exhausted before the field could be read.")]
    OutOfBounds,

    #[error("Declared length or count is inconsistent with available bytes.")]
    MalformedHeader,

    #[error("Bytes match no recognized application grammar.")]
    UnrecognizedFormat,
}

impl DissectError {
    pub fn to_nom<T>(&self, input: T) -> nom::Err<nom::error::Error<T>> {
        let kind = match self {
            Self::OutOfBounds => nom::error::ErrorKind::Eof,
            Self::MalformedHeader => nom::error::ErrorKind::Verify,
            Self::UnrecognizedFormat => nom::error::ErrorKind::Tag,
        };

        nom::Err::Error(nom::error::Error::new(input, kind))
    }
}

pub const CRLF: &str = "\r\n";

pub fn remaining(input: &[u8]) -> usize {
    input.len()
}

/// Next `count` bytes, or `OutOfBounds` if fewer remain.
pub fn bytes(input: &[u8], count: usize) -> IResult<&[u8], &[u8]> {
    if count > input.len() {
        return Err(DissectError::OutOfBounds.to_nom(input));
    }

    nom::bytes::take(count).parse(input)
}

pub fn be_u8(input: &[u8]) -> IResult<&[u8], u8> {
    nom::number::be_u8().parse(input)
}

pub fn be_u16(input: &[u8]) -> IResult<&[u8], u16> {
    nom::number::be_u16().parse(input)
}

pub fn be_u32(input: &[u8]) -> IResult<&[u8], u32> {
    nom::number::be_u32().parse(input)
}

/// Next byte without advancing.
pub fn peek_u8(input: &[u8]) -> IResult<&[u8], u8> {
    let (_, byte) = nom::number::be_u8().parse(input)?;
    Ok((input, byte))
}

/// Advances up to `count` bytes, stopping at the end of the buffer.
pub fn skip(input: &[u8], count: usize) -> &[u8] {
    let boundary = count.min(input.len());
    &input[boundary..]
}

/// One CRLF-terminated line, the terminator consumed. A final line without a
/// terminator is returned whole. Empty input is `OutOfBounds`.
pub fn line(input: &[u8]) -> IResult<&[u8], &[u8]> {
    if input.is_empty() {
        return Err(DissectError::OutOfBounds.to_nom(input));
    }

    let framed: IResult<&[u8], &[u8]> = nom::sequence::terminated(
        nom::bytes::take_until(CRLF),
        nom::bytes::tag(CRLF),
    )
    .parse(input);

    match framed {
        Ok((rest, line)) => Ok((rest, line)),
        Err(_) => Ok((&[], input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_advance() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];

        let (rest, first) = be_u8(&data).unwrap();
        assert_eq!(first, 0x01);

        let (rest, word) = be_u16(rest).unwrap();
        assert_eq!(word, 0x0203);
        assert_eq!(remaining(rest), 2);
    }

    #[test]
    fn test_out_of_bounds() {
        let data = [0x01];

        assert!(be_u32(&data).is_err());
        assert!(bytes(&data, 2).is_err());
        assert!(be_u8(&[]).is_err());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let data = [0xAA, 0xBB];

        let (rest, byte) = peek_u8(&data).unwrap();
        assert_eq!(byte, 0xAA);
        assert_eq!(rest, &data);
    }

    #[test]
    fn test_skip_clips_at_end() {
        let data = [0x01, 0x02];

        assert_eq!(skip(&data, 1), &[0x02]);
        assert!(skip(&data, 10).is_empty());
    }

    #[test]
    fn test_line_framing() {
        let data = b"GET / HTTP/1.1\r\nHost: a\r\n";

        let (rest, first) = line(data).unwrap();
        assert_eq!(first, b"GET / HTTP/1.1");

        let (rest, second) = line(rest).unwrap();
        assert_eq!(second, b"Host: a");
        assert!(rest.is_empty());
    }

    #[test]
    fn test_line_without_terminator() {
        let (rest, only) = line(b"PING").unwrap();
        assert_eq!(only, b"PING");
        assert!(rest.is_empty());
        assert!(line(rest).is_err());
    }
}
