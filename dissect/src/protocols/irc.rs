use crate::cursor;
use crate::text;
use nom::IResult;
use serde::{Deserialize, Serialize};

// IRC Protocol
// RFC 2812: https://datatracker.ietf.org/doc/html/rfc2812

pub const PORT: u16 = 6667;

/// Decodes every CRLF-delimited message in the payload, in order. A final
/// line without a terminator still counts; empty lines are skipped.
/// Non-printable bytes are `%xx`-escaped before tokenization.
pub fn parse(bytes: &[u8]) -> IResult<&[u8], IRC> {
    let mut messages = Vec::new();

    let mut rest_buffer = bytes;
    while !rest_buffer.is_empty() {
        let (rest, line_bytes) = cursor::line(rest_buffer)?;
        rest_buffer = rest;

        let (line, _) = text::escape_line(line_bytes);
        if line.is_empty() {
            continue;
        }

        messages.push(parse_message(&line));
    }

    Ok((rest_buffer, IRC { messages }))
}

/// One line: `[:prefix SP] command [params] [:trailing]`. A parameter
/// starting with `:` consumes the remainder of the line verbatim, embedded
/// spaces included.
fn parse_message(line: &str) -> Message {
    let mut remainder = line;

    let mut prefix = String::new();
    if let Some(stripped) = remainder.strip_prefix(':') {
        match stripped.split_once(' ') {
            Some((value, rest)) => {
                prefix = value.to_string();
                remainder = rest;
            },
            None => {
                prefix = stripped.to_string();
                remainder = "";
            },
        }
    }

    let command;
    match remainder.split_once(' ') {
        Some((value, rest)) => {
            command = value.to_string();
            remainder = rest;
        },
        None => {
            command = remainder.to_string();
            remainder = "";
        },
    }

    let mut params = Vec::new();
    let mut trailing = String::new();
    while !remainder.is_empty() {
        if let Some(value) = remainder.strip_prefix(':') {
            trailing = value.to_string();
            break;
        }

        match remainder.split_once(' ') {
            Some((param, rest)) => {
                if !param.is_empty() {
                    params.push(param.to_string());
                }
                remainder = rest;
            },
            None => {
                params.push(remainder.to_string());
                remainder = "";
            },
        }
    }

    Message {
        prefix,
        command,
        params,
        trailing,
    }
}

/// Port-independent recognition: a printable CRLF-terminated first line
/// whose command token (after an optional `:prefix`) is an all-digit reply
/// code or an all-letter command word.
pub fn matches_grammar(payload: &[u8]) -> bool {
    let Some(position) = payload.windows(2).position(|pair| pair == b"\r\n") else {
        return false;
    };

    let line = &payload[..position];
    if line.is_empty() || !line.iter().all(|byte| text::is_printable(*byte)) {
        return false;
    }
    let Ok(line) = std::str::from_utf8(line) else {
        return false;
    };

    let mut rest = line;
    if rest.starts_with(':') {
        match rest.split_once(' ') {
            Some((_, after)) => rest = after,
            None => return false,
        }
    }

    let command = rest.split(' ').next().unwrap_or_default();

    !command.is_empty()
        && (command.chars().all(|symbol| symbol.is_ascii_digit())
            || command.chars().all(|symbol| symbol.is_ascii_alphabetic()))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IRC {
    pub messages: Vec<Message>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Sender, without the leading colon; empty when absent.
    pub prefix: String,
    pub command: String,
    pub params: Vec<String>,
    /// Final argument introduced by `:`, may contain spaces; empty when
    /// absent.
    pub trailing: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_line() {
        let payload = b":irc.example.net 001 daniel :Welcome\r\n";

        let (_, irc) = parse(payload).unwrap();

        assert_eq!(irc.messages.len(), 1);
        let message = &irc.messages[0];
        assert_eq!(message.prefix, "irc.example.net");
        assert_eq!(message.command, "001");
        assert_eq!(message.params, vec!["daniel".to_string()]);
        assert_eq!(message.trailing, "Welcome");
    }

    #[test]
    fn test_no_prefix() {
        let payload = b"CAP LS\r\n";

        let (_, irc) = parse(payload).unwrap();

        let message = &irc.messages[0];
        assert_eq!(message.prefix, "");
        assert_eq!(message.command, "CAP");
        assert_eq!(message.params, vec!["LS".to_string()]);
        assert_eq!(message.trailing, "");
    }

    #[test]
    fn test_trailing_keeps_spaces() {
        let payload = b":daniel!~daniel@172.17.0.1 PRIVMSG #testchannel :Hello world.\r\n";

        let (_, irc) = parse(payload).unwrap();

        let message = &irc.messages[0];
        assert_eq!(message.prefix, "daniel!~daniel@172.17.0.1");
        assert_eq!(message.command, "PRIVMSG");
        assert_eq!(message.params, vec!["#testchannel".to_string()]);
        assert_eq!(message.trailing, "Hello world.");
    }

    #[test]
    fn test_pipelined_messages_in_order() {
        let payload = b":irc.example.net 001 daniel :Welcome\r\n:irc.example.net 002 daniel :Your host\r\nPING :irc.example.net\r\n";

        let (_, irc) = parse(payload).unwrap();

        assert_eq!(irc.messages.len(), 3);
        assert_eq!(irc.messages[0].command, "001");
        assert_eq!(irc.messages[1].command, "002");
        assert_eq!(irc.messages[2].command, "PING");
        assert_eq!(irc.messages[2].trailing, "irc.example.net");
    }

    #[test]
    fn test_unterminated_final_line() {
        let payload = b"QUIT :leaving";

        let (_, irc) = parse(payload).unwrap();

        assert_eq!(irc.messages[0].command, "QUIT");
        assert_eq!(irc.messages[0].trailing, "leaving");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let payload = b"\r\nNICK daniel\r\n\r\n";

        let (_, irc) = parse(payload).unwrap();

        assert_eq!(irc.messages.len(), 1);
        assert_eq!(irc.messages[0].command, "NICK");
        assert_eq!(irc.messages[0].params, vec!["daniel".to_string()]);
    }

    #[test]
    fn test_matches_grammar() {
        assert!(matches_grammar(b":irc.example.net 001 daniel :Welcome\r\n"));
        assert!(matches_grammar(b"PING :irc.example.net\r\n"));
        assert!(!matches_grammar(b"no terminator"));
        assert!(!matches_grammar(b"\x01\x02 binary\r\n"));
        assert!(!matches_grammar(b"not-a-command! x\r\n"));
    }
}
