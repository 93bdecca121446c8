//! Protocol codec
//!
//! Encoding and decoding functions for the CP wire format.
//!
//! Decoding splits on whitespace, so text fields come back joined by single
//! spaces. A text containing runs of whitespace therefore fails the length
//! check on the receiving side and the frame is rejected; senders check
//! [`is_wire_safe`] first.

use crate::error::{CpError, Result};
use super::{Command, CommandResponse, CookieResponse, Message, MessageKind};

/// Envelope header carried by every frame
pub const CP_HEADER: &str = "cp";

pub const COOKIE_REQUEST_HEADER: &str = "cookie_request";
pub const COOKIE_RESPONSE_HEADER: &str = "cookie_response";
pub const COMMAND_RESPONSE_HEADER: &str = "command_response";
pub const COMMAND_HEADER: &str = "command";

pub const STATUS_OK: &str = "ok";
pub const STATUS_ERROR: &str = "error";

/// Header prefix rules, evaluated top-down. Anything unmatched is parsed as a
/// Command.
pub const DISPATCH_RULES: &[(&str, MessageKind)] = &[
    (COOKIE_REQUEST_HEADER, MessageKind::CookieRequest),
    (COOKIE_RESPONSE_HEADER, MessageKind::CookieResponse),
    // must precede COMMAND_HEADER: "command" is a prefix of "command_response"
    (COMMAND_RESPONSE_HEADER, MessageKind::CommandResponse),
    (COMMAND_HEADER, MessageKind::Command),
];

/// CRC32 (IEEE) of a checksum base string
pub fn checksum(base: &str) -> u32 {
    crc32fast::hash(base.as_bytes())
}

/// Whether `text` comes back unchanged after whitespace tokenizing
///
/// Text with leading, trailing or repeated spaces, or any whitespace other
/// than a single space, fails the length check on the receiving side.
pub fn is_wire_safe(text: &str) -> bool {
    !text.starts_with(' ')
        && !text.ends_with(' ')
        && !text.contains("  ")
        && !text.chars().any(|c| c.is_whitespace() && c != ' ')
}

/// Classify an inner message (envelope already stripped) by header prefix
pub fn classify(inner: &str) -> MessageKind {
    DISPATCH_RULES
        .iter()
        .find(|(header, _)| inner.starts_with(header))
        .map(|&(_, kind)| kind)
        .unwrap_or(MessageKind::Command)
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a message to a complete frame, envelope included
pub fn encode(message: &Message) -> String {
    let inner = match message {
        Message::CookieRequest => COOKIE_REQUEST_HEADER.to_string(),
        Message::CookieResponse(CookieResponse::Granted(cookie)) => {
            format!("{} {} {}", COOKIE_RESPONSE_HEADER, STATUS_OK, cookie)
        }
        Message::CookieResponse(CookieResponse::Rejected(reason)) => {
            format!("{} {} {}", COOKIE_RESPONSE_HEADER, STATUS_ERROR, reason)
        }
        Message::Command(command) => format!(
            "{} {} {}",
            COMMAND_HEADER,
            command.checksum_base(),
            command.checksum()
        ),
        Message::CommandResponse(response) => format!(
            "{} {} {} {}",
            COMMAND_RESPONSE_HEADER,
            response.id,
            response.checksum_base(),
            response.checksum()
        ),
    };

    format!("{} {}", CP_HEADER, inner)
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a complete frame
///
/// Any structural or checksum violation yields [`CpError::IllegalMessage`].
pub fn decode(frame: &str) -> Result<Message> {
    let inner = strip_envelope(frame)?;

    match classify(inner) {
        MessageKind::CookieRequest => decode_cookie_request(inner),
        MessageKind::CookieResponse => decode_cookie_response(inner),
        MessageKind::CommandResponse => decode_command_response(inner),
        MessageKind::Command => decode_command(inner),
    }
}

/// Remove the `cp` header and the separating whitespace
fn strip_envelope(frame: &str) -> Result<&str> {
    let rest = frame
        .strip_prefix(CP_HEADER)
        .ok_or_else(|| CpError::illegal("missing cp header"))?;

    if !rest.starts_with(char::is_whitespace) {
        return Err(CpError::illegal("missing separator after cp header"));
    }

    let inner = rest.trim_start();
    if inner.is_empty() {
        return Err(CpError::illegal("empty cp frame"));
    }
    Ok(inner)
}

fn decode_cookie_request(inner: &str) -> Result<Message> {
    let tokens: Vec<&str> = inner.split_whitespace().collect();
    if tokens != [COOKIE_REQUEST_HEADER] {
        return Err(CpError::illegal(format!(
            "cookie request: unexpected content {:?}",
            inner
        )));
    }
    Ok(Message::CookieRequest)
}

fn decode_cookie_response(inner: &str) -> Result<Message> {
    let tokens: Vec<&str> = inner.split_whitespace().collect();
    if tokens.len() < 2 || tokens[0] != COOKIE_RESPONSE_HEADER {
        return Err(CpError::illegal("cookie response: malformed header"));
    }

    match tokens[1] {
        STATUS_OK => {
            if tokens.len() != 3 {
                return Err(CpError::illegal(format!(
                    "cookie response: expected 3 tokens, got {}",
                    tokens.len()
                )));
            }
            let cookie = parse_field::<u32>(tokens[2], "cookie value")?;
            Ok(Message::CookieResponse(CookieResponse::Granted(cookie)))
        }
        STATUS_ERROR => Ok(Message::CookieResponse(CookieResponse::Rejected(
            tokens[2..].join(" "),
        ))),
        other => Err(CpError::illegal(format!(
            "cookie response: bad status {:?}",
            other
        ))),
    }
}

/// Format: command <id> <length> [<text>] <crc32>
fn decode_command(inner: &str) -> Result<Message> {
    let tokens: Vec<&str> = inner.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(CpError::illegal(format!(
            "command: expected at least 4 tokens, got {}",
            tokens.len()
        )));
    }
    if tokens[0] != COMMAND_HEADER {
        return Err(CpError::illegal(format!(
            "command: bad header {:?}",
            tokens[0]
        )));
    }

    let id = parse_field::<u64>(tokens[1], "command id")?;
    let length = parse_field::<usize>(tokens[2], "command length")?;
    let crc = parse_field::<u32>(tokens[tokens.len() - 1], "command checksum")?;
    let text = tokens[3..tokens.len() - 1].join(" ");

    let command = Command::new(id, text);
    verify(command.length(), length, command.checksum(), crc, "command")?;

    Ok(Message::Command(command))
}

/// Format: command_response <id> <ok|error> <length> [<payload>] <crc32>
fn decode_command_response(inner: &str) -> Result<Message> {
    let tokens: Vec<&str> = inner.split_whitespace().collect();
    if tokens.len() < 5 {
        return Err(CpError::illegal(format!(
            "command response: expected at least 5 tokens, got {}",
            tokens.len()
        )));
    }
    if tokens[0] != COMMAND_RESPONSE_HEADER {
        return Err(CpError::illegal(format!(
            "command response: bad header {:?}",
            tokens[0]
        )));
    }

    let id = parse_field::<u64>(tokens[1], "response id")?;
    let success = match tokens[2] {
        STATUS_OK => true,
        STATUS_ERROR => false,
        other => {
            return Err(CpError::illegal(format!(
                "command response: bad status {:?}",
                other
            )))
        }
    };
    let length = parse_field::<usize>(tokens[3], "response length")?;
    let crc = parse_field::<u32>(tokens[tokens.len() - 1], "response checksum")?;
    let payload = tokens[4..tokens.len() - 1].join(" ");

    let response = CommandResponse::new(id, success, payload);
    verify(response.length(), length, response.checksum(), crc, "command response")?;

    Ok(Message::CommandResponse(response))
}

fn parse_field<T: std::str::FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse::<T>()
        .map_err(|_| CpError::illegal(format!("{}: not a number: {:?}", what, token)))
}

fn verify(
    actual_len: usize,
    declared_len: usize,
    computed_crc: u32,
    declared_crc: u32,
    what: &str,
) -> Result<()> {
    if actual_len != declared_len {
        return Err(CpError::illegal(format!(
            "{}: length mismatch (declared {}, actual {})",
            what, declared_len, actual_len
        )));
    }
    if computed_crc != declared_crc {
        return Err(CpError::illegal(format!(
            "{}: checksum mismatch (declared {}, computed {})",
            what, declared_crc, computed_crc
        )));
    }
    Ok(())
}
