//! Message definitions
//!
//! The four CP message kinds.

use std::fmt;

use super::codec::{self, STATUS_ERROR, STATUS_OK};

/// Message kind tags, used by header dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    CookieRequest,
    CookieResponse,
    Command,
    CommandResponse,
}

/// Cookie server reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieResponse {
    /// A cookie was issued (or renewed) for the requesting peer
    Granted(u32),

    /// The request was refused; carries the reason
    Rejected(String),
}

impl CookieResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, CookieResponse::Granted(_))
    }
}

/// A client command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Correlation id assigned by the client
    pub id: u64,

    /// Command text; empty when the frame carries no text
    pub text: String,
}

impl Command {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    /// Byte length of the command text
    pub fn length(&self) -> usize {
        self.text.len()
    }

    /// CRC32 over `"<id> <length>[ <text>]"`
    pub fn checksum(&self) -> u32 {
        codec::checksum(&self.checksum_base())
    }

    pub(crate) fn checksum_base(&self) -> String {
        with_optional_text(format!("{} {}", self.id, self.length()), &self.text)
    }
}

/// The command server's answer to a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    /// Echo of the command id
    pub id: u64,

    /// Whether the handler accepted the command
    pub success: bool,

    /// Result text; empty when the frame carries no payload
    pub payload: String,
}

impl CommandResponse {
    pub fn new(id: u64, success: bool, payload: impl Into<String>) -> Self {
        Self {
            id,
            success,
            payload: payload.into(),
        }
    }

    /// Byte length of the payload
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    /// Status token as it appears on the wire
    pub fn status(&self) -> &'static str {
        if self.success {
            STATUS_OK
        } else {
            STATUS_ERROR
        }
    }

    /// CRC32 over `"<status> <length>[ <payload>]"` (id not included)
    pub fn checksum(&self) -> u32 {
        codec::checksum(&self.checksum_base())
    }

    pub(crate) fn checksum_base(&self) -> String {
        with_optional_text(format!("{} {}", self.status(), self.length()), &self.payload)
    }
}

/// A decoded CP frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    CookieRequest,
    CookieResponse(CookieResponse),
    Command(Command),
    CommandResponse(CommandResponse),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::CookieRequest => MessageKind::CookieRequest,
            Message::CookieResponse(_) => MessageKind::CookieResponse,
            Message::Command(_) => MessageKind::Command,
            Message::CommandResponse(_) => MessageKind::CommandResponse,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode(self))
    }
}

/// Appends ` <text>` only when there is text
fn with_optional_text(mut head: String, text: &str) -> String {
    if !text.is_empty() {
        head.push(' ');
        head.push_str(text);
    }
    head
}
