//! Protocol Module
//!
//! Defines the CP wire protocol shared by clients, the cookie server and the
//! command server.
//!
//! ## Frame Format
//!
//! Every frame is a single space-delimited text line carrying the `cp`
//! envelope header followed by one of four inner messages:
//!
//! ```text
//! cp cookie_request
//! cp cookie_response ok <cookie>
//! cp cookie_response error <text>
//! cp command <id> <length> [<text>] <crc32>
//! cp command_response <id> <ok|error> <length> [<payload>] <crc32>
//! ```
//!
//! ### Checksums
//! - Command: CRC32 over `"<id> <length>[ <text>]"`
//! - CommandResponse: CRC32 over `"<status> <length>[ <payload>]"`
//!
//! The response checksum does not cover the id. Peers compute it this way on
//! the wire, so it stays that way.
//!
//! ### Dispatch
//! After stripping the envelope the inner message is classified by header
//! prefix, top-down through [`DISPATCH_RULES`]. `command_response` is tested
//! before `command` since the latter is a prefix of the former.

mod message;
mod codec;

pub use message::{Command, CommandResponse, CookieResponse, Message, MessageKind};
pub use codec::{
    checksum, classify, decode, encode, is_wire_safe, CP_HEADER, COMMAND_HEADER,
    COMMAND_RESPONSE_HEADER, COOKIE_REQUEST_HEADER, COOKIE_RESPONSE_HEADER, DISPATCH_RULES,
    STATUS_ERROR, STATUS_OK,
};
