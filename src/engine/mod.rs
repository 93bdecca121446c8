//! Engine Module
//!
//! CP state machines, one type per role.
//!
//! ## Roles
//! - [`Client`]: acquires a cookie, sends commands, correlates responses
//! - [`CookieServer`]: issues cookies from a bounded [`SessionTable`]
//! - [`CommandServer`]: runs commands through a [`CommandHandler`]
//!
//! The command server does not check cookies. Cookie state lives only on the
//! cookie server, and the command server answers any well-formed command.
//!
//! ## Timing
//! Every wait is bounded by the configured receive timeout. Client operations
//! block for at most `max_attempts` windows.
//!
//! [`SessionTable`]: crate::session::SessionTable
//! [`CommandHandler`]: crate::handler::CommandHandler

mod client;
mod cookie_server;
mod command_server;

pub use client::Client;
pub use cookie_server::{CookieServer, COOKIE_LIMIT_REACHED};
pub use command_server::{CommandServer, PAYLOAD_NOT_TRANSMITTABLE, RESPONSE_TOO_LARGE};

use std::time::Instant;

use crate::error::Result;
use crate::protocol::{self, Message};
use crate::transport::{Datagram, LinkAddress, ProtocolId, Transport};

/// Wait until `deadline` for the next frame that decodes as a CP message
///
/// Non-CP traffic and undecodable frames are dropped without ending the wait.
pub(crate) fn next_cp_message<T: Transport>(
    transport: &T,
    deadline: Instant,
) -> Result<Option<(Message, LinkAddress)>> {
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }

        let Some(datagram) = transport.receive(remaining)? else {
            return Ok(None);
        };

        if let Some(message) = decode_cp(&datagram) {
            return Ok(Some((message, datagram.source)));
        }
    }
}

/// Decode a datagram if it is CP traffic; log and drop it otherwise
pub(crate) fn decode_cp(datagram: &Datagram) -> Option<Message> {
    if datagram.protocol() != ProtocolId::Cp {
        tracing::trace!(
            "Ignoring {} traffic from {}",
            datagram.protocol(),
            datagram.source.socket
        );
        return None;
    }

    match protocol::decode(&datagram.payload) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::debug!("Discarding frame from {}: {}", datagram.source.socket, e);
            None
        }
    }
}
