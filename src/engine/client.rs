//! Client role
//!
//! Cookie handshake, command transmission and response correlation.

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{CpError, Result};
use crate::protocol::{encode, is_wire_safe, Command, CommandResponse, CookieResponse, Message};
use crate::transport::{LinkAddress, Transport, MAX_PAYLOAD_SIZE};

use super::next_cp_message;

/// A CP client session
///
/// Holds at most one outstanding command. Ids start at 0 and grow by one per
/// command sent; a response is accepted only if it echoes the outstanding id.
pub struct Client<T: Transport> {
    transport: T,

    command_server: LinkAddress,
    cookie_server: LinkAddress,

    receive_timeout: Duration,
    max_attempts: u32,

    /// Cookie granted by the cookie server (None until acquired)
    cookie: Option<u32>,

    /// Id for the next command
    next_id: u64,

    /// Id of the command awaiting its response
    last_sent_id: Option<u64>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            transport,
            command_server: LinkAddress::cp(config.command_server_addr),
            cookie_server: LinkAddress::cp(config.cookie_server_addr),
            receive_timeout: config.receive_timeout(),
            max_attempts: config.max_attempts,
            cookie: None,
            next_id: 0,
            last_sent_id: None,
        })
    }

    /// Request a cookie from the cookie server
    ///
    /// Each attempt sends one request and waits one timeout window for a
    /// CookieResponse. Fails with [`CpError::CookieRequest`] when the server
    /// refuses or every attempt times out.
    pub fn acquire_cookie(&mut self) -> Result<u32> {
        let request = encode(&Message::CookieRequest);

        for attempt in 1..=self.max_attempts {
            tracing::debug!(
                "Requesting cookie from {} (attempt {}/{})",
                self.cookie_server,
                attempt,
                self.max_attempts
            );
            self.transport.send(&request, &self.cookie_server)?;

            let deadline = Instant::now() + self.receive_timeout;
            while let Some((message, source)) = next_cp_message(&self.transport, deadline)? {
                if source.socket != self.cookie_server.socket {
                    tracing::trace!(
                        "Ignoring {:?} from {}, not the cookie server",
                        message.kind(),
                        source
                    );
                    continue;
                }
                match message {
                    Message::CookieResponse(CookieResponse::Granted(cookie)) => {
                        tracing::info!("Acquired cookie {} from {}", cookie, source);
                        self.cookie = Some(cookie);
                        return Ok(cookie);
                    }
                    Message::CookieResponse(CookieResponse::Rejected(reason)) => {
                        tracing::warn!("Cookie request rejected by {}: {}", source, reason);
                        return Err(CpError::CookieRequest(reason));
                    }
                    other => {
                        tracing::trace!("Ignoring {:?} while waiting for a cookie", other.kind());
                    }
                }
            }
        }

        Err(CpError::CookieRequest(format!(
            "no response from {} after {} attempts",
            self.cookie_server, self.max_attempts
        )))
    }

    /// Send one command, acquiring a cookie first if none is held
    ///
    /// Returns the id assigned to the command. Text the server could not
    /// decode (see [`is_wire_safe`]) or too long for one datagram fails with
    /// [`CpError::IllegalMessage`] before an id is used.
    pub fn send_command(&mut self, text: &str) -> Result<u64> {
        if !is_wire_safe(text) {
            return Err(CpError::illegal(format!(
                "command text does not survive the wire: {:?}",
                text
            )));
        }

        let id = self.next_id;
        let frame = encode(&Message::Command(Command::new(id, text)));
        if frame.len() > MAX_PAYLOAD_SIZE {
            return Err(CpError::illegal(format!(
                "command frame of {} bytes exceeds {}",
                frame.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        if self.cookie.is_none() {
            self.acquire_cookie()?;
        }

        self.next_id += 1;
        self.last_sent_id = Some(id);

        tracing::debug!("Sending command {} to {}", id, self.command_server);
        self.transport.send(&frame, &self.command_server)?;

        Ok(id)
    }

    /// Wait for the response to the outstanding command
    ///
    /// Never re-sends. Responses carrying another id are stale and skipped.
    /// A matching response with status `error`, or no match within
    /// `max_attempts` windows, fails with [`CpError::CookieTimeout`].
    pub fn receive_command_response(&mut self) -> Result<CommandResponse> {
        let expected = self
            .last_sent_id
            .ok_or_else(|| CpError::CookieTimeout("no command awaiting a response".to_string()))?;

        let outcome = self.await_response(expected);
        self.last_sent_id = None;
        outcome
    }

    /// Send a command and wait for its response
    pub fn execute(&mut self, text: &str) -> Result<CommandResponse> {
        self.send_command(text)?;
        self.receive_command_response()
    }

    fn await_response(&self, expected: u64) -> Result<CommandResponse> {
        for attempt in 1..=self.max_attempts {
            let deadline = Instant::now() + self.receive_timeout;

            while let Some((message, source)) = next_cp_message(&self.transport, deadline)? {
                let response = match message {
                    Message::CommandResponse(response) => response,
                    other => {
                        tracing::trace!("Ignoring {:?} from {}", other.kind(), source);
                        continue;
                    }
                };

                if response.id != expected {
                    tracing::debug!(
                        "Discarding stale response {} (waiting for {})",
                        response.id,
                        expected
                    );
                    continue;
                }

                if !response.success {
                    return Err(CpError::CookieTimeout(format!(
                        "command {} rejected: {}",
                        expected, response.payload
                    )));
                }
                return Ok(response);
            }

            tracing::debug!(
                "No response to command {} (attempt {}/{})",
                expected,
                attempt,
                self.max_attempts
            );
        }

        Err(CpError::CookieTimeout(format!(
            "no response to command {} after {} attempts",
            expected, self.max_attempts
        )))
    }

    /// Current cookie, if one has been acquired
    pub fn cookie(&self) -> Option<u32> {
        self.cookie
    }

    /// Id the next command will carry
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Id of the command still awaiting a response
    pub fn last_sent_id(&self) -> Option<u64> {
        self.last_sent_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
