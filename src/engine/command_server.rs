//! Command server role

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::handler::CommandHandler;
use crate::protocol::{encode, is_wire_safe, CommandResponse, Message};
use crate::transport::{Datagram, Transport, MAX_PAYLOAD_SIZE};

use super::decode_cp;

/// Sent in place of a payload the client could not decode
pub const PAYLOAD_NOT_TRANSMITTABLE: &str = "response payload not transmittable";

/// Sent in place of a response too large for one datagram
pub const RESPONSE_TOO_LARGE: &str = "response too large";

/// Executes commands and answers with correlated responses
///
/// Cookies are not checked here. The response goes back to the frame's
/// source and echoes the command id.
pub struct CommandServer<T: Transport, H: CommandHandler> {
    transport: T,
    handler: H,
    poll_timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl<T: Transport, H: CommandHandler> CommandServer<T, H> {
    pub fn new(transport: T, handler: H, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            handler,
            poll_timeout: config.receive_timeout(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Serve until shutdown is requested or the transport fails
    pub fn run(&self) -> Result<()> {
        tracing::info!("Command server listening on {}", self.transport.local_addr());

        while !self.shutdown.load(Ordering::Relaxed) {
            self.serve_once(self.poll_timeout)?;
        }

        tracing::info!("Command server stopped");
        Ok(())
    }

    /// Process at most one inbound frame
    ///
    /// Returns `false` if nothing arrived within `timeout`.
    pub fn serve_once(&self, timeout: Duration) -> Result<bool> {
        match self.transport.receive(timeout)? {
            Some(datagram) => {
                self.handle(&datagram)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn handle(&self, datagram: &Datagram) -> Result<()> {
        let command = match decode_cp(datagram) {
            Some(Message::Command(command)) => command,
            Some(other) => {
                tracing::trace!(
                    "Command server ignoring {:?} from {}",
                    other.kind(),
                    datagram.source
                );
                return Ok(());
            }
            None => return Ok(()),
        };

        tracing::debug!(
            "Executing command {} from {}: {:?}",
            command.id,
            datagram.source,
            command.text
        );
        let outcome = self.handler.handle(&command.text);

        let mut frame = if is_wire_safe(&outcome.payload) {
            encode(&Message::CommandResponse(CommandResponse::new(
                command.id,
                outcome.success,
                outcome.payload,
            )))
        } else {
            tracing::warn!(
                "Response to command {} has whitespace the client cannot decode",
                command.id
            );
            error_frame(command.id, PAYLOAD_NOT_TRANSMITTABLE)
        };

        if frame.len() > MAX_PAYLOAD_SIZE {
            tracing::warn!(
                "Response to command {} is {} bytes, over the {} byte limit",
                command.id,
                frame.len(),
                MAX_PAYLOAD_SIZE
            );
            frame = error_frame(command.id, RESPONSE_TOO_LARGE);
        }

        self.transport.send(&frame, &datagram.source)
    }

    /// Flag that stops [`run`](Self::run) after the current poll
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }
}

fn error_frame(id: u64, reason: &str) -> String {
    encode(&Message::CommandResponse(CommandResponse::new(id, false, reason)))
}
