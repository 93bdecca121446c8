//! Cookie server role

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{encode, CookieResponse, Message};
use crate::session::SessionTable;
use crate::transport::{Datagram, Transport};

use super::decode_cp;

/// Reason sent to peers when the session table is full
pub const COOKIE_LIMIT_REACHED: &str = "cookie limit reached";

/// Issues cookies to requesting peers
///
/// Malformed frames and non-request messages are dropped; only transport
/// failures end the serve loop.
pub struct CookieServer<T: Transport> {
    transport: T,
    sessions: Arc<SessionTable>,
    poll_timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl<T: Transport> CookieServer<T> {
    pub fn new(transport: T, config: &Config) -> Result<Self> {
        config.validate()?;
        let sessions = SessionTable::new(config.session_capacity, config.cookie_range);
        Ok(Self::with_sessions(transport, Arc::new(sessions), config))
    }

    /// Serve from an existing table
    pub fn with_sessions(transport: T, sessions: Arc<SessionTable>, config: &Config) -> Self {
        Self {
            transport,
            sessions,
            poll_timeout: config.receive_timeout(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Serve until shutdown is requested or the transport fails
    pub fn run(&self) -> Result<()> {
        tracing::info!("Cookie server listening on {}", self.transport.local_addr());

        while !self.shutdown.load(Ordering::Relaxed) {
            self.serve_once(self.poll_timeout)?;
        }

        tracing::info!("Cookie server stopped");
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
        let Some(message) = decode_cp(datagram) else {
            return Ok(());
        };

        if message != Message::CookieRequest {
            tracing::trace!(
                "Cookie server ignoring {:?} from {}",
                message.kind(),
                datagram.source
            );
            return Ok(());
        }

        let reply = match self.sessions.grant(datagram.source.socket) {
            Some(cookie) => CookieResponse::Granted(cookie.value),
            None => {
                tracing::warn!("Rejecting cookie request from {}: table full", datagram.source);
                CookieResponse::Rejected(COOKIE_LIMIT_REACHED.to_string())
            }
        };

        self.transport
            .send(&encode(&Message::CookieResponse(reply)), &datagram.source)
    }

    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    /// Flag that stops [`run`](Self::run) after the current poll
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }
}
