//! In-memory link
//!
//! Datagram fabric on crossbeam channels. Frames sent to an address nobody is
//! bound to are dropped, as on UDP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;

use crate::error::{CpError, Result};
use super::{Datagram, LinkAddress, Transport};

/// Shared registry of bound in-memory endpoints
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    inboxes: Arc<RwLock<HashMap<SocketAddr, Sender<Datagram>>>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an endpoint at `addr`
    pub fn bind(&self, addr: SocketAddr) -> Result<MemoryLink> {
        let mut inboxes = self.inboxes.write();
        if inboxes.contains_key(&addr) {
            return Err(CpError::Transport(format!("address {} already bound", addr)));
        }

        let (tx, rx) = channel::unbounded();
        inboxes.insert(addr, tx);

        Ok(MemoryLink {
            local_addr: addr,
            inbox: rx,
            network: self.clone(),
        })
    }

    fn deliver(&self, datagram: Datagram, to: SocketAddr) {
        match self.inboxes.read().get(&to) {
            Some(inbox) => {
                // the receiver lives as long as its registration
                let _ = inbox.send(datagram);
            }
            None => tracing::trace!("No endpoint at {}, dropping frame", to),
        }
    }

    fn unbind(&self, addr: &SocketAddr) {
        self.inboxes.write().remove(addr);
    }
}

/// One endpoint on a [`MemoryNetwork`]
pub struct MemoryLink {
    local_addr: SocketAddr,
    inbox: Receiver<Datagram>,
    network: MemoryNetwork,
}

impl MemoryLink {
    /// Number of frames waiting to be received
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    /// Take every waiting frame without blocking
    pub fn drain(&self) -> Vec<Datagram> {
        self.inbox.try_iter().collect()
    }
}

impl Transport for MemoryLink {
    fn send(&self, payload: &str, destination: &LinkAddress) -> Result<()> {
        let datagram = Datagram {
            payload: payload.to_string(),
            source: LinkAddress::new(self.local_addr, destination.protocol),
        };
        self.network.deliver(datagram, destination.socket);
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<Option<Datagram>> {
        match self.inbox.recv_timeout(timeout) {
            Ok(datagram) => Ok(Some(datagram)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(CpError::Transport(format!(
                "link {} disconnected",
                self.local_addr
            ))),
        }
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        self.network.unbind(&self.local_addr);
    }
}
