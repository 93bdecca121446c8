//! Session Module
//!
//! Cookie bookkeeping on the cookie server.
//!
//! ## Responsibilities
//! - Issue a random cookie to each requesting peer
//! - Bound the number of distinct peers holding a cookie
//! - Renew an existing peer's cookie in place, without using a new slot
//!
//! Entries never expire. A peer keeps its slot for the lifetime of the
//! process; re-requesting overwrites its cookie and invalidates the old one.

mod table;

pub use table::SessionTable;

use std::time::SystemTime;

/// A session grant held by the cookie server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cookie {
    /// Opaque cookie value sent to the peer
    pub value: u32,

    /// When this value was issued
    pub issued_at: SystemTime,
}
