//! # CP
//!
//! A small command protocol over an unreliable virtual datagram link:
//! - Single-line text frames with CRC32 integrity checksums
//! - Cookie handshake before the first command
//! - Id-based request/response correlation with bounded retries
//! - Bounded per-peer session table on the cookie server
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   cookie_request / cookie_response   ┌───────────────┐
//! │    Client    │ ◄──────────────────────────────────► │ Cookie Server │
//! │ (engine)     │                                      │ SessionTable  │
//! └──────┬───────┘                                      └───────────────┘
//!        │ command / command_response
//!        ▼
//! ┌──────────────┐         ┌────────────────┐
//! │Command Server│ ──────► │ CommandHandler │
//! │ (engine)     │ ◄────── │  (text → text) │
//! └──────────────┘         └────────────────┘
//!
//!   every arrow: protocol codec ─► Transport (UDP link / in-memory link)
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod session;
pub mod transport;
pub mod handler;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CpError, Result};
pub use config::Config;
pub use engine::{Client, CommandServer, CookieServer};
pub use handler::{BuiltinHandler, CommandHandler, CommandOutcome};
pub use transport::{LinkAddress, ProtocolId, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cproto
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
