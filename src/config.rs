//! Configuration for CP
//!
//! Centralized configuration with sensible defaults.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{CpError, Result};

/// Well-known port of the command server
pub const COMMAND_SERVER_PORT: u16 = 2000;

/// Well-known port of the cookie server
pub const COOKIE_SERVER_PORT: u16 = 3000;

/// Main configuration shared by all CP roles
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Addressing
    // -------------------------------------------------------------------------
    /// Where clients send commands
    pub command_server_addr: SocketAddr,

    /// Where clients request cookies
    pub cookie_server_addr: SocketAddr,

    // -------------------------------------------------------------------------
    // Retry / Timeout
    // -------------------------------------------------------------------------
    /// How long a single wait for a reply may block (milliseconds)
    pub receive_timeout_ms: u64,

    /// Number of wait windows before a client operation gives up
    pub max_attempts: u32,

    // -------------------------------------------------------------------------
    // Cookie Server
    // -------------------------------------------------------------------------
    /// Maximum number of distinct peers holding a cookie
    pub session_capacity: usize,

    /// Cookie values are drawn uniformly from `[0, cookie_range)`
    pub cookie_range: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_server_addr: SocketAddr::from(([127, 0, 0, 1], COMMAND_SERVER_PORT)),
            cookie_server_addr: SocketAddr::from(([127, 0, 0, 1], COOKIE_SERVER_PORT)),
            receive_timeout_ms: 2000,
            max_attempts: 3,
            session_capacity: 20,
            cookie_range: 1_000_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Per-attempt receive timeout
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Reject settings that would make the protocol loops meaningless
    pub fn validate(&self) -> Result<()> {
        if self.receive_timeout_ms == 0 {
            return Err(CpError::Config("receive timeout must be positive".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(CpError::Config("max attempts must be at least 1".to_string()));
        }
        if self.session_capacity == 0 {
            return Err(CpError::Config("session capacity must be at least 1".to_string()));
        }
        if self.cookie_range == 0 {
            return Err(CpError::Config("cookie range must be positive".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the command server address
    pub fn command_server_addr(mut self, addr: SocketAddr) -> Self {
        self.config.command_server_addr = addr;
        self
    }

    /// Set the cookie server address
    pub fn cookie_server_addr(mut self, addr: SocketAddr) -> Self {
        self.config.cookie_server_addr = addr;
        self
    }

    /// Set the per-attempt receive timeout (in milliseconds)
    pub fn receive_timeout_ms(mut self, ms: u64) -> Self {
        self.config.receive_timeout_ms = ms;
        self
    }

    /// Set the number of attempts for client retry loops
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set the session table capacity
    pub fn session_capacity(mut self, capacity: usize) -> Self {
        self.config.session_capacity = capacity;
        self
    }

    /// Set the exclusive upper bound of cookie values
    pub fn cookie_range(mut self, range: u32) -> Self {
        self.config.cookie_range = range;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
