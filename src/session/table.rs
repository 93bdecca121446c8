//! Session table implementation
//!
//! HashMap-based table guarded by a single Mutex.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::SystemTime;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Cookie;

/// Bounded map from peer address to its current cookie
///
/// ## Concurrency
/// The capacity check and the insert/overwrite happen under one lock, so
/// concurrent `grant` calls can never push the table past its capacity.
/// The RNG lives inside the same lock.
pub struct SessionTable {
    inner: Mutex<Inner>,

    /// Maximum number of distinct peers
    capacity: usize,

    /// Cookie values are drawn from `[0, cookie_range)`
    cookie_range: u32,
}

struct Inner {
    cookies: HashMap<SocketAddr, Cookie>,
    rng: StdRng,
}

impl SessionTable {
    /// Create an empty table with an entropy-seeded RNG
    pub fn new(capacity: usize, cookie_range: u32) -> Self {
        Self::with_rng(capacity, cookie_range, StdRng::from_entropy())
    }

    /// Create an empty table with a deterministic RNG
    pub fn with_seed(capacity: usize, cookie_range: u32, seed: u64) -> Self {
        Self::with_rng(capacity, cookie_range, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, cookie_range: u32, rng: StdRng) -> Self {
        Self {
            inner: Mutex::new(Inner {
                cookies: HashMap::with_capacity(capacity),
                rng,
            }),
            capacity,
            cookie_range: cookie_range.max(1),
        }
    }

    /// Issue or renew a cookie for `address`
    ///
    /// Returns `None` when `address` is new and the table is already full.
    pub fn grant(&self, address: SocketAddr) -> Option<Cookie> {
        let mut inner = self.inner.lock();

        if !inner.cookies.contains_key(&address) && inner.cookies.len() >= self.capacity {
            tracing::debug!(
                "Session table full ({} entries), rejecting {}",
                self.capacity,
                address
            );
            return None;
        }

        let cookie = Cookie {
            value: inner.rng.gen_range(0..self.cookie_range),
            issued_at: SystemTime::now(),
        };

        match inner.cookies.insert(address, cookie) {
            Some(previous) => tracing::debug!(
                "Renewed cookie for {} ({} -> {})",
                address,
                previous.value,
                cookie.value
            ),
            None => tracing::debug!("Issued cookie {} to {}", cookie.value, address),
        }

        Some(cookie)
    }

    /// Current cookie of `address`, if any
    pub fn lookup(&self, address: &SocketAddr) -> Option<Cookie> {
        self.inner.lock().cookies.get(address).copied()
    }

    /// Number of peers holding a cookie
    pub fn len(&self) -> usize {
        self.inner.lock().cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
