//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// Key the entry is indexed under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Bumped on every insert, update or read
    pub generation: u64,
    /// Sliding time-to-live, None = never expires
    pub ttl: Option<Duration>,
    /// Deadline of the most recently armed expiration check
    pub expires_at: Option<Instant>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new, not yet armed, cache entry.
    ///
    /// A zero TTL is treated as no TTL.
    pub fn new(key: K, value: V, ttl: Option<Duration>) -> Self {
        Self {
            key,
            value,
            generation: 0,
            ttl: normalize_ttl(ttl),
            expires_at: None,
        }
    }

    // == Is Expired ==
    /// Checks if the entry's deadline has passed at `now`.
    ///
    /// Boundary condition: an entry is expired once `now` reaches the
    /// deadline, matching when its expiration check becomes due.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL at `now`, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the deadline has passed
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }
}

// == Utility Functions ==
/// Drops zero durations, which mean "never expires".
pub(crate) fn normalize_ttl(ttl: Option<Duration>) -> Option<Duration> {
    ttl.filter(|ttl| !ttl.is_zero())
}

/// Converts a TTL in seconds where zero or negative means "never expires".
///
/// Non-finite values and values too large for a `Duration` also map to `None`.
pub fn ttl_from_secs(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}
