//! Cache Store Module
//!
//! Main cache engine combining a key index and a recency-ordered entry list
//! with LRU eviction and sliding TTL expiration.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tracing::debug;

use crate::cache::entry::normalize_ttl;
use crate::cache::{
    CacheEntry, CacheStats, Clock, EntryList, ExpirationQueue, Handle, SystemClock,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Pending checks tolerated per live entry before stale ones are purged
const COMPACT_FACTOR: usize = 4;
/// Queue length below which compaction is never attempted
const COMPACT_MIN: usize = 64;

// == Cache Store ==
/// In-memory cache with LRU eviction and per-entry sliding TTL.
///
/// Every read or write of a key makes it the most recently used entry and
/// restarts its TTL countdown. Expiration checks are queued with the
/// generation the entry had when they were armed; a check only removes the
/// entry if nothing touched it since.
///
/// Not internally synchronized. Share it as [`crate::SharedCache`] when
/// several tasks need it.
#[derive(Debug)]
pub struct CacheStore<K, V, C = SystemClock> {
    /// Key to list handle lookup
    index: HashMap<K, Handle>,
    /// Entries from most to least recently used
    entries: EntryList<CacheEntry<K, V>>,
    /// Pending expiration checks
    expirations: ExpirationQueue<K>,
    /// Source of generations, never reused
    next_generation: u64,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    clock: C,
    /// Signalled when a check is armed ahead of every pending one
    expiration_waker: Option<Arc<Notify>>,
}

impl<K, V> CacheStore<K, V, SystemClock>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_clock(capacity, SystemClock)
    }

    /// Creates a CacheStore sized from a validated configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.capacity)
    }
}

impl<K, V, C> CacheStore<K, V, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    /// Creates a new CacheStore reading time from `clock`.
    pub fn with_clock(capacity: usize, clock: C) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        Ok(Self {
            index: HashMap::with_capacity(capacity),
            entries: EntryList::with_capacity(capacity),
            expirations: ExpirationQueue::new(),
            next_generation: 0,
            stats: CacheStats::new(),
            capacity,
            clock,
            expiration_waker: None,
        })
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit marks the entry most recently used and restarts its TTL from now.
    /// A miss has no side effects besides the statistics.
    ///
    /// # Arguments
    /// * `key` - The key to retrieve
    ///
    /// # Returns
    /// - `Some(&value)` if the key is present and its TTL has not run out
    /// - `None` otherwise
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.run_expirations();

        let Some(&handle) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.stats.record_hit();
        self.renew(handle);
        self.entries.get(handle).map(|entry| &entry.value)
    }

    // == Set ==
    /// Stores a key-value pair with an optional TTL.
    ///
    /// `None` or a zero TTL means the entry never expires. An existing key is
    /// updated in place. A new key evicts the least recently used entry first
    /// when the cache is full.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Sliding time-to-live, restarted on every access
    pub fn set(&mut self, key: K, value: V, ttl: Option<Duration>) {
        self.run_expirations();

        let ttl = normalize_ttl(ttl);

        if let Some(&handle) = self.index.get(&key) {
            if let Some(entry) = self.entries.get_mut(handle) {
                entry.value = value;
                entry.ttl = ttl;
            }
            self.renew(handle);
            return;
        }

        if self.index.len() >= self.capacity {
            self.evict_lru();
        }

        let handle = self
            .entries
            .append(CacheEntry::new(key.clone(), value, ttl));
        self.index.insert(key, handle);
        self.renew(handle);
        self.stats.set_total_entries(self.index.len());
    }

    // == Remove ==
    /// Removes an entry by key and returns its value.
    ///
    /// Pending expiration checks for the key are left in place; they no
    /// longer match anything and fire as no-ops.
    ///
    /// # Arguments
    /// * `key` - The key to remove
    ///
    /// # Returns
    /// The removed value, or `None` if the key was not present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.run_expirations();
        self.detach(key)
    }

    // == Remove All ==
    /// Empties the cache and drops every pending expiration check.
    pub fn remove_all(&mut self) {
        let removed = self.index.len();
        self.index.clear();
        self.entries.clear();
        self.expirations.clear();
        self.stats.set_total_entries(0);
        debug!(removed, "Cache cleared");
    }

    // == Run Expirations ==
    /// Fires every expiration check that is due.
    ///
    /// A check removes its entry only if the key is still present and the
    /// entry's generation equals the one captured when the check was armed.
    ///
    /// Returns the number of entries removed.
    pub fn run_expirations(&mut self) -> usize {
        let now = self.clock.now();
        let mut expired = 0;

        while let Some(check) = self.expirations.pop_due(now) {
            let live = self
                .index
                .get(&check.key)
                .and_then(|&handle| self.entries.get(handle))
                .is_some_and(|entry| entry.generation == check.generation);

            if live {
                self.detach(&check.key);
                self.stats.record_expiration();
                expired += 1;
            }
        }

        if expired > 0 {
            debug!(expired, remaining = self.index.len(), "Expired cache entries");
        }
        expired
    }

    // == Expiration Queries ==
    /// Deadline of the earliest pending expiration check.
    ///
    /// The check may turn out to be stale when it fires.
    pub fn next_expiration(&self) -> Option<Instant> {
        self.expirations.next_deadline()
    }

    /// Time left until the earliest pending check is due, zero if overdue.
    pub fn time_until_next_expiration(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.next_expiration()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Remaining TTL of an entry without touching it.
    ///
    /// Returns `None` for a missing key or an entry that never expires.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key)?.ttl_remaining(self.clock.now())
    }

    // == Contains ==
    /// Checks whether a key is present without marking it used.
    ///
    /// Entries past their deadline count as absent even before their check
    /// has fired.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key).is_some()
    }

    // == Iter ==
    /// Iterates live entries from most to least recently used without
    /// touching them.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.live_entries()
            .map(|entry| (&entry.key, &entry.value))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    // == Length ==
    /// Returns the number of live entries in the cache.
    ///
    /// Agrees with what `get` would find: entries past their deadline are
    /// not counted even if their check has not fired yet.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        match self.expirations.next_deadline() {
            Some(deadline) if deadline <= now => self.live_entries().count(),
            _ => self.index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of armed checks, stale ones included.
    pub fn pending_expirations(&self) -> usize {
        self.expirations.len()
    }

    /// Registers a waker signalled whenever a check is armed with a deadline
    /// earlier than every pending one.
    pub fn set_expiration_waker(&mut self, waker: Arc<Notify>) {
        self.expiration_waker = Some(waker);
    }

    // == Internals ==
    /// Marks an entry most recently used and re-arms its expiration.
    fn renew(&mut self, handle: Handle) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let now = self.clock.now();

        self.entries.move_to_front(handle);
        let Some(entry) = self.entries.get_mut(handle) else {
            return;
        };

        entry.generation = generation;
        // A deadline past the end of representable time never comes.
        entry.expires_at = entry.ttl.and_then(|ttl| now.checked_add(ttl));
        if let Some(deadline) = entry.expires_at {
            let earliest = self.expirations.next_deadline();
            self.expirations
                .schedule(entry.key.clone(), generation, deadline);
            if earliest.map_or(true, |earliest| deadline < earliest) {
                if let Some(waker) = &self.expiration_waker {
                    waker.notify_one();
                }
            }
        }

        self.compact_expirations();
    }

    /// Resolves a key to an entry whose deadline has not passed.
    fn live_entry<Q>(&self, key: &Q) -> Option<&CacheEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &handle = self.index.get(key)?;
        let entry = self.entries.get(handle)?;
        (!entry.is_expired(self.clock.now())).then_some(entry)
    }

    fn live_entries(&self) -> impl Iterator<Item = &CacheEntry<K, V>> + '_ {
        let now = self.clock.now();
        self.entries.iter().filter(move |entry| !entry.is_expired(now))
    }

    /// Drops the entry at the tail of the list.
    fn evict_lru(&mut self) {
        let Some(handle) = self.entries.last() else {
            return;
        };
        if let Some(entry) = self.entries.remove(handle) {
            self.index.remove(&entry.key);
            self.stats.record_eviction();
            debug!(capacity = self.capacity, "Evicted least recently used entry");
        }
    }

    /// Removes an entry from both the index and the list.
    fn detach<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(key)?;
        let entry = self.entries.remove(handle)?;
        self.stats.set_total_entries(self.index.len());
        Some(entry.value)
    }

    /// Purges stale checks once they outnumber live entries by a wide margin.
    fn compact_expirations(&mut self) {
        let limit = (self.index.len() * COMPACT_FACTOR).max(COMPACT_MIN);
        if self.expirations.len() <= limit {
            return;
        }

        let index = &self.index;
        let entries = &self.entries;
        self.expirations.retain(|key, generation| {
            index
                .get(key)
                .and_then(|&handle| entries.get(handle))
                .is_some_and(|entry| entry.generation == generation)
        });
    }
}

// == Display ==
/// Human-readable dump of every live entry, most recently used first.
impl<K, V, C> fmt::Display for CacheStore<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let now = self.clock.now();
        let live: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .collect();
        writeln!(
            f,
            "LruCache(count: {}, capacity: {}) {{",
            live.len(),
            self.capacity
        )?;
        for entry in live {
            match entry.ttl_remaining(now) {
                Some(remaining) => writeln!(
                    f,
                    "  [{:?}: {:?}, expires in {:.3}s]",
                    entry.key,
                    entry.value,
                    remaining.as_secs_f64()
                )?,
                None => writeln!(f, "  [{:?}: {:?}, never expires]", entry.key, entry.value)?,
            }
        }
        write!(f, "}}")
    }
}
