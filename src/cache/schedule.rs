//! Expiration Schedule Module
//!
//! One-shot expiration checks ordered by deadline.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

// == Scheduled Check ==
/// A deferred expiration check.
///
/// Only the key and the generation seen when the check was armed are
/// captured. The cache re-resolves the key when the check fires and ignores
/// it unless the generation still matches.
#[derive(Debug, Clone)]
pub struct ScheduledExpiry<K> {
    pub deadline: Instant,
    pub key: K,
    pub generation: u64,
    /// Tie-breaker so checks with equal deadlines fire in arming order
    seq: u64,
}

impl<K> PartialEq for ScheduledExpiry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<K> Eq for ScheduledExpiry<K> {}

impl<K> PartialOrd for ScheduledExpiry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for ScheduledExpiry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

// == Expiration Queue ==
/// Min-heap of pending expiration checks, earliest deadline first.
#[derive(Debug)]
pub struct ExpirationQueue<K> {
    heap: BinaryHeap<Reverse<ScheduledExpiry<K>>>,
    next_seq: u64,
}

impl<K> Default for ExpirationQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ExpirationQueue<K> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    // == Schedule ==
    /// Arms a check for `key` at `deadline`, guarded by `generation`.
    pub fn schedule(&mut self, key: K, generation: u64, deadline: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledExpiry {
            deadline,
            key,
            generation,
            seq,
        }));
    }

    // == Pop Due ==
    /// Removes and returns the earliest check whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<ScheduledExpiry<K>> {
        match self.heap.peek() {
            Some(Reverse(check)) if check.deadline <= now => {
                self.heap.pop().map(|Reverse(check)| check)
            }
            _ => None,
        }
    }

    /// Deadline of the earliest pending check.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(check)| check.deadline)
    }

    /// Keeps only the checks for which `keep(key, generation)` holds.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, u64) -> bool,
    {
        self.heap
            .retain(|Reverse(check)| keep(&check.key, check.generation));
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
