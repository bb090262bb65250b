//! Cache Module
//!
//! Provides an in-memory cache with LRU eviction and sliding TTL expiration.

mod clock;
mod entry;
mod list;
mod schedule;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{ttl_from_secs, CacheEntry};
pub use list::{EntryList, Handle, Iter};
pub use schedule::{ExpirationQueue, ScheduledExpiry};
pub use stats::CacheStats;
pub use store::CacheStore;
