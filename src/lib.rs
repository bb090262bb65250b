//! LRU Expire - An in-memory key-value cache
//!
//! Combines least-recently-used capacity eviction with per-entry sliding
//! TTL expiration.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{ttl_from_secs, CacheStats, CacheStore, Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{shared, spawn_expiration_task, SharedCache};
