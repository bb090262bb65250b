//! Background Tasks Module
//!
//! Contains background tasks that drive a shared cache.
//!
//! # Tasks
//! - Expiration: fires due TTL checks while holding the cache's write lock

mod expiration;

pub use expiration::{shared, spawn_expiration_task, SharedCache};
