//! TTL Expiration Task
//!
//! Background task that fires due expiration checks on a shared cache.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStore, Clock, SystemClock};

/// Cache shared between tasks. All access, expiration included, goes
/// through the lock.
pub type SharedCache<K, V, C = SystemClock> = Arc<RwLock<CacheStore<K, V, C>>>;

/// Wraps a cache for sharing with [`spawn_expiration_task`].
pub fn shared<K, V, C>(cache: CacheStore<K, V, C>) -> SharedCache<K, V, C> {
    Arc::new(RwLock::new(cache))
}

/// Spawns a background task that removes entries as their TTL runs out.
///
/// The task sleeps until the earliest pending deadline, or `max_interval`
/// when nothing is pending. It registers a waker on the cache, so a check
/// armed ahead of every pending one while it sleeps cuts the sleep short.
/// When a deadline comes due it takes the write lock and fires every due
/// check.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort it.
///
/// # Example
/// ```ignore
/// let cache = shared(CacheStore::new(1000)?);
/// let handle = spawn_expiration_task(cache.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_expiration_task<K, V, C>(
    cache: SharedCache<K, V, C>,
    max_interval: Duration,
) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting TTL expiration task with max interval of {:?}",
            max_interval
        );

        let waker = Arc::new(Notify::new());
        cache.write().await.set_expiration_waker(waker.clone());

        loop {
            let wait = {
                let cache_guard = cache.read().await;
                cache_guard.time_until_next_expiration()
            }
            .map_or(max_interval, |until| until.min(max_interval));

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = waker.notified() => {
                    debug!("TTL expiration: earlier deadline armed");
                    continue;
                }
            }

            let (expired, remaining) = {
                let mut cache_guard = cache.write().await;
                let expired = cache_guard.run_expirations();
                (expired, cache_guard.len())
            };

            if expired > 0 {
                info!(expired, remaining, "TTL expiration: removed expired entries");
            } else {
                debug!("TTL expiration: no entries due");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_expiration_task_removes_expired_entries() {
        let cache = shared(CacheStore::new(100).unwrap());

        {
            let mut cache_guard = cache.write().await;
            cache_guard.set(
                "expire_soon".to_string(),
                "value".to_string(),
                Some(Duration::from_millis(100)),
            );
        }

        let handle = spawn_expiration_task(cache.clone(), TICK);

        tokio::time::sleep(Duration::from_millis(400)).await;

        {
            // Checked without `get`, which would fire due checks itself.
            let cache_guard = cache.read().await;
            assert!(
                !cache_guard.contains_key("expire_soon"),
                "Expired entry should have been removed by the task"
            );
            assert_eq!(cache_guard.stats().expirations, 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_expiration_task_preserves_valid_entries() {
        let cache = shared(CacheStore::new(100).unwrap());

        {
            let mut cache_guard = cache.write().await;
            cache_guard.set(
                "long_lived".to_string(),
                "value".to_string(),
                Some(Duration::from_secs(3600)),
            );
            cache_guard.set("forever".to_string(), "value".to_string(), None);
        }

        let handle = spawn_expiration_task(cache.clone(), TICK);

        tokio::time::sleep(Duration::from_millis(200)).await;

        {
            let cache_guard = cache.read().await;
            assert!(cache_guard.contains_key("long_lived"));
            assert!(cache_guard.contains_key("forever"));
            assert_eq!(cache_guard.len(), 2);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_expiration_task_wakes_for_short_ttl() {
        let cache = shared(CacheStore::new(100).unwrap());

        // Empty cache: the task goes to sleep for the full interval.
        let handle = spawn_expiration_task(cache.clone(), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(50)).await;

        cache
            .write()
            .await
            .set("short".to_string(), 1, Some(Duration::from_millis(50)));

        tokio::time::sleep(Duration::from_millis(400)).await;

        {
            let cache_guard = cache.read().await;
            assert!(!cache_guard.contains_key("short"));
            assert_eq!(
                cache_guard.stats().expirations,
                1,
                "Task should have fired the check instead of sleeping through it"
            );
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_expiration_task_can_be_aborted() {
        let cache = shared(CacheStore::<String, String>::new(100).unwrap());

        let handle = spawn_expiration_task(cache, TICK);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
