//! sync::single_flight
//!
//! Keyed cache with at most one in-flight computation per key.
//!
//! # Design
//!
//! `get_or_compute` acquires the [`KeyedLock`] for the key, consults the
//! value map, and only on a miss runs the supplied computation — still
//! inside the key's critical section, so N concurrent callers for one key
//! collapse into a single computation whose result all of them observe.
//!
//! Successful results are cached monotonically, including "negative"
//! results such as an empty history: deciding whether an empty value is
//! worth retrying belongs to the caller's computation, not the cache (the
//! history resolver retries annotate a bounded number of times *inside*
//! its compute closure, so the retries stay under the single-flight
//! lock). A computation that returns `Err` is never cached; the next
//! caller for that key runs it again.
//!
//! # Example
//!
//! ```
//! use blamecast::sync::SingleFlightCache;
//!
//! # tokio_test::block_on(async {
//! let cache: SingleFlightCache<String, usize> = SingleFlightCache::new();
//! let value = cache
//!     .get_or_compute("src/lib.rs".to_string(), |path| async move {
//!         Ok::<_, std::io::Error>(path.len())
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(value, 10);
//! # });
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;

use super::keyed_lock::KeyedLock;

/// Memoizes a fallible, possibly expensive computation per key.
#[derive(Debug, Default)]
pub struct SingleFlightCache<K, V> {
    /// Per-key mutual exclusion for the compute path.
    locks: KeyedLock,
    /// Committed values.
    values: Mutex<HashMap<K, V>>,
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            locks: KeyedLock::new(),
            values: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, computing and committing it on
    /// a miss.
    ///
    /// Holds the key's lock across the whole call, so at most one
    /// computation is in flight per key and every concurrent caller gets
    /// the same value.
    ///
    /// # Errors
    ///
    /// Propagates the computation's error. The error is not cached: a
    /// subsequent call for the same key invokes the computation again.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let _guard = self.locks.acquire(&key).await;

        if let Some(value) = self.peek(&key) {
            return Ok(value);
        }

        let value = compute(key.clone()).await?;
        self.values
            .lock()
            .expect("cache map poisoned")
            .insert(key, value.clone());
        Ok(value)
    }

    /// Return the committed value for `key` without computing.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.values
            .lock()
            .expect("cache map poisoned")
            .get(key)
            .cloned()
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.values.lock().expect("cache map poisoned").len()
    }

    /// True when no entry has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("compute failed")]
    struct ComputeFailed;

    #[tokio::test]
    async fn concurrent_callers_share_one_computation() {
        let cache: Arc<SingleFlightCache<String, u64>> = Arc::new(SingleFlightCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..10 {
            let cache = cache.clone();
            let calls = calls.clone();
            tasks.spawn(async move {
                cache
                    .get_or_compute("k".to_string(), |_| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        // Linger so the other callers pile up on the key.
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok::<_, ComputeFailed>(7)
                    })
                    .await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            results.push(joined.expect("task panicked").expect("compute failed"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1, "exactly one computation");
        assert!(results.iter().all(|v| *v == 7));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_compute_in_parallel() {
        let cache: Arc<SingleFlightCache<String, u64>> = Arc::new(SingleFlightCache::new());
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        // Key "slow" parks inside its computation until released.
        let slow = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute("slow".to_string(), |_| async move {
                        let _ = release_rx.await;
                        Ok::<_, ComputeFailed>(1)
                    })
                    .await
            })
        };

        // Key "fast" must complete while "slow" is still parked.
        let fast = tokio::time::timeout(
            Duration::from_secs(1),
            cache.get_or_compute("fast".to_string(), |_| async move {
                Ok::<_, ComputeFailed>(2)
            }),
        )
        .await
        .expect("'fast' must not wait on 'slow'")
        .expect("compute failed");
        assert_eq!(fast, 2);

        release_tx.send(()).expect("release");
        let slow = slow.await.expect("join").expect("compute failed");
        assert_eq!(slow, 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache: SingleFlightCache<String, u64> = SingleFlightCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute("k".to_string(), |_| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<u64, _>(ComputeFailed)
            })
            .await;
        assert!(first.is_err());
        assert!(cache.is_empty());

        let second = cache
            .get_or_compute("k".to_string(), |_| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ComputeFailed>(3)
            })
            .await;
        assert_eq!(second.expect("second compute"), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn hit_does_not_recompute() {
        let cache: SingleFlightCache<u32, String> = SingleFlightCache::new();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        for _ in 0..3 {
            let value = cache
                .get_or_compute(5, |key| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ComputeFailed>(format!("v{key}"))
                })
                .await
                .expect("compute");
            assert_eq!(value, "v5");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_value_is_cached_like_any_other() {
        // Retry-on-empty is the caller's policy; the cache itself commits
        // whatever the computation returns.
        let cache: SingleFlightCache<String, Vec<u32>> = SingleFlightCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_compute("k".to_string(), |_| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ComputeFailed>(Vec::new())
                })
                .await
                .expect("compute");
            assert!(value.is_empty());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
