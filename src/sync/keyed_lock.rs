//! sync::keyed_lock
//!
//! Mutual exclusion keyed by an arbitrary value.
//!
//! # Design
//!
//! Each distinct key (serialized to a stable string) owns its own lock
//! handle. The map of handles is itself guarded, but that guard is held
//! only long enough to get-or-create a handle, never for the duration of
//! a caller's critical section. Two callers with equal serialized keys
//! never execute their critical sections concurrently; callers with
//! different keys proceed fully in parallel.
//!
//! Handles are retained for the lifetime of the lock. That is acceptable
//! here: the key population of one pipeline run (file paths, revision
//! ids) is bounded, and the lock does not outlive the run.
//!
//! # Example
//!
//! ```
//! use blamecast::sync::KeyedLock;
//!
//! # tokio_test::block_on(async {
//! let lock = KeyedLock::new();
//! let guard = lock.acquire(&"src/lib.rs").await;
//! // exclusive for "src/lib.rs" until `guard` drops
//! drop(guard);
//! # });
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Grants an exclusive critical section per serialized key.
#[derive(Debug, Default)]
pub struct KeyedLock {
    /// Per-key lock handles, guarded only during get-or-create.
    handles: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Guard for one key's critical section (RAII: released on drop).
#[derive(Debug)]
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLock {
    /// Create a lock with no keys yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusive lock for `key`, waiting if another caller
    /// currently holds it.
    ///
    /// The key is serialized with its `Display` impl; keys with equal
    /// serializations share one lock.
    pub async fn acquire<K: Display + ?Sized>(&self, key: &K) -> KeyGuard {
        let handle = self.handle_for(&key.to_string());
        KeyGuard {
            _guard: handle.lock_owned().await,
        }
    }

    /// Get or create the handle for a serialized key.
    ///
    /// The map guard is released before the caller awaits the handle, so
    /// contention on one key never blocks handle lookup for another.
    fn handle_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut handles = self.handles.lock().expect("keyed lock map poisoned");
        handles
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Number of distinct keys seen so far.
    pub fn key_count(&self) -> usize {
        self.handles.lock().expect("keyed lock map poisoned").len()
    }
}
