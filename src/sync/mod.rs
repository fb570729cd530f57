//! sync
//!
//! Keyed mutual exclusion and the single-flight cache built on it.
//!
//! These are the only pieces of shared mutable state that resolver
//! workers touch; everything else in a batch is worker-local.

pub mod keyed_lock;
pub mod single_flight;

pub use keyed_lock::{KeyGuard, KeyedLock};
pub use single_flight::SingleFlightCache;
