//! Bounded key/value caches
//!
//! Two eviction policies share the [`Cache`] contract: [`SimpleCache`] evicts
//! in insertion order, [`LruCache`] evicts the least recently used key. Both
//! serialize access through one read-write lock per instance.

mod lru;
mod simple;

use std::hash::Hash;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use self::lru::LruCache;
pub use self::simple::SimpleCache;

/// Fixed-capacity key/value store safe for concurrent use
pub trait Cache<K, V>: Send + Sync {
    /// Looks up a key, returning a clone of its value
    fn get(&self, key: &K) -> Option<V>;
    /// Inserts or replaces a key, evicting one entry on overflow
    fn put(&self, key: K, value: V);
    /// Removes a key, returning whether it was present
    fn remove(&self, key: &K) -> bool;
    /// Number of stored entries
    fn len(&self) -> usize;
    /// True when nothing is stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Drops every entry
    fn clear(&self);
    /// Configured capacity, 0 meaning unbounded
    fn capacity(&self) -> usize;
}

/// Eviction policy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Evict the oldest inserted key regardless of reads
    Fifo,
    /// Evict the least recently read or written key
    #[default]
    Lru,
}

/// Builds a shareable cache with the given policy and capacity (0 = unbounded)
pub fn new_cache<K, V>(policy: CachePolicy, capacity: usize) -> Arc<dyn Cache<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    match policy {
        CachePolicy::Fifo => Arc::new(SimpleCache::new(capacity)),
        CachePolicy::Lru => Arc::new(LruCache::new(capacity)),
    }
}
