use std::hash::Hash;
use std::num::NonZeroUsize;

use parking_lot::RwLock;

use super::Cache;

/// Cache evicting the least recently used key.
///
/// Entries are kept on the doubly linked recency list of [`::lru::LruCache`].
/// A read re-links the touched node, so `get` takes the exclusive lock.
pub struct LruCache<K: Hash + Eq, V> {
    size: usize,
    inner: RwLock<::lru::LruCache<K, V>>,
}

impl<K: Hash + Eq, V: Clone> LruCache<K, V> {
    /// Creates a cache holding at most `size` entries (0 = unbounded)
    pub fn new(size: usize) -> Self {
        let inner = match NonZeroUsize::new(size) {
            Some(cap) => ::lru::LruCache::new(cap),
            None => ::lru::LruCache::unbounded(),
        };
        LruCache {
            size,
            inner: RwLock::new(inner),
        }
    }

    /// Looks at a value without touching its recency
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.read().peek(key).cloned()
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.inner.write().get(key).cloned()
    }

    fn put(&self, key: K, value: V) {
        if self.inner.write().push(key, value).is_some() {
            tracing::trace!("lru cache evicted or replaced an entry");
        }
    }

    fn remove(&self, key: &K) -> bool {
        self.inner.write().pop(key).is_some()
    }

    fn len(&self) -> usize {
        self.inner.read().len()
    }

    fn clear(&self) {
        self.inner.write().clear();
    }

    fn capacity(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_refreshes_recency() {
        let cache = LruCache::new(3);
        cache.put(0, 1);
        cache.put(1, 1);
        cache.put(2, 1);
        cache.get(&0);
        cache.put(3, 1);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&0), Some(1));
    }

    #[test]
    fn test_peek_does_not_refresh() {
        let cache = LruCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.peek(&"a"), Some(1));
        cache.put("c", 3);
        assert_eq!(cache.peek(&"a"), None);
    }

    #[test]
    fn test_remove_reports_presence() {
        let cache = LruCache::new(0);
        cache.put(7, "seven");
        assert!(cache.remove(&7));
        assert!(!cache.remove(&7));
    }
}
