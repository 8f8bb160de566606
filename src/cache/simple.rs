use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use parking_lot::RwLock;

use super::Cache;

struct Store<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

/// Cache evicting the oldest inserted key on overflow.
///
/// Reads take the shared lock only; they never affect eviction order.
pub struct SimpleCache<K, V> {
    size: usize,
    store: RwLock<Store<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Clone> SimpleCache<K, V> {
    /// Creates a cache holding at most `size` entries (0 = unbounded)
    pub fn new(size: usize) -> Self {
        SimpleCache {
            size,
            store: RwLock::new(Store {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Keys in insertion order, oldest first
    pub fn keys(&self) -> Vec<K> {
        self.store.read().order.iter().cloned().collect()
    }
}

impl<K, V> Cache<K, V> for SimpleCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.store.read().entries.get(key).cloned()
    }

    fn put(&self, key: K, value: V) {
        let mut store = self.store.write();
        if let Some(slot) = store.entries.get_mut(&key) {
            *slot = value;
            return;
        }
        if self.size > 0 && store.entries.len() >= self.size {
            if let Some(oldest) = store.order.pop_front() {
                store.entries.remove(&oldest);
                tracing::trace!("fifo cache evicted oldest entry");
            }
        }
        store.order.push_back(key.clone());
        store.entries.insert(key, value);
    }

    fn remove(&self, key: &K) -> bool {
        let mut store = self.store.write();
        if store.entries.remove(key).is_some() {
            store.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.store.read().entries.len()
    }

    fn clear(&self) {
        let mut store = self.store.write();
        store.entries.clear();
        store.order.clear();
    }

    fn capacity(&self) -> usize {
        self.size
    }
}
