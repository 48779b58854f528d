//! Least-recently-used eviction cache.
//!
//! A generic fixed-capacity key→value store that knows *ordering*, not
//! *policy*: it can say which entry is least recently used and hand it
//! over, but whether that entry may actually be dropped (e.g. because it
//! is dirty) is entirely the caller's decision. That is why
//! [`EvictionCache::put`] never evicts on its own and the backing LRU map
//! is kept unbounded — capacity only gates [`EvictionCache::evict_oldest`].

use std::hash::Hash;

use lru::LruCache;

/// Fixed-capacity key→value store with least-recently-used ordering.
pub struct EvictionCache<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone> EvictionCache<K, V> {
    /// Create a cache that considers itself full at `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        EvictionCache {
            entries: LruCache::unbounded(),
            capacity,
        }
    }

    /// Look up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Insert or overwrite `key`, promoting it to most-recently-used.
    pub fn put(&mut self, key: K, value: V) {
        self.entries.put(key, value);
    }

    /// Remove and return the least-recently-used entry, but only while the
    /// cache is at or over capacity. Below capacity this returns `None`
    /// and mutates nothing.
    pub fn evict_oldest(&mut self) -> Option<(K, V)> {
        if self.entries.len() >= self.capacity {
            self.entries.pop_lru()
        } else {
            None
        }
    }

    /// Remove `key`, returning its value if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.pop(key)
    }

    /// Whether `key` is present. Does not promote.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of all current entries. Order is unspecified; recency is
    /// not affected.
    pub fn entries(&self) -> Vec<(K, V)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_promotes_to_mru() {
        let mut cache = EvictionCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);

        // Touch "a" so "b" becomes the LRU entry.
        assert_eq!(cache.get(&"a"), Some(&1));

        let (k, v) = cache.evict_oldest().unwrap();
        assert_eq!((k, v), ("b", 2));
    }

    #[test]
    fn test_put_overwrites_and_promotes() {
        let mut cache = EvictionCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.evict_oldest(), Some(("b", 2)));
        assert_eq!(cache.get(&"a"), Some(&10));
    }

    #[test]
    fn test_evict_oldest_gated_by_capacity() {
        let mut cache = EvictionCache::new(3);
        cache.put("a", 1);
        cache.put("b", 2);

        // Below capacity: nothing to evict, nothing mutated.
        assert_eq!(cache.evict_oldest(), None);
        assert_eq!(cache.len(), 2);

        cache.put("c", 3);
        assert_eq!(cache.evict_oldest(), Some(("a", 1)));
        // Now under capacity again.
        assert_eq!(cache.evict_oldest(), None);
    }

    #[test]
    fn test_evict_oldest_when_over_capacity() {
        let mut cache = EvictionCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        // The cache itself never refuses a put; the caller drains it.
        cache.put("c", 3);
        assert_eq!(cache.len(), 3);

        assert_eq!(cache.evict_oldest(), Some(("a", 1)));
        assert_eq!(cache.evict_oldest(), Some(("b", 2)));
        assert_eq!(cache.evict_oldest(), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut cache = EvictionCache::new(2);
        cache.put("a", 1);
        assert_eq!(cache.remove(&"a"), Some(1));
        assert_eq!(cache.remove(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinserted_entry_becomes_mru() {
        // The dirty-page dance: pop the LRU entry, decide it can't go,
        // put it back - it must land at the MRU end.
        let mut cache = EvictionCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);

        let (k, v) = cache.evict_oldest().unwrap();
        assert_eq!(k, "a");
        cache.put(k, v);

        assert_eq!(cache.evict_oldest(), Some(("b", 2)));
    }

    #[test]
    fn test_entries_snapshot() {
        let mut cache = EvictionCache::new(3);
        cache.put("a", 1);
        cache.put("b", 2);

        let mut entries = cache.entries();
        entries.sort();
        assert_eq!(entries, vec![("a", 1), ("b", 2)]);

        // Snapshotting did not disturb recency: "a" is still LRU.
        cache.put("c", 3);
        assert_eq!(cache.evict_oldest(), Some(("a", 1)));
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn test_zero_capacity_rejected() {
        let _ = EvictionCache::<u32, u32>::new(0);
    }
}
