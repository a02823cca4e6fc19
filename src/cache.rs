//! Bounded cache with least-recently-used eviction.
//!
//! Items live in a slab of slots linked in recency order, with a hash map from key to slot, so
//! lookups, promotions and evictions take constant time.

use std::hash::Hash;

use nonmax::NonMaxUsize;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct Slot<K, V> {
    key: K,
    value: V,

    /// Neighbor towards the most recently used end
    newer: Option<NonMaxUsize>,

    /// Neighbor towards the least recently used end
    older: Option<NonMaxUsize>,
}

#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    capacity: usize,
    slots: Vec<Slot<K, V>>,
    index: FxHashMap<K, usize>,

    newest: Option<NonMaxUsize>,
    oldest: Option<NonMaxUsize>,

    num_hits: usize,
    num_misses: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache holding at most `capacity` items. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            index: FxHashMap::default(),
            newest: None,
            oldest: None,
            num_hits: 0,
            num_misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn num_hits(&self) -> usize {
        self.num_hits
    }

    pub fn num_misses(&self) -> usize {
        self.num_misses
    }

    fn unlink(&mut self, slot: usize) {
        let (newer, older) = (self.slots[slot].newer, self.slots[slot].older);

        match newer {
            Some(n) => self.slots[n.get()].older = older,
            None => self.newest = older,
        }

        match older {
            Some(o) => self.slots[o.get()].newer = newer,
            None => self.oldest = newer,
        }
    }

    fn link_newest(&mut self, slot: usize) {
        let link = NonMaxUsize::new(slot);

        self.slots[slot].newer = None;
        self.slots[slot].older = self.newest;

        match self.newest {
            Some(n) => self.slots[n.get()].newer = link,
            None => self.oldest = link,
        }

        self.newest = link;
    }

    fn touch(&mut self, slot: usize) {
        if self.newest.map(|n| n.get()) != Some(slot) {
            self.unlink(slot);
            self.link_newest(slot);
        }
    }

    /// Get an item, marking it as most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.touch(slot);

        Some(&self.slots[slot].value)
    }

    /// Store an item in a slot and mark it as most recently used. Returns the slot and the
    /// evicted item, if the cache was full.
    fn store(&mut self, key: K, value: V) -> (usize, Option<(K, V)>) {
        if let Some(&slot) = self.index.get(&key) {
            self.slots[slot].value = value;
            self.touch(slot);
            return (slot, None);
        }

        let (slot, evicted) = match self.oldest {
            Some(oldest) if self.slots.len() >= self.capacity => {
                let slot = oldest.get();
                self.unlink(slot);

                let old_key = std::mem::replace(&mut self.slots[slot].key, key.clone());
                let old_value = std::mem::replace(&mut self.slots[slot].value, value);
                self.index.remove(&old_key);

                (slot, Some((old_key, old_value)))
            },
            _ => {
                self.slots.push(Slot { key: key.clone(), value, newer: None, older: None });
                (self.slots.len() - 1, None)
            }
        };

        self.index.insert(key, slot);
        self.link_newest(slot);

        (slot, evicted)
    }

    /// Store an item as most recently used. Returns the evicted item, if the cache was full.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.store(key, value).1
    }

    /// Get an item, computing and storing it first if it is not cached
    pub fn get_or_try_insert_with<F, E>(&mut self, key: K, f: F) -> Result<&V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let slot = match self.index.get(&key) {
            Some(&slot) => {
                self.num_hits += 1;
                self.touch(slot);
                slot
            },
            None => {
                self.num_misses += 1;
                let value = f()?;
                self.store(key, value).0
            }
        };

        Ok(&self.slots[slot].value)
    }

    /// Cached keys, most recently used first
    pub fn keys(&self) -> impl Iterator<Item=&K> + '_ {
        std::iter::successors(self.newest, |slot| self.slots[slot.get()].older)
            .map(|slot| &self.slots[slot.get()].key)
    }
}


#[cfg(test)]
mod tests {
    use super::LruCache;

    #[test]
    fn test_eviction_order() {
        let mut cache = LruCache::new(3);
        for i in 0..3 {
            assert!(cache.insert(i, i * 10).is_none());
        }

        // Access makes 0 most recent, so 1 is the least recent now
        assert_eq!(cache.get(&0), Some(&0));
        assert_eq!(cache.insert(3, 30), Some((1, 10)));

        assert!(!cache.contains(&1));
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec![3, 0, 2]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_reinsert_does_not_evict() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);

        assert!(cache.insert("a", 3).is_none());
        assert_eq!(cache.get(&"a"), Some(&3));
        assert_eq!(cache.insert("c", 4), Some(("b", 2)));
    }

    #[test]
    fn test_get_or_try_insert() {
        let mut cache: LruCache<usize, String> = LruCache::new(1);
        let mut loads = 0;

        for key in [1, 1, 2, 1] {
            let value = cache.get_or_try_insert_with(key, || {
                loads += 1;
                Ok::<_, ()>(format!("item {key}"))
            }).unwrap();

            assert_eq!(value, &format!("item {key}"));
        }

        assert_eq!(loads, 3);
        assert_eq!(cache.num_hits(), 1);
        assert_eq!(cache.num_misses(), 3);

        let err = cache.get_or_try_insert_with(5, || Err("decode failed"));
        assert_eq!(err, Err("decode failed"));
        assert!(!cache.contains(&5));
    }

    #[test]
    fn test_zero_capacity() {
        let mut cache = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);

        cache.insert(1, ());
        assert_eq!(cache.insert(2, ()), Some((1, ())));
    }

    #[test]
    fn test_long_access_sequence() {
        let capacity = 64;
        let mut cache = LruCache::new(capacity);

        // Recency list of a model cache, most recent last
        let mut model: Vec<usize> = Vec::new();

        for step in 0..5000usize {
            let key = (step * 7919) % 97;

            if step % 3 == 0 {
                let hit = cache.get(&key).copied();
                assert_eq!(hit, model.contains(&key).then_some(key * 2));

                if let Some(pos) = model.iter().position(|k| *k == key) {
                    let k = model.remove(pos);
                    model.push(k);
                }
            } else {
                let evicted = cache.insert(key, key * 2);

                let expected = if let Some(pos) = model.iter().position(|k| *k == key) {
                    model.remove(pos);
                    None
                } else if model.len() == capacity {
                    let k = model.remove(0);
                    Some((k, k * 2))
                } else {
                    None
                };

                model.push(key);
                assert_eq!(evicted, expected, "step {step}");
            }
        }

        assert_eq!(cache.len(), capacity);
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), model.iter().rev().copied().collect::<Vec<_>>());
    }
}
