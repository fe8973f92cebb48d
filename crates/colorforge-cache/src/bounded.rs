//! Cost-bounded LRU store.
//!
//! Entries are charged a byte cost on insertion and evicted least recently
//! used first once the running total exceeds the limit. Recency is a linked
//! order over the map: a lookup or insertion moves the entry to the back,
//! eviction pops from the front. Every entry occupies a distinct position,
//! so eviction order is fully deterministic.

use hashlink::LinkedHashMap;
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

/// Observer notified when capacity pressure drops an entry.
///
/// Explicit removals and in-place replacements are not evictions and are
/// not reported.
pub trait EvictionListener<K, V>: Send + Sync {
    fn on_evict(&self, key: &K, value: &V, cost: usize);
}

impl<K, V, F> EvictionListener<K, V> for F
where
    F: Fn(&K, &V, usize) + Send + Sync,
{
    fn on_evict(&self, key: &K, value: &V, cost: usize) {
        self(key, value, cost)
    }
}

/// An entry dropped by capacity pressure.
#[derive(Debug, Clone)]
pub struct Evicted<K, V> {
    pub key: K,
    pub value: V,
    pub cost: usize,
}

/// Usage counters for a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Successful `set_value` calls, replacements included.
    pub insertions: u64,
    /// Entries dropped by capacity pressure.
    pub evictions: u64,
    /// Entries currently held.
    pub entry_count: usize,
    /// Sum of the costs of the entries currently held.
    pub total_cost: usize,
    /// Current cost limit.
    pub cost_limit: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fraction of the cost limit in use. May exceed 1.0 while a single
    /// oversized entry is held.
    pub fn utilization(&self) -> f64 {
        if self.cost_limit == 0 {
            0.0
        } else {
            self.total_cost as f64 / self.cost_limit as f64
        }
    }
}

struct Slot<V> {
    value: V,
    cost: usize,
}

struct Inner<K, V> {
    /// Front is least recently used, back is most recently used.
    entries: LinkedHashMap<K, Slot<V>>,
    total_cost: usize,
    total_cost_limit: usize,
    hits: u64,
    misses: u64,
    insertions: u64,
    evictions: u64,
}

impl<K: Hash + Eq, V> Inner<K, V> {
    /// Pop from the front until the total fits, never touching the last
    /// remaining entry (the one just inserted sits at the back).
    fn evict_to_limit(&mut self) -> Vec<Evicted<K, V>> {
        let mut evicted = Vec::new();
        while self.total_cost > self.total_cost_limit && self.entries.len() > 1 {
            let Some((key, slot)) = self.entries.pop_front() else {
                break;
            };
            self.total_cost -= slot.cost;
            self.evictions += 1;
            evicted.push(Evicted {
                key,
                value: slot.value,
                cost: slot.cost,
            });
        }
        evicted
    }
}

/// Thread-safe, cost-bounded LRU map.
///
/// All operations take a short internal lock and never fail; absence is
/// reported as `None`.
pub struct BoundedKeyedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    listener: Option<Arc<dyn EvictionListener<K, V>>>,
}

impl<K, V> BoundedKeyedCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create a cache that holds at most `total_cost_limit` bytes.
    pub fn new(total_cost_limit: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LinkedHashMap::new(),
                total_cost: 0,
                total_cost_limit,
                hits: 0,
                misses: 0,
                insertions: 0,
                evictions: 0,
            }),
            listener: None,
        }
    }

    /// Attach an eviction observer.
    ///
    /// The listener runs on the mutating thread before `set_value` or
    /// `remove_value` returns, after the internal lock has been released, so
    /// it may call back into the cache.
    pub fn with_eviction_listener(mut self, listener: impl EvictionListener<K, V> + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Look up a value and mark it most recently used.
    pub fn value<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.inner.lock();
        let found = inner.entries.to_back(key).map(|slot| slot.value.clone());
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    /// Look up a value without touching recency or hit counters.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().entries.get(key).map(|slot| slot.value.clone())
    }

    /// Whether a key is present. Does not affect recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().entries.contains_key(key)
    }

    /// Insert or replace an entry at the most-recently-used position, then
    /// evict least recently used entries until the total cost fits.
    ///
    /// The inserted entry is never evicted by its own insertion, so a value
    /// costing more than the limit is still stored on its own. Returns the
    /// evicted entries in eviction order.
    pub fn set_value(&self, value: V, key: K, cost: usize) -> Vec<Evicted<K, V>> {
        let (replaced, evicted) = {
            let mut inner = self.inner.lock();
            let replaced = inner.entries.insert(key, Slot { value, cost });
            if let Some(old) = &replaced {
                inner.total_cost -= old.cost;
            }
            inner.total_cost += cost;
            inner.insertions += 1;
            (replaced, inner.evict_to_limit())
        };
        // Old values are dropped outside the lock.
        drop(replaced);

        self.notify(&evicted);
        evicted
    }

    /// Remove an entry, then evict least recently used entries if a lowered
    /// limit is still exceeded.
    ///
    /// Returns the removed value, if it was present, and the evicted entries
    /// in eviction order. As with insertion, the last remaining entry is
    /// never evicted.
    pub fn remove_value<Q>(&self, key: &Q) -> (Option<V>, Vec<Evicted<K, V>>)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (removed, evicted) = {
            let mut inner = self.inner.lock();
            let removed = inner.entries.remove(key).map(|slot| {
                inner.total_cost -= slot.cost;
                slot.value
            });
            (removed, inner.evict_to_limit())
        };

        self.notify(&evicted);
        (removed, evicted)
    }

    fn notify(&self, evicted: &[Evicted<K, V>]) {
        if let Some(listener) = &self.listener {
            for entry in evicted {
                listener.on_evict(&entry.key, &entry.value, entry.cost);
            }
        }
    }

    /// Drop every entry.
    pub fn remove_all(&self) {
        let drained = {
            let mut inner = self.inner.lock();
            inner.total_cost = 0;
            std::mem::take(&mut inner.entries)
        };
        drop(drained);
    }

    /// Snapshot of the keys currently held, least recently used first.
    pub fn keys(&self) -> std::vec::IntoIter<K>
    where
        K: Clone,
    {
        self.inner
            .lock()
            .entries
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Current cost limit in bytes.
    pub fn total_cost_limit(&self) -> usize {
        self.inner.lock().total_cost_limit
    }

    /// Change the cost limit.
    ///
    /// Lowering the limit does not evict immediately; the next `set_value`
    /// or `remove_value` brings the total back under it.
    pub fn set_total_cost_limit(&self, limit: usize) {
        self.inner.lock().total_cost_limit = limit;
    }

    /// Sum of the costs of all held entries.
    pub fn total_cost(&self) -> usize {
        self.inner.lock().total_cost
    }

    /// Number of held entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of usage counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            insertions: inner.insertions,
            evictions: inner.evictions,
            entry_count: inner.entries.len(),
            total_cost: inner.total_cost,
            cost_limit: inner.total_cost_limit,
        }
    }
}
