//! TTL-aware LRU cache, ported from the original implementation's
//! `LruTtlCache<K, V>` (`include/lru_ttl_cache.h`): a recency list plus an
//! index map, most-recently-used entries at the front, eviction from the
//! back when at capacity. Time is abstracted behind a `Clock` trait so tests
//! can advance it deterministically instead of sleeping.
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A source of "now". Production code uses `SystemClock`; tests use
/// `FakeClock`, which only moves when told to (§8 property 6).
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that starts at an arbitrary epoch and only advances when asked.
pub struct FakeClock {
    now: Mutex<Instant>,
}

impl FakeClock {
    pub fn new() -> Self {
        FakeClock { now: Mutex::new(Instant::now()) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

struct Entry<K, V> {
    key: K,
    value: V,
    expires_at: Instant,
}

/// Fixed-capacity cache keyed by `K`, values `V`, each entry stamped with an
/// absolute expiry instant. `get` promotes to most-recently-used; `put`
/// evicts the least-recently-used entry once at capacity, mirroring the
/// original's `items_.splice`/`items_.back()` dance over a `std::list`.
pub struct Cache<K, V, C: Clock = SystemClock> {
    capacity: usize,
    // front = most recently used, back = least recently used
    entries: Vec<Entry<K, V>>,
    index: HashMap<K, usize>,
    clock: C,
    hits: u64,
    misses: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V, SystemClock> {
    pub fn new(capacity: usize) -> Self {
        Cache::with_clock(capacity, SystemClock)
    }
}

impl<K: Eq + Hash + Clone, V: Clone, C: Clock> Cache<K, V, C> {
    pub fn with_clock(capacity: usize, clock: C) -> Self {
        Cache {
            capacity: capacity.max(1),
            entries: Vec::new(),
            index: HashMap::new(),
            clock,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up `key`, returning its value and the TTL remaining (seconds,
    /// rounded down) if present and not expired. A hit promotes the entry to
    /// the front of the recency list.
    pub fn get(&mut self, key: &K) -> Option<(V, u64)> {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.misses += 1;
                return None;
            }
        };

        let now = self.clock.now();
        if self.entries[idx].expires_at <= now {
            self.remove_at(idx);
            self.misses += 1;
            return None;
        }

        let ttl_left = self.entries[idx].expires_at.duration_since(now).as_secs();
        let value = self.entries[idx].value.clone();
        self.touch(idx);
        self.hits += 1;
        Some((value, ttl_left))
    }

    /// Insert or replace `key` with `value`, expiring in `ttl_secs`. Evicts
    /// the least-recently-used entry first if the cache is at capacity and
    /// `key` is new.
    pub fn put(&mut self, key: K, value: V, ttl_secs: u64) {
        let expires_at = self.clock.now() + Duration::from_secs(ttl_secs);

        if let Some(&idx) = self.index.get(&key) {
            self.entries[idx].value = value;
            self.entries[idx].expires_at = expires_at;
            self.touch(idx);
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        self.entries.insert(0, Entry { key: key.clone(), value, expires_at });
        self.index.insert(key, 0);
        self.reindex();
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|e| e.expires_at > now);
        self.reindex();
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    fn touch(&mut self, idx: usize) {
        if idx == 0 {
            return;
        }
        let entry = self.entries.remove(idx);
        self.entries.insert(0, entry);
        self.reindex();
    }

    fn remove_at(&mut self, idx: usize) {
        let entry = self.entries.remove(idx);
        self.index.remove(&entry.key);
        self.reindex();
    }

    fn evict_lru(&mut self) {
        if let Some(entry) = self.entries.pop() {
            self.index.remove(&entry.key);
        }
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.index.insert(entry.key.clone(), i);
        }
    }
}

/// A cache shared across threads/tasks behind a mutex, the form the resolver
/// actually holds onto.
pub type SharedCache<K, V> = Arc<Mutex<Cache<K, V>>>;

pub fn shared_cache<K: Eq + Hash + Clone, V: Clone>(capacity: usize) -> SharedCache<K, V> {
    Arc::new(Mutex::new(Cache::new(capacity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_reports_ttl_remaining() {
        let clock = FakeClock::new();
        let mut cache: Cache<String, String, _> = Cache::with_clock(4, clock);
        cache.put("example.com|1".to_string(), "1.2.3.4".to_string(), 300);

        let (value, ttl_left) = cache.get(&"example.com|1".to_string()).unwrap();
        assert_eq!(value, "1.2.3.4");
        assert_eq!(ttl_left, 300);
    }

    #[test]
    fn entry_expires_after_simulated_time() {
        let clock = Arc::new(FakeClock::new());
        let mut cache: Cache<String, String, _> = Cache::with_clock(4, clock.clone());
        cache.put("a".to_string(), "v".to_string(), 10);

        clock.advance(Duration::from_secs(5));
        assert!(cache.get(&"a".to_string()).is_some());

        clock.advance(Duration::from_secs(6));
        assert!(cache.get(&"a".to_string()).is_none());
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn eviction_drops_least_recently_used() {
        let mut cache: Cache<i32, i32, _> = Cache::with_clock(2, FakeClock::new());
        cache.put(1, 100, 60);
        cache.put(2, 200, 60);
        cache.put(3, 300, 60); // evicts key 1

        assert!(cache.get(&1).is_none());
        assert!(cache.get(&2).is_some());
        assert!(cache.get(&3).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn get_promotes_entry_so_it_survives_eviction() {
        let mut cache: Cache<i32, i32, _> = Cache::with_clock(2, FakeClock::new());
        cache.put(1, 100, 60);
        cache.put(2, 200, 60);

        // touch key 1 so key 2 becomes the LRU entry
        assert!(cache.get(&1).is_some());
        cache.put(3, 300, 60); // should evict key 2, not key 1

        assert!(cache.get(&1).is_some());
        assert!(cache.get(&2).is_none());
        assert!(cache.get(&3).is_some());
    }

    #[test]
    fn purge_expired_removes_only_expired_entries() {
        let clock = Arc::new(FakeClock::new());
        let mut cache: Cache<i32, i32, _> = Cache::with_clock(4, clock.clone());
        cache.put(1, 100, 10);
        cache.put(2, 200, 100);

        clock.advance(Duration::from_secs(20));
        let removed = cache.purge_expired();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&2).is_some());
    }

    #[test]
    fn put_on_existing_key_refreshes_ttl_and_value() {
        let mut cache: Cache<&str, i32, _> = Cache::with_clock(4, FakeClock::new());
        cache.put("k", 1, 60);
        cache.put("k", 2, 600);

        let (value, ttl_left) = cache.get(&"k").unwrap();
        assert_eq!(value, 2);
        assert_eq!(ttl_left, 600);
        assert_eq!(cache.len(), 1);
    }
}
