//! A mutex-guarded map whose entries expire on a fixed deadline.
//!
//! The TTL counts from entry creation: reads and in-place updates do not
//! extend an entry's life, only `insert` starts a fresh window. Expired
//! entries are dropped lazily on access, so a lookup after the deadline
//! reports absent without any background sweeper.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// Insert or overwrite, starting a fresh TTL window either way.
    pub fn insert(&self, key: K, value: V) {
        let entry = Entry { value, expires_at: Instant::now() + self.ttl };
        self.lock().insert(key, entry);
    }

    /// A clone of the live value, or `None` if absent or expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            },
            None => None,
        }
    }

    /// Mutate a live entry in place without touching its deadline.
    /// Returns `None` if the entry is absent or expired.
    pub fn with_mut<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(f(&mut entry.value)),
            Some(_) => {
                entries.remove(key);
                None
            },
            None => None,
        }
    }

    /// Drop an entry explicitly, returning its value if it was still live.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        let entry = entries.remove(key)?;
        (entry.expires_at > Instant::now()).then_some(entry.value)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Entry<V>>> {
        // A poisoned cache mutex means a panic mid-map-operation; the map
        // itself is still structurally sound for these access patterns.
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
