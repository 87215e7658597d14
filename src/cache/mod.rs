//! Short-lived response cache.
//!
//! Entries expire `ttl` after they were written and the cache never holds
//! more than `max_entries`; when a new key would overflow it, the entry that
//! was inserted first is evicted. A background sweeper started with
//! [`ResponseCache::start_sweeper`] drops expired entries every `2 × ttl`.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, Weak},
    time::Duration,
};
use tokio::{task::JoinHandle, time::Instant};
use tracing::debug;

struct CacheEntry<V> {
    /// Insertion sequence; overwriting a key keeps its original position.
    seq: u64,
    stored_at: Instant,
    payload: V,
}

struct Entries<V> {
    map: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
}

pub struct ResponseCache<V> {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<Entries<V>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V: Clone + Send + 'static> ResponseCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                next_seq: 0,
            }),
            sweeper: Mutex::new(None),
        }
    }

    /// Returns the payload stored under `key` unless it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock_entries();
        let fresh = match entries.map.get(key) {
            Some(entry) => entry.stored_at.elapsed() < self.ttl,
            None => return None,
        };
        if fresh {
            entries.map.get(key).map(|e| e.payload.clone())
        } else {
            entries.map.remove(key);
            None
        }
    }

    /// Stores `payload` under `key`, evicting the oldest entry when a new key
    /// would exceed capacity.
    pub fn set(&self, key: impl Into<String>, payload: V) {
        let key = key.into();
        let mut entries = self.lock_entries();
        let now = Instant::now();

        if let Some(entry) = entries.map.get_mut(&key) {
            entry.stored_at = now;
            entry.payload = payload;
            return;
        }

        if entries.map.len() >= self.max_entries {
            if let Some(victim) = entries
                .map
                .iter()
                .min_by_key(|(_, e)| e.seq)
                .map(|(k, _)| k.clone())
            {
                debug!(key = %victim, "evicting oldest cache entry");
                entries.map.remove(&victim);
            }
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.map.insert(
            key,
            CacheEntry {
                seq,
                stored_at: now,
                payload,
            },
        );
    }

    /// Removes every expired entry, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock_entries();
        let before = entries.map.len();
        entries.map.retain(|_, e| e.stored_at.elapsed() < self.ttl);
        before - entries.map.len()
    }

    pub fn clear(&self) {
        self.lock_entries().map.clear();
    }

    pub fn len(&self) -> usize {
        self.lock_entries().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns the periodic sweeper on the current tokio runtime.
    ///
    /// The task holds only a weak reference and stops once the cache is
    /// dropped or [`ResponseCache::dispose`] is called.
    pub fn start_sweeper(self: &Arc<Self>) {
        let period = self.ttl * 2;
        let cache: Weak<Self> = Arc::downgrade(self);
        let first_tick = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep();
                if removed > 0 {
                    debug!(removed, "swept expired cache entries");
                }
            }
        });

        let previous = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Stops the sweeper and empties the cache.
    pub fn dispose(&self) {
        if let Some(handle) = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
        self.clear();
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Entries<V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Drop for ResponseCache<V> {
    fn drop(&mut self) {
        if let Some(handle) = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
