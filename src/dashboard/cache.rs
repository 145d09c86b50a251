//! Single-flight TTL cache
//!
//! Each key owns an async slot lock. The first caller to find a slot empty
//! or stale fills it while holding the lock; concurrent callers for the same
//! key wait and then read the fresh value, so a miss triggers exactly one
//! recomputation.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use crate::telemetry::{DASHBOARD_CACHE_HITS, DASHBOARD_CACHE_MISSES};

struct Entry<V> {
    value: Arc<V>,
    filled_at: Instant,
}

type Slot<V> = Arc<Mutex<Option<Entry<V>>>>;

/// Key → value cache with a time-to-live and single-flight fills
pub struct TtlCache<K, V> {
    ttl: Duration,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value, or fill it with `fill`
    ///
    /// A failed fill leaves the slot empty and returns the error; the next
    /// caller retries.
    pub async fn get_or_try_fill<F, Fut, E>(&self, key: K, fill: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };

        let mut entry = slot.lock().await;
        if let Some(cached) = entry.as_ref() {
            if cached.filled_at.elapsed() < self.ttl {
                metrics::counter!(DASHBOARD_CACHE_HITS).increment(1);
                return Ok(cached.value.clone());
            }
        }

        metrics::counter!(DASHBOARD_CACHE_MISSES).increment(1);
        let value = Arc::new(fill().await?);
        *entry = Some(Entry {
            value: value.clone(),
            filled_at: Instant::now(),
        });
        Ok(value)
    }

    /// Cached value if present and fresh
    pub async fn peek(&self, key: &K) -> Option<Arc<V>> {
        let slot = self.slots.lock().await.get(key)?.clone();
        let entry = slot.lock().await;
        entry
            .as_ref()
            .filter(|e| e.filled_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Drop every cached value
    ///
    /// Fills already in flight complete into detached slots and are not seen
    /// by later callers.
    pub async fn invalidate(&self) {
        self.slots.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }
}
