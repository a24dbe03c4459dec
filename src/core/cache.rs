use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::debug;
use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::error::ServiceResult;

/// Cached value with its expiry deadline
#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|deadline| deadline <= now).unwrap_or(false)
    }
}

/// LRU cache with per-entry expiry
///
/// Values are stored as JSON so callers can cache any serializable type
/// under string keys. Keys follow a `namespace:...` convention so related
/// entries can be dropped together with [`TtlCache::clear_prefix`].
#[derive(Debug)]
pub struct TtlCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    default_ttl: Duration,
}

impl TtlCache {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a value; `ttl` of `None` uses the default expiry
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) -> ServiceResult<()> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry {
            value: serde_json::to_value(value)?,
            expires_at: if ttl.is_zero() { None } else { Some(Instant::now() + ttl) },
        };
        self.lock().put(key.to_string(), entry);
        debug!("Cached {} (ttl {}s)", key, ttl.as_secs());
        Ok(())
    }

    /// Fetch a live value, dropping it if it has expired
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.lock();
        let now = Instant::now();
        let expired = match entries.get(key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => return serde_json::from_value(entry.value.clone()).ok(),
            None => return None,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    /// Remove a key, returning whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.lock().pop(key).is_some()
    }

    /// Remove every key starting with `prefix`
    pub fn clear_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        if !doomed.is_empty() {
            debug!("Invalidated {} cache entries under '{}'", doomed.len(), prefix);
        }
        doomed.len()
    }

    /// Whether a live value exists for `key`
    pub fn exists(&self, key: &str) -> bool {
        let now = Instant::now();
        self.lock()
            .peek(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Remaining lifetime in whole seconds, or -1 when the key is missing
    /// or never expires
    pub fn ttl(&self, key: &str) -> i64 {
        let now = Instant::now();
        match self.lock().peek(key) {
            Some(entry) if !entry.is_expired(now) => entry
                .expires_at
                .map(|deadline| deadline.saturating_duration_since(now).as_secs() as i64)
                .unwrap_or(-1),
            _ => -1,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
