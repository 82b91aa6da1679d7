//! Process-wide key/value cache with per-entry expiry.
//!
//! Values are stored as JSON so a single instance can hold search results,
//! products, nutrient details and country lists side by side. Expiry is only
//! checked on read; there is no background sweep and no size bound.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone)]
pub struct TtlCache {
    store: Arc<DashMap<String, CacheEntry>>,
    default_ttl: Duration,
}

impl TtlCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the cached value, or `None` when the key is missing or expired.
    /// An expired entry is dropped as part of the read.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let value = {
            let entry = self.store.get(key)?;
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.value.clone())
            }
        };

        let Some(value) = value else {
            // Only drop it if nobody refreshed the key in the meantime.
            self.store.remove_if(key, |_, e| e.is_expired(now));
            debug!(key, "cache entry expired");
            return None;
        };

        match serde_json::from_value(value) {
            Ok(v) => {
                debug!(key, "cache hit");
                Some(v)
            }
            Err(e) => {
                warn!(key, error = %e, "cached value has unexpected shape; discarding");
                self.store.remove(key);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: impl Into<String>, value: &T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl<T: Serialize>(&self, key: impl Into<String>, value: &T, ttl: Duration) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                let entry = CacheEntry {
                    value,
                    expires_at: Instant::now() + ttl,
                };
                debug!(key = %key, ttl_secs = ttl.as_secs_f64(), "cache set");
                self.store.insert(key, entry);
            }
            Err(e) => warn!(key = %key, error = %e, "value not cacheable"),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
