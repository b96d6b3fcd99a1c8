//! Stale-while-revalidate cache with a durable snapshot.
//!
//! Each entry carries two deadlines: `stale_at = set + ttl` and
//! `expiry = set + 2 * ttl`. Between the two, `get` still returns the data but
//! flags it stale so the caller can refresh it. Past `expiry` the entry is
//! evicted.
//!
//! The whole map is written to a [`CacheStorage`] under one namespace after
//! every mutation. Storage failures are logged and otherwise ignored; the
//! in-memory map stays authoritative.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::storage::{CacheStorage, MemoryStorage};

pub const DEFAULT_NAMESPACE: &str = "photoAlbumCache";
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// One cached payload and its deadlines, in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub data: Value,
    pub stale_at: i64,
    pub expiry: i64,
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit<T> {
    pub data: T,
    pub is_stale: bool,
}

#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub ttl: Duration,
    pub namespace: String,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

pub struct CacheManager {
    ttl_ms: i64,
    namespace: String,
    entries: Mutex<BTreeMap<String, CacheEntry>>,
    storage: Arc<dyn CacheStorage>,
    clock: Arc<dyn Clock>,
}

impl CacheManager {
    /// Build a cache, merging any snapshot previously persisted under the
    /// namespace.
    pub fn new(storage: Arc<dyn CacheStorage>, clock: Arc<dyn Clock>, options: CacheOptions) -> Self {
        let cache = Self {
            ttl_ms: options.ttl.as_millis() as i64,
            namespace: options.namespace,
            entries: Mutex::new(BTreeMap::new()),
            storage,
            clock,
        };
        cache.load_from_storage();
        cache
    }

    /// Memory-backed cache on the system clock with default options.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(SystemClock),
            CacheOptions::default(),
        )
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms as u64)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn load_from_storage(&self) {
        let raw = match self.storage.load(&self.namespace) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                warn!(namespace = %self.namespace, %err, "failed to load cache from storage");
                return;
            }
        };

        match serde_json::from_str::<BTreeMap<String, CacheEntry>>(&raw) {
            Ok(snapshot) => {
                debug!(entries = snapshot.len(), "restored cache snapshot");
                self.entries.lock().extend(snapshot);
            }
            Err(err) => {
                warn!(namespace = %self.namespace, %err, "ignoring corrupt cache snapshot");
            }
        }
    }

    fn persist(&self, entries: &BTreeMap<String, CacheEntry>) {
        let result = serde_json::to_string(entries)
            .map_err(Into::into)
            .and_then(|json| self.storage.save(&self.namespace, &json));
        if let Err(err) = result {
            warn!(namespace = %self.namespace, %err, "failed to save cache to storage");
        }
    }

    /// Look up `key`. Expired entries are evicted and reported absent.
    pub fn get(&self, key: &str) -> Option<CacheHit<Value>> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;

        if now > entry.expiry {
            entries.remove(key);
            self.persist(&entries);
            return None;
        }

        Some(CacheHit {
            data: entry.data.clone(),
            is_stale: now > entry.stale_at,
        })
    }

    /// Typed lookup. A payload that no longer matches `T` counts as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<CacheHit<T>> {
        let hit = self.get(key)?;
        match serde_json::from_value(hit.data) {
            Ok(data) => Some(CacheHit {
                data,
                is_stale: hit.is_stale,
            }),
            Err(err) => {
                warn!(%key, %err, "cached payload has unexpected shape");
                None
            }
        }
    }

    /// Store `data` under `key`, restarting both deadlines.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, data: &T) {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(err) => {
                warn!(%key, %err, "refusing to cache unserializable payload");
                return;
            }
        };

        let now = self.clock.now_ms();
        let stale_at = now + self.ttl_ms;
        let entry = CacheEntry {
            data,
            stale_at,
            expiry: stale_at + self.ttl_ms,
        };

        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), entry);
        self.persist(&entries);
    }

    pub fn remove(&self, key: &str) {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }

    /// Drop every entry and the persisted snapshot.
    pub fn clear(&self) {
        self.entries.lock().clear();
        if let Err(err) = self.storage.remove(&self.namespace) {
            warn!(namespace = %self.namespace, %err, "failed to clear cache storage");
        }
    }

    /// Number of entries held in memory, expired ones included until touched.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Raw entry, without staleness evaluation or eviction.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }
}
