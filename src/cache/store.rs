// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded LRU store shared by the result, translation and audio caches

use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::types::{CacheEntry, CacheError, CacheStats, PersistedEntry};

struct Inner<V> {
    entries: LruCache<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Thread-safe LRU cache with optional TTL
///
/// Only the map mutation is serialized; callers never hold the lock across
/// an await point.
pub struct BoundedCache<V> {
    name: &'static str,
    inner: Mutex<Inner<V>>,
    maxsize: NonZeroUsize,
    ttl: Option<Duration>,
}

impl<V: Clone> BoundedCache<V> {
    /// `maxsize` of zero is treated as one
    pub fn new(name: &'static str, maxsize: usize, ttl: Option<Duration>) -> Self {
        let maxsize = NonZeroUsize::new(maxsize).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            inner: Mutex::new(Inner {
                entries: LruCache::new(maxsize),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            maxsize,
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();

        let ttl = self.ttl;
        let expired = inner
            .entries
            .get_mut(key)
            .map(|entry| ttl.map(|ttl| entry.is_expired(ttl)).unwrap_or(false));

        let Some(expired) = expired else {
            inner.misses += 1;
            return None;
        };

        if expired {
            inner.entries.pop(key);
            inner.misses += 1;
            debug!(cache = self.name, "entry expired");
            return None;
        }

        let value = inner.entries.get_mut(key).map(|entry| {
            entry.touch();
            entry.value.clone()
        });
        inner.hits += 1;
        value
    }

    /// Insert or overwrite, evicting the least recently used entry when full
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut inner = self.lock();

        if !inner.entries.contains(&key) && inner.entries.len() >= self.maxsize.get() {
            if let Some((evicted, _)) = inner.entries.pop_lru() {
                inner.evictions += 1;
                debug!(cache = self.name, key = %evicted, "evicted least recently used entry");
            }
        }

        inner.entries.put(key.clone(), CacheEntry::new(key, value));
    }

    /// Presence check that neither refreshes recency nor counts as a lookup
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains(key)
    }

    /// Remove every entry, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size: inner.entries.len(),
            maxsize: self.maxsize.get(),
            hit_rate: CacheStats::compute_hit_rate(inner.hits, inner.misses),
        }
    }
}

impl<V: Clone + Serialize + DeserializeOwned> BoundedCache<V> {
    /// Write every entry to `path` as a JSON map of key to `{value, timestamp}`
    ///
    /// The file is replaced atomically.
    pub fn save_to(&self, path: &Path) -> Result<usize, CacheError> {
        let snapshot: BTreeMap<String, PersistedEntry<V>> = {
            let inner = self.lock();
            inner
                .entries
                .iter()
                .map(|(key, entry)| {
                    (
                        key.clone(),
                        PersistedEntry {
                            value: entry.value.clone(),
                            timestamp: entry.created_at,
                        },
                    )
                })
                .collect()
        };

        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        let json = serde_json::to_vec(&snapshot)?;
        file.write_all(&json).map_err(io_err)?;
        file.persist(path).map_err(|e| io_err(e.error))?;

        info!(cache = self.name, entries = snapshot.len(), path = %path.display(), "cache persisted");
        Ok(snapshot.len())
    }

    /// Load entries saved by [`save_to`](Self::save_to), skipping those past the TTL
    ///
    /// A missing file is not an error.
    pub fn load_from(&self, path: &Path) -> Result<usize, CacheError> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let persisted: BTreeMap<String, PersistedEntry<V>> = serde_json::from_slice(&data)?;

        let mut restored: Vec<CacheEntry<V>> = persisted
            .into_iter()
            .map(|(key, p)| {
                let mut entry = CacheEntry::new(key, p.value);
                entry.created_at = p.timestamp;
                entry.last_access = p.timestamp;
                entry
            })
            .filter(|entry| !self.ttl.map(|ttl| entry.is_expired(ttl)).unwrap_or(false))
            .collect();
        restored.sort_by_key(|entry| entry.created_at);

        let mut inner = self.lock();
        for entry in restored {
            inner.entries.push(entry.key.clone(), entry);
        }
        let loaded = inner.entries.len();

        info!(cache = self.name, entries = loaded, path = %path.display(), "cache loaded");
        Ok(loaded)
    }
}
