// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use super::store::BoundedCache;
use super::types::{CacheError, CacheStats};
use crate::modes::{DetectionResult, Language, Mode};

/// Cache of completed detections keyed by image fingerprint, mode and language
pub struct ResultCache {
    store: BoundedCache<DetectionResult>,
    persist_path: Option<PathBuf>,
}

impl ResultCache {
    pub fn new(maxsize: usize, ttl: Option<Duration>) -> Self {
        Self {
            store: BoundedCache::new("result", maxsize, ttl),
            persist_path: None,
        }
    }

    /// Cache backed by a JSON file, loaded now and written on `persist` and drop
    pub fn with_persistence(maxsize: usize, ttl: Option<Duration>, path: PathBuf) -> Self {
        let store = BoundedCache::new("result", maxsize, ttl);
        if let Err(e) = store.load_from(&path) {
            warn!(error = %e, "could not load result cache, starting empty");
        }
        Self {
            store,
            persist_path: Some(path),
        }
    }

    /// Stable composite key for a detection
    pub fn key(fingerprint: &str, mode: Mode, language: Language) -> String {
        let mut hasher = Sha256::new();
        hasher.update(fingerprint.as_bytes());
        hasher.update(b":");
        hasher.update(mode.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(language.code().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<DetectionResult> {
        let result = self.store.get(key);
        debug!(hit = result.is_some(), "result cache lookup");
        result
    }

    pub fn set(&self, key: &str, result: DetectionResult) {
        self.store.set(key, result);
    }

    pub fn clear(&self) -> usize {
        self.store.clear()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Write the cache to its file; a cache without a file persists nothing
    pub fn persist(&self) -> Result<usize, CacheError> {
        match &self.persist_path {
            Some(path) => self.store.save_to(path),
            None => Ok(0),
        }
    }
}

impl Drop for ResultCache {
    fn drop(&mut self) {
        if let Err(e) = self.persist() {
            warn!(error = %e, "failed to persist result cache");
        }
    }
}
