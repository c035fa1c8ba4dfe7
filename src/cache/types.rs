// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A cached value with its access bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub hits: u64,
}

impl<V> CacheEntry<V> {
    pub fn new(key: String, value: V) -> Self {
        let now = Utc::now();
        Self {
            key,
            value,
            created_at: now,
            last_access: now,
            hits: 0,
        }
    }

    /// Whether the entry has outlived `ttl`, measured from creation
    pub fn is_expired(&self, ttl: Duration) -> bool {
        (Utc::now() - self.created_at)
            .to_std()
            .map(|age| age > ttl)
            .unwrap_or(false)
    }

    pub fn touch(&mut self) {
        self.last_access = Utc::now();
        self.hits += 1;
    }
}

/// Counters reported by every cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub maxsize: usize,
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn compute_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// On-disk form of one entry
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedEntry<V> {
    pub value: V,
    pub timestamp: DateTime<Utc>,
}

/// Cache persistence failures
///
/// Logged by the owning cache and never propagated into a detection.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
