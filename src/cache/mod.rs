// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded LRU caches
//!
//! `BoundedCache` is the shared store; `ResultCache` adds key derivation
//! and optional JSON persistence for detection results.

pub mod result_cache;
pub mod store;
pub mod types;

pub use result_cache::ResultCache;
pub use store::BoundedCache;
pub use types::{CacheEntry, CacheError, CacheStats};
