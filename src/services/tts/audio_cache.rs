// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Content-addressed cache of synthesized speech
//!
//! Each (text, language) pair maps to `<sha256>.wav` in the cache directory,
//! so concurrent requests never share a scratch file and repeated phrases
//! are synthesized once.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::{AudioSynthesisError, SpeechSynthesizer};
use crate::cache::{BoundedCache, CacheStats};
use crate::modes::Language;

struct Inner {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    store: BoundedCache<PathBuf>,
    dir: PathBuf,
    permits: Semaphore,
}

#[derive(Clone)]
pub struct AudioCache {
    inner: Arc<Inner>,
}

impl AudioCache {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        dir: impl Into<PathBuf>,
        maxsize: usize,
        max_workers: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                synthesizer,
                store: BoundedCache::new("audio", maxsize, None),
                dir: dir.into(),
                permits: Semaphore::new(max_workers.max(1)),
            }),
        }
    }

    pub fn key(text: &str, language: Language) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(b":");
        hasher.update(language.code().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.inner.dir.join(format!("{}.wav", key))
    }

    /// Audio for `text`, synthesizing it on a worker when not cached
    ///
    /// Synthesis runs on a spawned task; if the caller goes away the task
    /// still finishes and populates the cache.
    pub async fn get_or_synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<PathBuf, AudioSynthesisError> {
        if text.trim().is_empty() {
            return Err(AudioSynthesisError::EmptyText);
        }

        let key = Self::key(text, language);
        if let Some(path) = self.inner.store.get(&key) {
            if path.exists() {
                return Ok(path);
            }
        }

        let path = self.path_for(&key);
        if path.exists() {
            debug!(path = %path.display(), "audio found on disk");
            self.inner.store.set(key, path.clone());
            return Ok(path);
        }

        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        let task = tokio::spawn(async move { inner.synthesize_into(&text, language, key, path).await });

        task.await
            .map_err(|e| AudioSynthesisError::Worker(e.to_string()))?
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.store.stats()
    }

    /// Forget the in-memory index; files already written stay on disk
    pub fn clear(&self) -> usize {
        self.inner.store.clear()
    }

    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }
}

impl Inner {
    async fn synthesize_into(
        &self,
        text: &str,
        language: Language,
        key: String,
        path: PathBuf,
    ) -> Result<PathBuf, AudioSynthesisError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AudioSynthesisError::Worker(e.to_string()))?;

        let io_err = |source| AudioSynthesisError::Io {
            path: self.dir.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        let scratch = tempfile::Builder::new()
            .prefix(".tts-")
            .suffix(".wav")
            .tempfile_in(&self.dir)
            .map_err(io_err)?;

        if let Err(e) = self
            .synthesizer
            .synthesize(text, language, scratch.path())
            .await
        {
            warn!(engine = self.synthesizer.name(), error = %e, "speech synthesis failed");
            return Err(e);
        }

        scratch
            .persist(&path)
            .map_err(|e| AudioSynthesisError::Io {
                path: path.clone(),
                source: e.error,
            })?;

        debug!(path = %path.display(), "audio cached");
        self.store.set(key, path.clone());
        Ok(path)
    }
}
